//! # Voxel Culling Entry Point
//!
//! Runs the engine and exits with status 1 if it stops on an error.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --release
//! ```

fn main() {
    if let Err(err) = voxel_culling::run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
