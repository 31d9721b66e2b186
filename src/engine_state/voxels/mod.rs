//! # Voxels
//!
//! The scene data the culling traversal walks:
//!
//! * **Cube**: one instance transform and its model matrix
//! * **CubeHandler**: an octree-capable node wrapping a cube and its bounding size
//! * **Chunk**: a dense 10×10×10 grid of leaf handlers stored layer by layer
//! * **World**: the single chunk plus an octree covering the same volume

pub mod chunk;
pub mod cube;
pub mod cube_handler;
pub mod world;
