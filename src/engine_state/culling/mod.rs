//! View-frustum culling.
//!
//! [`Frustum`] turns a view-projection matrix into six planes and answers point and
//! box queries. [`traversal`] walks chunks and cube hierarchies with it, pruning
//! whole subtrees whose boxes fall outside.

pub mod frustum;
pub mod traversal;

pub use frustum::{Frustum, Plane, PlaneSide};
pub use traversal::{render_chunk, render_cubes, render_octree, CullingStats};
