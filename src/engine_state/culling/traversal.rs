//! Frustum-gated walk over chunks and cube hierarchies.
//!
//! Split nodes test each child's box and only descend into the ones that survive, so
//! a rejected child costs one test no matter how large its subtree is. Leaves are
//! tested by their center point and handed to the [`CubeDrawer`] when visible.

use crate::engine_state::{
    rendering::CubeDrawer,
    voxels::{chunk::Chunk, cube_handler::CubeHandler},
};

use super::frustum::Frustum;

/// Counters accumulated while culling one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CullingStats {
    /// Leaves that passed the point test and were drawn
    pub visible_cubes: u32,
    /// Box tests performed (chunk boxes, octree roots and split-node children)
    pub aabb_tests: u32,
    /// Point tests performed on leaves
    pub point_tests: u32,
    /// Chunks rejected by their bounding box
    pub chunks_culled: u32,
}

impl CullingStats {
    /// Adds another set of counters onto this one.
    pub fn accumulate(&mut self, other: &CullingStats) {
        self.visible_cubes += other.visible_cubes;
        self.aabb_tests += other.aabb_tests;
        self.point_tests += other.point_tests;
        self.chunks_culled += other.chunks_culled;
    }
}

/// Draws every visible leaf under `handler`.
///
/// `handler` itself is not box-tested; callers test the root (or rely on the chunk
/// test) before descending.
pub fn render_cubes<D: CubeDrawer + ?Sized>(
    handler: &CubeHandler,
    frustum: &Frustum,
    drawer: &mut D,
    stats: &mut CullingStats,
) {
    match handler.children() {
        Some(children) => {
            for child in children.iter() {
                let (min, max) = child.bounds();
                stats.aabb_tests += 1;
                if frustum.is_aabb_in_frustum(min, max) {
                    render_cubes(child, frustum, drawer, stats);
                }
            }
        }
        None => {
            stats.point_tests += 1;
            if frustum.is_point_in_frustum(handler.cube.position()) {
                drawer.draw(handler.cube.model_matrix());
                stats.visible_cubes += 1;
            }
        }
    }
}

/// Draws the visible part of a chunk.
///
/// The chunk box is tested first and a miss skips every layer. Otherwise each
/// handler is walked with [`render_cubes`].
pub fn render_chunk<D: CubeDrawer + ?Sized>(
    chunk: &Chunk,
    frustum: &Frustum,
    drawer: &mut D,
    stats: &mut CullingStats,
) {
    let (min, max) = chunk.bounds();
    stats.aabb_tests += 1;
    if !frustum.is_aabb_in_frustum(min, max) {
        stats.chunks_culled += 1;
        return;
    }

    for layer in chunk.layers() {
        for handler in layer.handlers() {
            render_cubes(handler, frustum, drawer, stats);
        }
    }
}

/// Draws the visible leaves of a standalone octree, testing the root box first.
pub fn render_octree<D: CubeDrawer + ?Sized>(
    root: &CubeHandler,
    frustum: &Frustum,
    drawer: &mut D,
    stats: &mut CullingStats,
) {
    let (min, max) = root.bounds();
    stats.aabb_tests += 1;
    if frustum.is_aabb_in_frustum(min, max) {
        render_cubes(root, frustum, drawer, stats);
    }
}
