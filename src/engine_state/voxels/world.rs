//! # World Module
//!
//! The world is the single chunk plus an octree test tree covering the same volume.
//! Both are built once at startup; each frame renders one of them, chosen by
//! [`TraversalMode`].

use cgmath::{Point3, Vector3};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    config::{OctreeShape, WorldConfig},
    engine_state::{
        culling::{
            frustum::Frustum,
            traversal::{render_chunk, render_octree, CullingStats},
        },
        rendering::CubeDrawer,
    },
};

use super::{
    chunk::{Chunk, CHUNK_DIMENSION, CUBE_SIZE},
    cube_handler::CubeHandler,
};

/// Which structure the frame is culled and drawn from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    /// The flat chunk grid, one point test per cube after the chunk box test
    #[default]
    Grid,
    /// The octree, box tests at split nodes and point tests at leaves
    Octree,
}

impl TraversalMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            TraversalMode::Grid => TraversalMode::Octree,
            TraversalMode::Octree => TraversalMode::Grid,
        }
    }
}

/// The scene: one chunk and one octree over the same volume.
#[derive(Debug, Clone)]
pub struct World {
    /// The flat grid of unit cubes
    pub chunk: Chunk,
    /// Octree root whose box covers every cube of the chunk
    pub octree: CubeHandler,
}

impl World {
    /// Generates the chunk and builds the octree described by `config`.
    pub fn new(config: &WorldConfig) -> Self {
        let [x, y, z] = config.chunk_origin;
        let chunk = Chunk::generate(Point3::new(x, y, z));

        let mut octree = octree_root_for(&chunk);
        match config.octree_shape {
            OctreeShape::Full => octree.split_to_depth(config.octree_depth),
            OctreeShape::Sparse => octree.split_sparse(config.octree_depth),
        }

        info!(
            "World generated: chunk at {:?} with {} cubes, {:?} octree of depth {} with {} leaves",
            chunk.position,
            chunk.handlers().len(),
            config.octree_shape,
            config.octree_depth,
            octree.leaf_count()
        );

        Self { chunk, octree }
    }

    /// Culls and draws one frame.
    ///
    /// # Arguments
    /// * `mode` - Which structure to traverse
    /// * `frustum` - Planes for this frame, already updated
    /// * `drawer` - Receives one call per visible leaf
    ///
    /// # Returns
    /// The frame's culling counters
    pub fn render<D: CubeDrawer + ?Sized>(
        &self,
        mode: TraversalMode,
        frustum: &Frustum,
        drawer: &mut D,
    ) -> CullingStats {
        let mut stats = CullingStats::default();
        match mode {
            TraversalMode::Grid => render_chunk(&self.chunk, frustum, drawer, &mut stats),
            TraversalMode::Octree => render_octree(&self.octree, frustum, drawer, &mut stats),
        }
        stats
    }
}

/// A leaf the size of the whole chunk, centered so its box matches the union of the
/// chunk's cubes.
fn octree_root_for(chunk: &Chunk) -> CubeHandler {
    let extent = CHUNK_DIMENSION as f32 * CUBE_SIZE;
    let origin = Point3::new(
        chunk.position.x as f32,
        chunk.position.y as f32,
        chunk.position.z as f32,
    );
    // Cubes are centered on integer cells, so they start half a cube below the origin.
    let offset = (extent - CUBE_SIZE) / 2.0;
    CubeHandler::uniform(origin + Vector3::new(offset, offset, offset), extent)
}
