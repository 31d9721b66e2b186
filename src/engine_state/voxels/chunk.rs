//! # Chunk Module
//!
//! A chunk is a dense `CHUNK_DIMENSION`³ grid of unit cubes at an integer world
//! origin. Handlers are stored in one flat vector, layer by layer:
//!
//! ```text
//! index = x + CHUNK_DIMENSION * z + CHUNK_PLANE_SIZE * y
//! ```
//!
//! so every Y layer is a contiguous `CHUNK_PLANE_SIZE` slice and walking the vector
//! front to back visits layers bottom-up, rows of constant Z, then X.

use cgmath::{Point3, Vector3};

use super::cube_handler::CubeHandler;

/// Side length of a chunk in cubes.
pub const CHUNK_DIMENSION: usize = 10;
/// Number of cubes in one Y layer (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: usize = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// Total number of cubes in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: usize = CHUNK_PLANE_SIZE * CHUNK_DIMENSION;
/// Edge length of every generated cube.
pub const CUBE_SIZE: f32 = 1.0;

/// A fixed-size grid of cube handlers.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// World-space origin of the grid, in cube units
    pub position: Point3<i32>,
    handlers: Vec<CubeHandler>,
}

/// One Y level of a chunk.
#[derive(Debug, Clone, Copy)]
pub struct Layer<'a> {
    /// World-space Y of every cube in the layer
    pub y: i32,
    handlers: &'a [CubeHandler],
}

impl<'a> Layer<'a> {
    /// The handler in column `(x, z)` of this layer.
    pub fn get(&self, x: usize, z: usize) -> Option<&'a CubeHandler> {
        if x >= CHUNK_DIMENSION || z >= CHUNK_DIMENSION {
            return None;
        }
        self.handlers.get(x + CHUNK_DIMENSION * z)
    }

    /// Every handler of the layer, rows of constant Z.
    pub fn handlers(&self) -> &'a [CubeHandler] {
        self.handlers
    }
}

impl Chunk {
    /// Generates the full grid for a chunk at `position`.
    ///
    /// The cube at grid cell `(i, j, k)` is centered on
    /// `position + (i, j, k)` with edge length [`CUBE_SIZE`]. Generation is
    /// deterministic: no gaps, no duplicates.
    pub fn generate(position: Point3<i32>) -> Self {
        let mut handlers = Vec::with_capacity(CHUNK_SIZE);
        for j in 0..CHUNK_DIMENSION {
            for k in 0..CHUNK_DIMENSION {
                for i in 0..CHUNK_DIMENSION {
                    let cube_position = Point3::new(
                        (position.x + i as i32) as f32,
                        (position.y + j as i32) as f32,
                        (position.z + k as i32) as f32,
                    );
                    handlers.push(CubeHandler::uniform(cube_position, CUBE_SIZE));
                }
            }
        }

        Self { position, handlers }
    }

    /// Flat index of grid cell `(x, y, z)`.
    pub fn index_of(x: usize, y: usize, z: usize) -> usize {
        x + CHUNK_DIMENSION * z + CHUNK_PLANE_SIZE * y
    }

    /// The handler at grid cell `(x, y, z)`, `None` outside the grid.
    pub fn handler_at(&self, x: usize, y: usize, z: usize) -> Option<&CubeHandler> {
        if x >= CHUNK_DIMENSION || y >= CHUNK_DIMENSION || z >= CHUNK_DIMENSION {
            return None;
        }
        self.handlers.get(Self::index_of(x, y, z))
    }

    /// Mutable access to the handler at grid cell `(x, y, z)`.
    pub fn handler_at_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut CubeHandler> {
        if x >= CHUNK_DIMENSION || y >= CHUNK_DIMENSION || z >= CHUNK_DIMENSION {
            return None;
        }
        self.handlers.get_mut(Self::index_of(x, y, z))
    }

    /// The layer at `layer_index` levels above the chunk origin.
    pub fn layer(&self, layer_index: usize) -> Option<Layer<'_>> {
        let start = layer_index.checked_mul(CHUNK_PLANE_SIZE)?;
        let end = start.checked_add(CHUNK_PLANE_SIZE)?;
        let handlers = self.handlers.get(start..end)?;
        Some(Layer {
            y: self.position.y + layer_index as i32,
            handlers,
        })
    }

    /// All layers, bottom-up.
    pub fn layers(&self) -> impl Iterator<Item = Layer<'_>> {
        let base_y = self.position.y;
        self.handlers
            .chunks_exact(CHUNK_PLANE_SIZE)
            .enumerate()
            .map(move |(layer_index, handlers)| Layer {
                y: base_y + layer_index as i32,
                handlers,
            })
    }

    /// Every handler in storage order.
    pub fn handlers(&self) -> &[CubeHandler] {
        &self.handlers
    }

    /// Minimum and maximum corners of the chunk's bounding box
    /// (`position` to `position + CHUNK_DIMENSION` on every axis).
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        let min = Point3::new(
            self.position.x as f32,
            self.position.y as f32,
            self.position.z as f32,
        );
        let extent = CHUNK_DIMENSION as f32;
        (min, min + Vector3::new(extent, extent, extent))
    }
}
