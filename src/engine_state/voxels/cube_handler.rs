//! # Cube Handler
//!
//! The node type shared by the flat chunk grid and the octree path.
//!
//! A handler is either a **leaf** (no children, drawn as one cube) or **internal**
//! (exactly eight children, one per octant, never drawn itself). A leaf turns into an
//! internal node at most once through [`CubeHandler::split`]; nothing turns it back.
//! Children are owned outright, so dropping a node drops its whole subtree.

use cgmath::{Point3, Vector3};

use super::cube::Cube;

/// Number of children of a split node.
pub const OCTANT_COUNT: usize = 8;

/// Children that [`CubeHandler::split_sparse`] keeps splitting.
pub const SPARSE_SPLIT_OCTANTS: [usize; 4] = [0, 3, 5, 7];

/// Sign of the offset from the parent center for the child at `octant`.
///
/// Octants are ordered with Z varying fastest, then Y, then X, each going from
/// -1 to +1.
pub fn octant_signs(octant: usize) -> Vector3<f32> {
    let sign = |bit: usize| if octant & bit == 0 { -1.0 } else { 1.0 };
    Vector3::new(sign(0b100), sign(0b010), sign(0b001))
}

/// One node in the cube hierarchy.
#[derive(Debug, Clone)]
pub struct CubeHandler {
    /// The cube this node represents
    pub cube: Cube,
    /// Edge length of the node's bounding box
    pub size: f32,
    children: Option<Box<[CubeHandler; OCTANT_COUNT]>>,
}

impl CubeHandler {
    /// Wraps a cube in a leaf node with the given edge length.
    pub fn new(cube: Cube, size: f32) -> Self {
        Self {
            cube,
            size,
            children: None,
        }
    }

    /// A leaf around an axis-aligned cube of edge `size` centered on `position`.
    pub fn uniform(position: Point3<f32>, size: f32) -> Self {
        Self::new(Cube::uniform(position, size), size)
    }

    /// Whether this node has been split into octants.
    pub fn is_split(&self) -> bool {
        self.children.is_some()
    }

    /// The eight children of a split node, `None` for a leaf.
    pub fn children(&self) -> Option<&[CubeHandler; OCTANT_COUNT]> {
        self.children.as_deref()
    }

    /// Mutable access to the children of a split node.
    pub fn children_mut(&mut self) -> Option<&mut [CubeHandler; OCTANT_COUNT]> {
        self.children.as_deref_mut()
    }

    /// Minimum and maximum corners of the node's bounding box.
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        let half = self.size / 2.0;
        let half_extent = Vector3::new(half, half, half);
        let center = self.cube.position();
        (center - half_extent, center + half_extent)
    }

    /// Splits a leaf into eight half-size leaves, one per octant.
    ///
    /// Calling this on a node that is already split leaves it untouched.
    pub fn split(&mut self) {
        if self.is_split() {
            return;
        }

        let child_size = self.size / 2.0;
        let offset = child_size / 2.0;
        let center = self.cube.position();

        let children = std::array::from_fn(|octant| {
            let child_position = center + octant_signs(octant) * offset;
            CubeHandler::uniform(child_position, child_size)
        });
        self.children = Some(Box::new(children));
    }

    /// Splits every node down to `depth` levels below this one.
    pub fn split_to_depth(&mut self, depth: u32) {
        if depth == 0 {
            return;
        }
        self.split();
        if let Some(children) = self.children_mut() {
            for child in children.iter_mut() {
                child.split_to_depth(depth - 1);
            }
        }
    }

    /// Splits this node and keeps splitting only the children listed in
    /// [`SPARSE_SPLIT_OCTANTS`], down to `depth` levels.
    pub fn split_sparse(&mut self, depth: u32) {
        if depth == 0 {
            return;
        }
        self.split();
        if let Some(children) = self.children_mut() {
            for octant in SPARSE_SPLIT_OCTANTS {
                children[octant].split_sparse(depth - 1);
            }
        }
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        match self.children() {
            Some(children) => children.iter().map(CubeHandler::leaf_count).sum(),
            None => 1,
        }
    }
}
