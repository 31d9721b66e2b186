//! # View Frustum
//!
//! Six half-space planes extracted from a combined view-projection matrix with the
//! Gribb–Hartmann identities, plus the point and box containment queries the
//! hierarchy traversal is built on.
//!
//! The planes follow the OpenGL clip convention (`-w <= x, y, z <= w`), which is what
//! `cgmath::perspective` and `cgmath::ortho` produce. Feed the frustum the projection
//! *before* any depth-range remapping for the GPU.

use cgmath::{InnerSpace, Matrix, Matrix4, Point3, Vector3, Vector4, Zero};
use log::warn;

/// Number of planes bounding the view volume.
pub const FRUSTUM_PLANE_COUNT: usize = 6;

/// Index of each plane inside [`Frustum::planes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// `row3 + row0`
    Left = 0,
    /// `row3 - row0`
    Right = 1,
    /// `row3 + row1`
    Bottom = 2,
    /// `row3 - row1`
    Top = 3,
    /// `row3 + row2`
    Near = 4,
    /// `row3 - row2`
    Far = 5,
}

/// A plane `dot(normal, p) + distance = 0`; the side where the expression is
/// non-negative is inside the view volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the view volume
    pub normal: Vector3<f32>,
    /// Signed distance term, already inflated by the frustum margin
    pub distance: f32,
}

impl Plane {
    /// A plane every point satisfies. Stands in for planes that cannot be normalized.
    pub const ACCEPT_ALL: Plane = Plane {
        normal: Vector3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
        distance: f32::MAX,
    };

    /// Builds a plane from raw coefficients, normalizing by the length of the
    /// normal and then pushing the plane outward by `margin`.
    ///
    /// Returns `None` when the normal has zero or non-finite length. The
    /// coefficients are homogeneous, so any other length is usable however small.
    pub fn from_coefficients(coefficients: Vector4<f32>, margin: f32) -> Option<Self> {
        let normal = coefficients.truncate();
        let length = normal.magnitude();
        if !length.is_finite() || length == 0.0 {
            return None;
        }

        Some(Self {
            normal: normal / length,
            distance: coefficients.w / length + margin,
        })
    }

    /// Signed distance from the plane to `point` (positive = inside).
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        if self.normal.is_zero() {
            return self.distance;
        }
        self.normal.dot(Vector3::new(point.x, point.y, point.z)) + self.distance
    }
}

/// The camera's view volume, re-derived wholesale every frame.
#[derive(Debug, Clone)]
pub struct Frustum {
    planes: [Plane; FRUSTUM_PLANE_COUNT],
    margin: f32,
}

impl Default for Frustum {
    fn default() -> Self {
        Self::new()
    }
}

impl Frustum {
    /// Creates a frustum that accepts everything until the first [`Frustum::update`].
    pub fn new() -> Self {
        Self {
            planes: [Plane::ACCEPT_ALL; FRUSTUM_PLANE_COUNT],
            margin: 0.0,
        }
    }

    /// Creates a frustum directly from a view-projection matrix.
    pub fn from_view_projection(view_projection: &Matrix4<f32>, margin: f32) -> Self {
        let mut frustum = Self::new();
        frustum.update(view_projection, margin);
        frustum
    }

    /// Replaces all six planes with the ones extracted from `view_projection`.
    ///
    /// # Arguments
    /// * `view_projection` - `projection * view` for the current frame
    /// * `margin` - Outward inflation added to every plane's distance term. Positive
    ///   values over-include geometry near the edges of the view.
    pub fn update(&mut self, view_projection: &Matrix4<f32>, margin: f32) {
        let m = view_projection;
        let coefficients: [Vector4<f32>; FRUSTUM_PLANE_COUNT] = [
            m.row(3) + m.row(0),
            m.row(3) - m.row(0),
            m.row(3) + m.row(1),
            m.row(3) - m.row(1),
            m.row(3) + m.row(2),
            m.row(3) - m.row(2),
        ];

        self.margin = margin;
        for (plane, coefficients) in self.planes.iter_mut().zip(coefficients) {
            *plane = match Plane::from_coefficients(coefficients, margin) {
                Some(normalized) => normalized,
                None => {
                    warn!(
                        "Degenerate frustum plane {:?}, culling disabled on that side",
                        coefficients
                    );
                    Plane::ACCEPT_ALL
                }
            };
        }
    }

    /// The six planes in [`PlaneSide`] order.
    pub fn planes(&self) -> &[Plane; FRUSTUM_PLANE_COUNT] {
        &self.planes
    }

    /// The plane on one side of the volume.
    pub fn plane(&self, side: PlaneSide) -> &Plane {
        &self.planes[side as usize]
    }

    /// Margin used by the last update.
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Returns `true` when `point` lies on the inner side of every plane.
    pub fn is_point_in_frustum(&self, point: Point3<f32>) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(point) >= 0.0)
    }

    /// Conservative box test.
    ///
    /// For each plane only the corner furthest along the plane normal (the
    /// "positive vertex") is tested. A box is rejected only when that corner is
    /// outside some plane, so boxes straddling a boundary are always accepted.
    pub fn is_aabb_in_frustum(&self, min: Point3<f32>, max: Point3<f32>) -> bool {
        self.planes.iter().all(|plane| {
            let positive_vertex = Point3::new(
                if plane.normal.x >= 0.0 { max.x } else { min.x },
                if plane.normal.y >= 0.0 { max.y } else { min.y },
                if plane.normal.z >= 0.0 { max.z } else { min.z },
            );
            plane.signed_distance(positive_vertex) >= 0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{ortho, perspective, Deg, SquareMatrix};

    fn looking_at_origin() -> Matrix4<f32> {
        let projection = perspective(Deg(60.0), 1.5, 0.1, 100.0);
        let view = Matrix4::look_at_rh(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        projection * view
    }

    #[test]
    fn update_produces_six_unit_normals() {
        let frustum = Frustum::from_view_projection(&looking_at_origin(), 0.9);

        assert_eq!(frustum.planes().len(), FRUSTUM_PLANE_COUNT);
        for plane in frustum.planes() {
            assert_relative_eq!(plane.normal.magnitude(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn look_at_target_is_inside_and_far_behind_is_outside() {
        let frustum = Frustum::from_view_projection(&looking_at_origin(), 0.0);

        assert!(frustum.is_point_in_frustum(Point3::new(0.0, 0.0, 0.0)));
        assert!(!frustum.is_point_in_frustum(Point3::new(0.0, 0.0, 500.0)));
    }

    #[test]
    fn near_plane_faces_view_direction() {
        let frustum = Frustum::from_view_projection(&looking_at_origin(), 0.0);
        let near = frustum.plane(PlaneSide::Near);

        assert_relative_eq!(near.normal.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(near.signed_distance(Point3::new(0.0, 0.0, 4.9)), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn box_fully_inside_is_accepted() {
        let frustum = Frustum::from_view_projection(&looking_at_origin(), 0.0);

        assert!(frustum.is_aabb_in_frustum(
            Point3::new(-0.5, -0.5, -0.5),
            Point3::new(0.5, 0.5, 0.5)
        ));
    }

    #[test]
    fn box_straddling_a_plane_is_accepted() {
        let frustum = Frustum::from_view_projection(&looking_at_origin(), 0.0);
        let min = Point3::new(-100.0, -1.0, -1.0);
        let max = Point3::new(0.0, 1.0, 1.0);

        assert!(!frustum.is_point_in_frustum(min));
        assert!(frustum.is_aabb_in_frustum(min, max));
    }

    #[test]
    fn box_beside_the_view_is_rejected() {
        let frustum = Frustum::from_view_projection(&looking_at_origin(), 0.0);

        assert!(!frustum.is_aabb_in_frustum(
            Point3::new(50.0, -1.0, -1.0),
            Point3::new(60.0, 1.0, 1.0)
        ));
    }

    #[test]
    fn orthographic_planes_match_box_edges() {
        let frustum = Frustum::from_view_projection(&ortho(0.1, 0.9, 0.1, 0.9, 0.1, 0.9), 0.0);

        assert!(frustum.is_point_in_frustum(Point3::new(0.5, 0.5, -0.5)));
        assert!(!frustum.is_point_in_frustum(Point3::new(0.05, 0.5, -0.5)));
        assert!(!frustum.is_point_in_frustum(Point3::new(0.5, 0.5, -0.95)));
        assert!(!frustum.is_point_in_frustum(Point3::new(0.5, 0.5, 0.0)));
    }

    #[test]
    fn larger_margin_never_rejects_more() {
        let view_projection = looking_at_origin();
        let margins = [0.0, 0.25, 0.9, 3.0];
        let frustums: Vec<Frustum> = margins
            .iter()
            .map(|margin| Frustum::from_view_projection(&view_projection, *margin))
            .collect();

        for x in -12..=12 {
            for y in -12..=12 {
                for z in -12..=12 {
                    let point = Point3::new(x as f32, y as f32, z as f32);
                    let max = point + Vector3::new(1.0, 1.0, 1.0);
                    for pair in frustums.windows(2) {
                        if pair[0].is_point_in_frustum(point) {
                            assert!(pair[1].is_point_in_frustum(point));
                        }
                        if pair[0].is_aabb_in_frustum(point, max) {
                            assert!(pair[1].is_aabb_in_frustum(point, max));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn margin_is_added_after_normalization() {
        let frustum = Frustum::from_view_projection(&ortho(-1.0, 1.0, -1.0, 1.0, 1.0, 3.0), 0.5);

        assert_relative_eq!(frustum.margin(), 0.5);
        assert!(frustum.is_point_in_frustum(Point3::new(1.4, 0.0, -2.0)));
        assert!(!frustum.is_point_in_frustum(Point3::new(1.6, 0.0, -2.0)));
    }

    #[test]
    fn degenerate_matrix_accepts_everything() {
        let frustum = Frustum::from_view_projection(&Matrix4::zero(), 0.9);

        for plane in frustum.planes() {
            assert_eq!(*plane, Plane::ACCEPT_ALL);
        }
        assert!(frustum.is_point_in_frustum(Point3::new(1.0e6, -3.0, 42.0)));
        assert!(frustum.is_aabb_in_frustum(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn uniformly_scaled_matrix_gives_the_same_frustum() {
        let view_projection = looking_at_origin();
        let frustum = Frustum::from_view_projection(&view_projection, 0.0);
        let scaled = Frustum::from_view_projection(&(view_projection * 1.0e-8), 0.0);

        for (plane, scaled_plane) in frustum.planes().iter().zip(scaled.planes()) {
            assert_ne!(*scaled_plane, Plane::ACCEPT_ALL);
            assert_relative_eq!(plane.normal.x, scaled_plane.normal.x, epsilon = 1e-4);
            assert_relative_eq!(plane.normal.y, scaled_plane.normal.y, epsilon = 1e-4);
            assert_relative_eq!(plane.normal.z, scaled_plane.normal.z, epsilon = 1e-4);
            assert_relative_eq!(plane.distance, scaled_plane.distance, epsilon = 1e-3);
        }
        assert!(scaled.is_point_in_frustum(Point3::new(0.0, 0.0, 0.0)));
        assert!(!scaled.is_point_in_frustum(Point3::new(0.0, 0.0, 500.0)));
        assert!(!scaled.is_aabb_in_frustum(
            Point3::new(50.0, -1.0, -1.0),
            Point3::new(60.0, 1.0, 1.0)
        ));
    }

    #[test]
    fn identity_matrix_is_the_clip_cube() {
        let frustum = Frustum::from_view_projection(&Matrix4::identity(), 0.0);

        assert!(frustum.is_point_in_frustum(Point3::new(0.99, -0.99, 0.5)));
        assert!(!frustum.is_point_in_frustum(Point3::new(1.01, 0.0, 0.0)));
    }
}
