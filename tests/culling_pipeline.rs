use cgmath::{perspective, Deg, Matrix4, Point3, Vector3};
use voxel_culling::{
    config::{EngineConfig, WorldConfig},
    engine_state::{
        camera_state::CameraState,
        culling::{render_chunk, render_cubes, CullingStats, Frustum},
        rendering::CubeDrawer,
        voxels::{
            chunk::{Chunk, CHUNK_SIZE},
            cube_handler::CubeHandler,
            world::{TraversalMode, World},
        },
    },
};

#[derive(Default)]
struct RecordingDrawer {
    translations: Vec<Vector3<f32>>,
}

impl CubeDrawer for RecordingDrawer {
    fn draw(&mut self, model: &Matrix4<f32>) {
        self.translations.push(model.w.truncate());
    }
}

fn frustum_looking_at(eye: Point3<f32>, target: Point3<f32>, margin: f32) -> Frustum {
    let projection = perspective(Deg(60.0), 1.0, 0.1, 100.0);
    let view = Matrix4::look_at_rh(eye, target, Vector3::unit_y());
    Frustum::from_view_projection(&(projection * view), margin)
}

#[test]
fn default_camera_sees_part_of_the_chunk() {
    let config = EngineConfig::default();
    let camera_state = CameraState::new(&config, config.window.width, config.window.height);
    let frustum = Frustum::from_view_projection(&camera_state.view_projection(), config.frustum_margin);
    let world = World::new(&config.world);
    let mut drawer = RecordingDrawer::default();

    let stats = world.render(TraversalMode::Grid, &frustum, &mut drawer);

    assert!(stats.visible_cubes > 0);
    assert!(stats.visible_cubes as usize <= CHUNK_SIZE);
    assert_eq!(stats.point_tests as usize, CHUNK_SIZE);
    assert_eq!(drawer.translations.len(), stats.visible_cubes as usize);
}

#[test]
fn every_drawn_cube_center_is_inside_the_frustum() {
    let chunk = Chunk::generate(Point3::new(0, 0, 0));
    let frustum = frustum_looking_at(Point3::new(-3.0, 3.0, 3.0), Point3::new(5.0, -2.0, -5.0), 0.0);
    let mut drawer = RecordingDrawer::default();
    let mut stats = CullingStats::default();

    render_chunk(&chunk, &frustum, &mut drawer, &mut stats);

    for translation in &drawer.translations {
        let center = Point3::new(translation.x, translation.y, translation.z);
        assert!(frustum.is_point_in_frustum(center));
    }
    let hidden = chunk
        .handlers()
        .iter()
        .filter(|handler| !frustum.is_point_in_frustum(handler.cube.position()))
        .count();
    assert_eq!(hidden + drawer.translations.len(), CHUNK_SIZE);
}

#[test]
fn turning_away_culls_the_whole_chunk() {
    let world = World::new(&WorldConfig::default());
    let frustum = frustum_looking_at(Point3::new(4.5, 4.5, 30.0), Point3::new(4.5, 4.5, 60.0), 0.9);
    let mut drawer = RecordingDrawer::default();

    let grid = world.render(TraversalMode::Grid, &frustum, &mut drawer);
    let octree = world.render(TraversalMode::Octree, &frustum, &mut drawer);

    assert_eq!(grid.visible_cubes, 0);
    assert_eq!(grid.chunks_culled, 1);
    assert_eq!(grid.aabb_tests, 1);
    assert_eq!(octree.visible_cubes, 0);
    assert_eq!(octree.aabb_tests, 1);
    assert!(drawer.translations.is_empty());
}

#[test]
fn octree_prunes_more_than_the_grid_on_a_narrow_view() {
    let mut config = WorldConfig::default();
    config.octree_depth = 4;
    let world = World::new(&config);
    // Looking at one corner of the chunk from close by.
    let frustum = frustum_looking_at(Point3::new(-2.0, -2.0, -2.0), Point3::new(0.0, 0.0, 0.0), 0.0);
    let mut drawer = RecordingDrawer::default();

    let grid = world.render(TraversalMode::Grid, &frustum, &mut drawer);
    let octree = world.render(TraversalMode::Octree, &frustum, &mut drawer);

    assert_eq!(grid.point_tests as usize, CHUNK_SIZE);
    assert!((octree.point_tests as usize) < world.octree.leaf_count());
    assert!(octree.visible_cubes > 0);
}

#[test]
fn sparse_octree_only_draws_existing_leaves() {
    let mut root = CubeHandler::uniform(Point3::new(0.0, 0.0, 0.0), 8.0);
    root.split_sparse(3);
    let frustum = frustum_looking_at(Point3::new(0.0, 0.0, 40.0), Point3::new(0.0, 0.0, 0.0), 0.9);
    let mut drawer = RecordingDrawer::default();
    let mut stats = CullingStats::default();

    render_cubes(&root, &frustum, &mut drawer, &mut stats);

    assert_eq!(stats.visible_cubes as usize, root.leaf_count());
    assert_eq!(drawer.translations.len(), root.leaf_count());
}
