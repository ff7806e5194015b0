//! Scene, physics and RNG shared by every mode
//!
//! Modes never touch the physics world directly; bodies are created here from
//! the bounds of the mesh they belong to.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::falling::{FallingPiece, FallingPieces, Launch};
use super::state::{Attachment, Entity, Stack};
use crate::config::EngineConfig;
use crate::geometry::{Geometry, create_box};
use crate::physics::{BodyDesc, PhysicsWorld};
use crate::render::vertex::colors;
use crate::render::{MeshHandle, RenderScene, Transform};

pub struct World {
    pub scene: RenderScene,
    pub physics: PhysicsWorld,
    pub falling: FallingPieces,
    pub rng: Pcg32,
    pub config: EngineConfig,
}

impl World {
    pub fn new(config: EngineConfig) -> Self {
        let mut world = Self {
            scene: RenderScene::new(),
            physics: PhysicsWorld::new(config.gravity, config.fixed_dt),
            falling: FallingPieces::new(),
            rng: Pcg32::seed_from_u64(config.seed),
            config,
        };
        world.build_ground();
        world
    }

    fn build_ground(&mut self) {
        let half = self.config.ground_half_extent;
        if half <= 0.0 {
            return;
        }
        self.physics.add_ground(half);
        self.scene.add(
            create_box(half * 2.0, half * 2.0, 1.0),
            Transform::at(Vec3::new(0.0, -0.5, 0.0)),
            colors::GROUND,
        );
    }

    pub fn add_mesh(&mut self, geometry: Geometry, transform: Transform, color: [f32; 4]) -> MeshHandle {
        self.scene.add(geometry, transform, color)
    }

    pub fn color_of(&self, mesh: MeshHandle) -> [f32; 4] {
        self.scene.get(mesh).map(|m| m.color).unwrap_or([1.0; 4])
    }

    /// Create a body matching the bounds of `mesh`; zero mass makes it static
    pub fn attach_body(&mut self, mesh: MeshHandle, launch: Launch) -> Option<Attachment> {
        let Some(target) = self.scene.get(mesh) else {
            log::warn!("No mesh {:?} to attach a body to", mesh);
            return None;
        };
        let bounds = target.geometry.bounds();
        let transform = target.transform;

        let desc = BodyDesc::boxed(bounds.size(), transform.apply(bounds.center()), launch.mass)
            .rotated(transform.rotation)
            .with_velocity(launch.linvel)
            .with_spin(launch.angvel);
        Some(Attachment {
            body: self.physics.create_body(&desc),
            offset: bounds.center(),
        })
    }

    /// Hand an existing mesh over to physics as falling debris
    pub fn release(&mut self, mesh: MeshHandle, launch: Launch) -> bool {
        match self.attach_body(mesh, launch) {
            Some(attachment) => {
                self.falling.push(FallingPiece {
                    mesh,
                    body: attachment.body,
                    offset: attachment.offset,
                });
                true
            }
            None => false,
        }
    }

    /// Create a new falling fragment
    pub fn spawn_debris(
        &mut self,
        geometry: Geometry,
        transform: Transform,
        color: [f32; 4],
        launch: Launch,
    ) {
        let mesh = self.add_mesh(geometry, transform, color);
        self.release(mesh, launch);
    }

    pub fn remove_entity(&mut self, entity: Entity) {
        self.scene.remove(entity.mesh);
        if let Some(attachment) = entity.body {
            self.physics.remove_body(attachment.body);
        }
    }

    /// Remove every run element and all debris; the ground stays
    pub fn clear_run(&mut self, stack: &mut Stack) {
        for entity in stack.entities() {
            self.remove_entity(entity);
        }
        stack.clear();
        self.falling.clear(&mut self.scene, &mut self.physics);
    }

    /// Release everything including the ground
    pub fn release_all(&mut self) {
        self.falling.clear(&mut self.scene, &mut self.physics);
        self.scene.clear();
        self.physics.release_all();
    }

    /// Uniform sample in (-half, half)
    pub fn jitter(&mut self, half: f32) -> f32 {
        if half <= 0.0 {
            return 0.0;
        }
        self.rng.random_range(-half..half)
    }

    pub fn jitter_vec(&mut self, half: f32) -> Vec3 {
        Vec3::new(self.jitter(half), self.jitter(half), self.jitter(half))
    }

    /// +1 or -1 with equal odds
    pub fn coin(&mut self) -> f32 {
        if self.rng.random_bool(0.5) { 1.0 } else { -1.0 }
    }

    /// Uniform angle in [0, 2π)
    pub fn random_angle(&mut self) -> f32 {
        self.rng.random::<f32>() * std::f32::consts::TAU
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::create_ring;
    use crate::sim::state::{Motion, Piece};

    #[test]
    fn test_new_world_has_ground() {
        let world = World::new(EngineConfig::default());
        assert_eq!(world.scene.len(), 1);
        assert_eq!(world.physics.body_count(), 1);
        assert!(world.physics.ground().is_some());
    }

    #[test]
    fn test_ground_can_be_disabled() {
        let config = EngineConfig {
            ground_half_extent: 0.0,
            ..EngineConfig::default()
        };
        let world = World::new(config);
        assert!(world.scene.is_empty());
        assert_eq!(world.physics.body_count(), 0);
    }

    #[test]
    fn test_body_is_centered_on_ring_bounds() {
        let mut world = World::new(EngineConfig::default());
        let mesh = world.add_mesh(
            create_ring(3.0, 7.0, 2.0, 0.0, std::f32::consts::PI),
            Transform::at(Vec3::new(0.0, 1.0, 0.0)),
            colors::RING_AMBER,
        );
        let attachment = world
            .attach_body(mesh, Launch::new(0.0, Vec3::ZERO))
            .expect("mesh exists");

        // Upper half ring sits on the -z side
        assert!(attachment.offset.z < -3.0);
        let pose = world.physics.pose(attachment.body).expect("body exists");
        assert!((pose.position - Vec3::new(0.0, 1.0, attachment.offset.z)).length() < 1e-4);
    }

    #[test]
    fn test_release_moves_mesh_to_falling() {
        let mut world = World::new(EngineConfig::default());
        let mesh = world.add_mesh(create_box(2.0, 2.0, 2.0), Transform::default(), [1.0; 4]);
        assert!(world.release(mesh, Launch::new(5.0, Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(world.falling.len(), 1);
        assert!(!world.release(MeshHandle(999), Launch::new(5.0, Vec3::ZERO)));
    }

    #[test]
    fn test_clear_run_keeps_ground() {
        let mut world = World::new(EngineConfig::default());
        let mut stack = Stack::default();
        let mesh = world.add_mesh(create_box(10.0, 10.0, 2.0), Transform::default(), [1.0; 4]);
        stack.pieces.push(Piece {
            entity: Entity::visual(mesh),
            width: 10.0,
            depth: 10.0,
            position: Vec3::ZERO,
            rotation: 0.0,
            motion: Motion::Still,
            is_moving: true,
        });
        world.spawn_debris(
            create_box(1.0, 1.0, 1.0),
            Transform::at(Vec3::new(0.0, 5.0, 0.0)),
            [1.0; 4],
            Launch::new(1.0, Vec3::ZERO),
        );

        world.clear_run(&mut stack);
        assert!(stack.is_empty());
        assert!(world.falling.is_empty());
        assert_eq!(world.scene.len(), 1);
        assert_eq!(world.physics.body_count(), 1);
    }

    #[test]
    fn test_rng_helpers_stay_in_range() {
        let mut world = World::new(EngineConfig::with_seed(3));
        for _ in 0..100 {
            assert!(world.jitter(2.5).abs() < 2.5);
            assert_eq!(world.coin().abs(), 1.0);
            let angle = world.random_angle();
            assert!((0.0..std::f32::consts::TAU).contains(&angle));
        }
        assert_eq!(world.jitter(0.0), 0.0);
    }
}
