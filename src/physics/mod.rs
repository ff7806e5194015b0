//! Rigid-body physics for stack bases and falling debris
//!
//! Wraps a rapier3d pipeline behind glam types. Every piece body is a cuboid
//! sized to the bounding box of its mesh; rings and arcs are approximated, not
//! collided exactly.

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

use crate::consts::{BODY_FRICTION, BODY_RESTITUTION};

/// Handle to a body owned by the physics world
pub type BodyHandle = RigidBodyHandle;

/// World-space position and orientation of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

/// Body request: bounding box size, placement, mass and initial motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    /// Full width × height × depth of the box
    pub size: Vec3,
    pub position: Vec3,
    pub rotation: Quat,
    /// Zero means static
    pub mass: f32,
    pub linvel: Vec3,
    pub angvel: Vec3,
}

impl BodyDesc {
    pub fn boxed(size: Vec3, position: Vec3, mass: f32) -> Self {
        Self {
            size,
            position,
            rotation: Quat::IDENTITY,
            mass,
            linvel: Vec3::ZERO,
            angvel: Vec3::ZERO,
        }
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, linvel: Vec3) -> Self {
        self.linvel = linvel;
        self
    }

    pub fn with_spin(mut self, angvel: Vec3) -> Self {
        self.angvel = angvel;
        self
    }

    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }
}

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

#[inline]
fn to_axis_angle(q: Quat) -> Vector<Real> {
    let (axis, angle) = q.to_axis_angle();
    to_vector(axis * angle)
}

fn pose_of(body: &RigidBody) -> Pose {
    let t = body.translation();
    let q = body.rotation();
    Pose {
        position: Vec3::new(t.x, t.y, t.z),
        rotation: Quat::from_xyzw(q.i, q.j, q.k, q.w).normalize(),
    }
}

/// The physics world: rapier sets plus the fixed-step pipeline
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    ground: Option<BodyHandle>,
}

impl PhysicsWorld {
    /// Create an empty world stepping at `dt` with gravity along Y
    pub fn new(gravity_y: f32, dt: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt,
            ..Default::default()
        };

        Self {
            gravity: vector![0.0, gravity_y, 0.0],
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            ground: None,
        }
    }

    /// Add the static ground slab (top face at y = 0)
    pub fn add_ground(&mut self, half_extent: f32) -> BodyHandle {
        let desc = BodyDesc::boxed(
            Vec3::new(half_extent * 2.0, 1.0, half_extent * 2.0),
            Vec3::new(0.0, -0.5, 0.0),
            0.0,
        );
        let handle = self.create_body(&desc);
        self.ground = Some(handle);
        handle
    }

    /// Create a box body; zero mass yields a fixed body
    pub fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let builder = if desc.is_static() {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
                .linvel(to_vector(desc.linvel))
                .angvel(to_vector(desc.angvel))
        };
        let body = builder
            .translation(to_vector(desc.position))
            .rotation(to_axis_angle(desc.rotation))
            .build();

        let half = (desc.size / 2.0).max(Vec3::splat(0.01));
        let mut collider = ColliderBuilder::cuboid(half.x, half.y, half.z)
            .friction(BODY_FRICTION)
            .restitution(BODY_RESTITUTION);
        if !desc.is_static() {
            collider = collider.mass(desc.mass);
        }

        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);
        handle
    }

    /// Advance the simulation by one fixed step
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Current pose of a body, if it still exists
    pub fn pose(&self, handle: BodyHandle) -> Option<Pose> {
        self.bodies.get(handle).map(pose_of)
    }

    /// Full extents of a body's box collider
    #[cfg(test)]
    pub(crate) fn collider_size(&self, handle: BodyHandle) -> Option<Vec3> {
        let body = self.bodies.get(handle)?;
        let collider = self.colliders.get(*body.colliders().first()?)?;
        let half = collider.shape().as_cuboid()?.half_extents;
        Some(Vec3::new(half.x, half.y, half.z) * 2.0)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    /// Remove a body and its collider; returns false if it was already gone
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        if Some(handle) == self.ground {
            self.ground = None;
        }
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Number of bodies including the ground
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn ground(&self) -> Option<BodyHandle> {
        self.ground
    }

    /// Remove every body
    pub fn release_all(&mut self) {
        let handles: Vec<BodyHandle> = self.bodies.iter().map(|(h, _)| h).collect();
        for handle in handles {
            self.remove_body(handle);
        }
    }
}
