//! Physics mode: C-shaped rings spin above a static base and keep only the arc
//! that lines up with the ring below.

use std::f32::consts::PI;

use glam::Vec3;

use super::{ModeStrategy, Opening, Placement, ticks};
use crate::consts::PIECE_HEIGHT;
use crate::geometry::{create_ring, planar_direction};
use crate::render::Transform;
use crate::render::vertex::colors;
use crate::sim::falling::Launch;
use crate::sim::state::{Entity, RingPiece, Stack};
use crate::sim::world::World;
use crate::{angular_distance, score_points};

pub struct RingStack;

/// Arc of the current ring that still sits over the previous one
pub fn overlap_arc(current_angle: f32, previous_angle: f32, max_arc: f32) -> f32 {
    let distance = angular_distance(current_angle, previous_angle);
    max_arc * (1.0 - distance / PI).max(0.0)
}

/// Add a ring sector mesh spanning [0, arc] at `position`, turned by `angle`
fn add_ring_mesh(
    world: &mut World,
    (inner, outer): (f32, f32),
    arc: f32,
    position: Vec3,
    angle: f32,
) -> Entity {
    Entity::visual(world.add_mesh(
        create_ring(inner, outer, PIECE_HEIGHT, 0.0, arc),
        Transform::at_yaw(position, angle),
        colors::RING_AMBER,
    ))
}

impl ModeStrategy for RingStack {
    fn begin_run(&self, stack: &mut Stack, world: &mut World) -> Opening {
        let tuning = world.config.tuning.ring.clone();
        let position = Vec3::new(0.0, tuning.base_y, 0.0);
        let mut entity = add_ring_mesh(
            world,
            (tuning.inner_radius, tuning.outer_radius),
            tuning.arc_length,
            position,
            tuning.base_angle,
        );
        entity.body = world.attach_body(entity.mesh, Launch::new(0.0, Vec3::ZERO));

        let base = RingPiece {
            entity,
            inner_radius: tuning.inner_radius,
            outer_radius: tuning.outer_radius,
            arc_start: 0.0,
            arc_end: tuning.arc_length,
            angle: tuning.base_angle,
            height: PIECE_HEIGHT,
            position,
            is_moving: false,
        };
        stack.rings.push(base);

        Opening::Deferred {
            delay_ms: world.config.base_spawn_delay_ms,
        }
    }

    fn spawn_next(&self, stack: &mut Stack, world: &mut World) {
        let Some(last) = stack.rings.last() else {
            log::warn!("Ring spawn requested without a base");
            return;
        };
        let radii = (last.inner_radius, last.outer_radius);
        let arc = last.arc_length();
        let position = last.position + Vec3::Y * world.config.tuning.ring.tier_spacing;
        let angle = world.random_angle();

        let ring = RingPiece {
            entity: add_ring_mesh(world, radii, arc, position, angle),
            inner_radius: radii.0,
            outer_radius: radii.1,
            arc_start: 0.0,
            arc_end: arc,
            angle,
            height: PIECE_HEIGHT,
            position,
            is_moving: true,
        };
        stack.rings.push(ring);
    }

    fn advance(&self, stack: &mut Stack, world: &mut World, dt: f32) {
        let spin = world.config.tuning.ring.spin_speed;
        let Some(ring) = stack.active_ring_mut() else {
            return;
        };
        ring.angle += spin * ticks(dt);
        world.scene.set_transform(ring.entity.mesh, ring.transform());
    }

    fn evaluate_placement(&self, stack: &mut Stack, world: &mut World) -> Placement {
        let tuning = world.config.tuning.ring.clone();
        if stack.rings.len() < 2 || !stack.settle_active() {
            return Placement::Ignored;
        }
        let n = stack.rings.len();
        let previous_angle = stack.rings[n - 2].angle;
        let current = &stack.rings[n - 1];
        let max_arc = current.arc_length();
        let overlap = overlap_arc(current.angle, previous_angle, max_arc);

        if overlap < max_arc * tuning.miss_ratio {
            if let Some(missed) = stack.rings.pop() {
                let linvel = Vec3::new(world.jitter(2.5), -1.0, world.jitter(2.5));
                let angvel = world.jitter_vec(1.5);
                world.release(
                    missed.entity.mesh,
                    Launch::new(tuning.miss_mass, linvel).spinning(angvel),
                );
            }
            log::debug!("Ring miss (overlap {:.2} of {:.2} rad)", overlap, max_arc);
            return Placement::Missed;
        }

        let mut debris = 0;
        if overlap < max_arc * tuning.trim_ratio {
            let current = &mut stack.rings[n - 1];
            current.angle = previous_angle;
            current.arc_end = current.arc_start + overlap;
            world.scene.set_geometry(
                current.entity.mesh,
                create_ring(
                    current.inner_radius,
                    current.outer_radius,
                    current.height,
                    current.arc_start,
                    current.arc_end,
                ),
            );
            world.scene.set_transform(current.entity.mesh, current.transform());

            let cut = max_arc - overlap;
            if cut > tuning.min_wedge_arc {
                let wedge_arc = cut / 2.0;
                let color = world.color_of(current.entity.mesh);
                let (inner, outer, height) =
                    (current.inner_radius, current.outer_radius, current.height);
                let (position, angle) = (current.position, current.angle);

                for i in 0..2 {
                    let offset = overlap + i as f32 * wedge_arc;
                    let outward = planar_direction(angle + offset + wedge_arc / 2.0);
                    let linvel = outward * tuning.wedge_push + Vec3::Y * 2.0;
                    let angvel = world.jitter_vec(2.5);
                    world.spawn_debris(
                        create_ring(inner, outer, height, 0.0, wedge_arc),
                        Transform::at_yaw(position, angle + offset),
                        color,
                        Launch::new(tuning.wedge_mass, linvel).spinning(angvel),
                    );
                    debris += 1;
                }
            }
        }

        Placement::Landed {
            points: score_points(tuning.score_weight, overlap / max_arc),
            debris,
            topple: overlap < tuning.min_arc,
        }
    }
}
