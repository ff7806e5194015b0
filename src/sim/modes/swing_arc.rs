//! Swing arc mode: arcs pendulum about the tower axis and shrink by how far
//! their swing phase drifted from the arc below.

use std::f32::consts::FRAC_PI_4;

use glam::Vec3;

use super::{ModeStrategy, Placement, ticks};
use crate::consts::PIECE_HEIGHT;
use crate::geometry::{Geometry, create_arc};
use crate::render::Transform;
use crate::render::vertex::colors;
use crate::score_points;
use crate::sim::falling::Launch;
use crate::sim::state::{Entity, Motion, Piece, Stack};
use crate::sim::world::World;

pub struct SwingArc;

/// Arc whose radial thickness never exceeds its radius
fn arc_geometry(radius: f32, thickness: f32, arc_angle: f32) -> Geometry {
    create_arc(radius, thickness.min(radius), PIECE_HEIGHT, arc_angle)
}

/// Usable width left when two arcs are `delta` radians out of phase
pub fn phase_overlap(max_overlap: f32, delta: f32) -> f32 {
    max_overlap * delta.abs().cos()
}

impl ModeStrategy for SwingArc {
    fn spawn_next(&self, stack: &mut Stack, world: &mut World) {
        let tuning = world.config.tuning.swing.clone();
        let index = stack.pieces.len();
        let radius = stack
            .pieces
            .last()
            .map_or(tuning.max_radius, |p| (p.width / 2.0).min(tuning.max_radius));
        let position = Vec3::new(0.0, index as f32 * tuning.tier_spacing, 0.0);

        let motion = if index == 0 {
            Motion::Still
        } else {
            Motion::Swing {
                angle: 0.0,
                amplitude: tuning.amplitude,
                speed: tuning.base_speed + tuning.speed_per_level * index as f32,
            }
        };

        let color = colors::hsl((index as f32 * 0.15) % 1.0, 0.8, 0.6);
        let mesh = world.add_mesh(
            arc_geometry(radius, tuning.thickness, tuning.arc_angle),
            Transform::at(position),
            color,
        );
        stack.pieces.push(Piece {
            entity: Entity::visual(mesh),
            width: radius * 2.0,
            depth: tuning.thickness,
            position,
            rotation: 0.0,
            motion,
            is_moving: true,
        });
    }

    fn advance(&self, stack: &mut Stack, world: &mut World, dt: f32) {
        let Some(piece) = stack.active_piece_mut() else {
            return;
        };
        let Motion::Swing {
            angle,
            amplitude,
            speed,
        } = piece.motion
        else {
            return;
        };

        let angle = angle + speed * ticks(dt);
        piece.motion = Motion::Swing {
            angle,
            amplitude,
            speed,
        };
        piece.rotation = angle.sin() * amplitude;
        world.scene.set_transform(piece.entity.mesh, piece.transform());
    }

    fn evaluate_placement(&self, stack: &mut Stack, world: &mut World) -> Placement {
        let tuning = world.config.tuning.swing.clone();
        if stack.pieces.len() < 2 || !stack.settle_active() {
            return Placement::Ignored;
        }
        let n = stack.pieces.len();
        let previous = &stack.pieces[n - 2];
        let current = &stack.pieces[n - 1];

        let phase = current.motion.phase_angle();
        let delta = phase - previous.motion.phase_angle();
        let max_overlap = current.width.min(previous.width);
        let overlap = phase_overlap(max_overlap, delta);

        if overlap <= max_overlap * tuning.miss_ratio {
            if let Some(missed) = stack.pieces.pop() {
                let linvel = Vec3::new(phase.sin() * tuning.miss_push, -2.0, 0.0);
                let angvel = Vec3::new(0.0, 0.0, phase * 2.0);
                world.release(
                    missed.entity.mesh,
                    Launch::new(tuning.miss_mass, linvel).spinning(angvel),
                );
            }
            log::debug!("Swing miss at level {} (phase delta {:.2})", n - 1, delta);
            return Placement::Missed;
        }

        let new_width = overlap;
        let mut debris = 0;
        let current = &mut stack.pieces[n - 1];

        if new_width < current.width * tuning.trim_ratio {
            let cut_ratio = 1.0 - new_width / current.width;
            current.width = new_width;
            world.scene.set_geometry(
                current.entity.mesh,
                arc_geometry(new_width / 2.0, tuning.thickness, tuning.arc_angle),
            );

            let color = world.color_of(current.entity.mesh);
            let fragment_radius = new_width * cut_ratio / 4.0;
            for side in [-1.0f32, 1.0] {
                let position = current.position + Vec3::X * side * new_width / 2.0;
                let linvel = Vec3::new(side * tuning.fragment_push, 2.0, world.jitter(1.5));
                let angvel = Vec3::new(world.jitter(2.5), side * 3.0, world.jitter(2.5));
                world.spawn_debris(
                    arc_geometry(fragment_radius, tuning.thickness, tuning.arc_angle / 2.0),
                    Transform::at_yaw(position, current.rotation + side * FRAC_PI_4),
                    color,
                    Launch::new(tuning.fragment_mass, linvel).spinning(angvel),
                );
                debris += 1;
            }
        }

        Placement::Landed {
            points: score_points(tuning.score_weight, overlap / max_overlap),
            debris,
            topple: new_width < tuning.min_width,
        }
    }
}
