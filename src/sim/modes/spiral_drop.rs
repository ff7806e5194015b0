//! Spiral drop mode: blocks orbit the tower axis while descending and shrink by
//! how far they land from the block below.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use super::{ModeStrategy, Placement, ticks};
use crate::consts::PIECE_HEIGHT;
use crate::geometry::create_box;
use crate::render::Transform;
use crate::render::vertex::colors;
use crate::score_points;
use crate::sim::falling::Launch;
use crate::sim::state::{Entity, Motion, Piece, Stack};
use crate::sim::world::World;

pub struct SpiralDrop;

/// Planar distance between block centers
pub fn center_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

impl ModeStrategy for SpiralDrop {
    fn spawn_next(&self, stack: &mut Stack, world: &mut World) {
        let tuning = world.config.tuning.spiral.clone();
        let index = stack.pieces.len();
        let target_y = index as f32 * tuning.tier_spacing;

        let (width, depth, mut position) = match stack.pieces.last() {
            Some(last) => (last.width, last.depth, last.position),
            None => (tuning.start_size, tuning.start_size, Vec3::ZERO),
        };
        let motion = if index == 0 {
            position.y = target_y;
            Motion::Still
        } else {
            position.y = target_y + tuning.drop_height;
            Motion::Spiral {
                angle: 0.0,
                drop_speed: tuning.drop_speed,
                target_y,
            }
        };

        let color = colors::hsl((index as f32 * 0.12 + 0.5) % 1.0, 0.9, 0.5);
        let mesh = world.add_mesh(
            create_box(width, depth, PIECE_HEIGHT),
            Transform::at(position),
            color,
        );
        stack.pieces.push(Piece {
            entity: Entity::visual(mesh),
            width,
            depth,
            position,
            rotation: 0.0,
            motion,
            is_moving: true,
        });
    }

    fn advance(&self, stack: &mut Stack, world: &mut World, dt: f32) {
        let tuning = &world.config.tuning.spiral;
        let (spin, orbit) = (tuning.spin_speed, tuning.orbit_radius);
        let Some(piece) = stack.active_piece_mut() else {
            return;
        };
        let Motion::Spiral {
            angle,
            drop_speed,
            target_y,
        } = piece.motion
        else {
            return;
        };

        let steps = ticks(dt);
        let angle = angle + spin * steps;
        piece.position.x = angle.cos() * orbit;
        piece.position.z = angle.sin() * orbit;
        if piece.position.y > target_y {
            piece.position.y = (piece.position.y - drop_speed * steps).max(target_y);
        }
        piece.rotation = angle;
        piece.motion = Motion::Spiral {
            angle,
            drop_speed,
            target_y,
        };
        world.scene.set_transform(piece.entity.mesh, piece.transform());
    }

    fn evaluate_placement(&self, stack: &mut Stack, world: &mut World) -> Placement {
        let tuning = world.config.tuning.spiral.clone();
        if stack.pieces.len() < 2 || !stack.settle_active() {
            return Placement::Ignored;
        }
        let n = stack.pieces.len();
        let previous_position = stack.pieces[n - 2].position;
        let current = &stack.pieces[n - 1];

        let spiral_angle = match current.motion {
            Motion::Spiral { angle, .. } => angle,
            _ => 0.0,
        };
        let distance = center_distance(current.position, previous_position);
        let max_distance = Vec2::new(current.width, current.depth).length() / 2.0;

        if distance > max_distance * tuning.miss_ratio {
            if let Some(missed) = stack.pieces.pop() {
                let linvel = Vec3::new(
                    spiral_angle.cos() * tuning.miss_push,
                    -3.0,
                    spiral_angle.sin() * tuning.miss_push,
                );
                world.release(
                    missed.entity.mesh,
                    Launch::new(tuning.miss_mass, linvel).spinning(Vec3::Y * 5.0),
                );
            }
            log::debug!("Spiral miss at level {} (distance {:.2})", n - 1, distance);
            return Placement::Missed;
        }

        let ratio = 1.0 - distance / max_distance;
        let mut debris = 0;
        let current = &mut stack.pieces[n - 1];

        if ratio < tuning.trim_ratio {
            let keep = 0.5 + 0.5 * ratio;
            let (old_width, old_depth) = (current.width, current.depth);
            current.width = old_width * keep;
            current.depth = old_depth * keep;
            current.position.x = previous_position.x;
            current.position.z = previous_position.z;
            current.rotation = 0.0;
            world.scene.set_geometry(
                current.entity.mesh,
                create_box(current.width, current.depth, PIECE_HEIGHT),
            );
            world.scene.set_transform(current.entity.mesh, current.transform());

            let color = world.color_of(current.entity.mesh);
            let count = tuning.fragment_count.max(1);
            let fragment = create_box(
                (old_width - current.width) / 2.0,
                (old_depth - current.depth) / 2.0,
                PIECE_HEIGHT,
            );
            for i in 0..count {
                let angle = i as f32 / count as f32 * TAU + spiral_angle;
                let (cos, sin) = (angle.cos(), angle.sin());
                let position = current.position
                    + Vec3::new(cos * current.width / 2.0, 0.0, sin * current.depth / 2.0);
                let linvel = Vec3::new(cos * tuning.fragment_push, -2.0, sin * tuning.fragment_push);
                let angvel = Vec3::new(world.jitter(5.0), 10.0, world.jitter(5.0));
                world.spawn_debris(
                    fragment.clone(),
                    Transform::at(position),
                    color,
                    Launch::new(tuning.fragment_mass, linvel).spinning(angvel),
                );
                debris += 1;
            }
        }

        Placement::Landed {
            points: score_points(tuning.score_weight, ratio),
            debris,
            topple: current.width < tuning.min_size || current.depth < tuning.min_size,
        }
    }
}
