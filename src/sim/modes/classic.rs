//! Classic mode: blocks slide along alternating axes and are trimmed to the
//! overlap with the block below.

use glam::Vec3;

use super::{ModeStrategy, Placement, ticks};
use crate::consts::PIECE_HEIGHT;
use crate::geometry::create_box;
use crate::render::Transform;
use crate::render::vertex::colors;
use crate::score_points;
use crate::sim::falling::Launch;
use crate::sim::state::{Axis, Entity, Motion, Piece, Stack};
use crate::sim::world::World;

pub struct Classic;

/// Odd levels slide along X, even levels along Z
pub fn axis_for_level(index: usize) -> Axis {
    if index % 2 == 1 { Axis::X } else { Axis::Z }
}

fn extent(piece: &Piece, axis: Axis) -> f32 {
    match axis {
        Axis::X => piece.width,
        Axis::Z => piece.depth,
    }
}

fn set_extent(piece: &mut Piece, axis: Axis, value: f32) {
    match axis {
        Axis::X => piece.width = value,
        Axis::Z => piece.depth = value,
    }
}

/// Overlap of the current block with the previous one along `axis`
pub fn axis_overlap(current: &Piece, previous: &Piece, axis: Axis) -> f32 {
    extent(previous, axis) - (axis.get(current.position) - axis.get(previous.position)).abs()
}

impl ModeStrategy for Classic {
    fn spawn_next(&self, stack: &mut Stack, world: &mut World) {
        let tuning = world.config.tuning.classic.clone();
        let index = stack.pieces.len();
        let axis = axis_for_level(index);

        let (width, depth, mut position) = match stack.pieces.last() {
            Some(last) => (last.width, last.depth, last.position),
            None => (tuning.start_size, tuning.start_size, Vec3::ZERO),
        };
        position.y = index as f32 * tuning.tier_spacing;

        let motion = if index == 0 {
            Motion::Still
        } else {
            let side = world.coin();
            axis.set(&mut position, side * tuning.travel_limit);
            Motion::Slide {
                axis,
                direction: world.coin(),
                speed: tuning.base_speed + tuning.speed_per_level * index as f32,
            }
        };

        let color = colors::hsl((index as f32 * 0.1) % 1.0, 0.7, 0.5);
        let piece = Piece {
            entity: Entity::visual(world.add_mesh(
                create_box(width, depth, PIECE_HEIGHT),
                Transform::at(position),
                color,
            )),
            width,
            depth,
            position,
            rotation: 0.0,
            motion,
            is_moving: true,
        };
        stack.pieces.push(piece);
    }

    fn advance(&self, stack: &mut Stack, world: &mut World, dt: f32) {
        let limit = world.config.tuning.classic.travel_limit;
        let Some(piece) = stack.active_piece_mut() else {
            return;
        };
        let Motion::Slide {
            axis,
            direction,
            speed,
        } = piece.motion
        else {
            return;
        };

        let along = axis.get(piece.position) + direction * speed * ticks(dt);
        axis.set(&mut piece.position, along);
        if along.abs() > limit {
            piece.motion = Motion::Slide {
                axis,
                direction: -direction,
                speed,
            };
        }
        world.scene.set_transform(piece.entity.mesh, piece.transform());
    }

    fn evaluate_placement(&self, stack: &mut Stack, world: &mut World) -> Placement {
        let tuning = world.config.tuning.classic.clone();
        if stack.pieces.len() < 2 || !stack.settle_active() {
            return Placement::Ignored;
        }
        let n = stack.pieces.len();
        let previous = stack.pieces[n - 2].clone();
        let current = &stack.pieces[n - 1];

        let (axis, direction, speed) = match current.motion {
            Motion::Slide {
                axis,
                direction,
                speed,
            } => (axis, direction, speed),
            _ => (axis_for_level(n - 1), 0.0, 0.0),
        };
        let overlap = axis_overlap(current, &previous, axis);

        if overlap <= tuning.miss_overlap {
            if let Some(missed) = stack.pieces.pop() {
                let linvel = axis.unit() * direction * speed * tuning.miss_push + Vec3::NEG_Y * 2.0;
                world.release(missed.entity.mesh, Launch::new(tuning.miss_mass, linvel));
            }
            log::debug!("Classic miss at level {} (overlap {:.2})", n - 1, overlap);
            return Placement::Missed;
        }

        let current = &mut stack.pieces[n - 1];
        let size = extent(current, axis);
        let cut = size - overlap;
        let mut debris = 0;

        if cut > tuning.cut_epsilon {
            let center = axis.get(current.position);
            let prev_center = axis.get(previous.position);
            let prev_half = extent(&previous, axis) / 2.0;
            let lo = (center - size / 2.0).max(prev_center - prev_half);
            let hi = (center + size / 2.0).min(prev_center + prev_half);

            // Slice hanging past the previous block's edge
            let cut_center = if center > prev_center {
                hi + cut / 2.0
            } else {
                lo - cut / 2.0
            };
            let mut cut_position = current.position;
            axis.set(&mut cut_position, cut_center);
            let (cut_width, cut_depth) = match axis {
                Axis::X => (cut, current.depth),
                Axis::Z => (current.width, cut),
            };
            let color = world.color_of(current.entity.mesh);
            let sideways = match axis {
                Axis::X => Vec3::new(0.0, 0.0, world.jitter(0.5)),
                Axis::Z => Vec3::new(world.jitter(0.5), 0.0, 0.0),
            };
            let linvel = axis.unit() * direction * speed * tuning.cut_push + sideways + Vec3::NEG_Y;
            world.spawn_debris(
                create_box(cut_width, cut_depth, PIECE_HEIGHT),
                Transform::at(cut_position),
                color,
                Launch::new(tuning.cut_mass, linvel),
            );
            debris = 1;

            set_extent(current, axis, overlap);
            axis.set(&mut current.position, (lo + hi) / 2.0);
            world.scene.set_geometry(
                current.entity.mesh,
                create_box(current.width, current.depth, PIECE_HEIGHT),
            );
            world.scene.set_transform(current.entity.mesh, current.transform());
        }

        let points = score_points(tuning.score_weight, overlap / extent(&previous, axis));
        Placement::Landed {
            points,
            debris,
            topple: overlap < tuning.min_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::modes::test_support::setup;
    use proptest::prelude::*;

    fn place_at(stack: &mut Stack, along: f32) {
        let piece = stack.pieces.last_mut().expect("active piece");
        if let Motion::Slide { axis, .. } = piece.motion {
            axis.set(&mut piece.position, along);
        }
    }

    #[test]
    fn test_first_block_is_still_at_origin() {
        let (mut stack, mut world) = setup(1);
        Classic.spawn_next(&mut stack, &mut world);
        let first = &stack.pieces[0];
        assert_eq!(first.motion, Motion::Still);
        assert!(first.is_moving);
        assert_eq!(first.position, Vec3::ZERO);
        assert_eq!((first.width, first.depth), (10.0, 10.0));
    }

    #[test]
    fn test_second_block_starts_at_travel_limit() {
        let (mut stack, mut world) = setup(2);
        Classic.spawn_next(&mut stack, &mut world);
        stack.settle_active();
        Classic.spawn_next(&mut stack, &mut world);

        let second = &stack.pieces[1];
        assert!((second.position.x.abs() - 12.0).abs() < 1e-6);
        assert!((second.position.y - 2.1).abs() < 1e-6);
        let Motion::Slide { axis, speed, .. } = second.motion else {
            panic!("second block must slide");
        };
        assert_eq!(axis, Axis::X);
        assert!((speed - 0.105).abs() < 1e-6);
    }

    #[test]
    fn test_slide_reverses_past_limit() {
        let (mut stack, mut world) = setup(3);
        Classic.spawn_next(&mut stack, &mut world);
        stack.settle_active();
        Classic.spawn_next(&mut stack, &mut world);
        {
            let piece = stack.pieces.last_mut().expect("active piece");
            piece.position.x = 11.95;
            piece.motion = Motion::Slide {
                axis: Axis::X,
                direction: 1.0,
                speed: 0.1,
            };
        }

        Classic.advance(&mut stack, &mut world, crate::consts::SIM_DT);
        let piece = &stack.pieces[1];
        assert!((piece.position.x - 12.05).abs() < 1e-4);
        assert!(matches!(piece.motion, Motion::Slide { direction, .. } if direction < 0.0));

        Classic.advance(&mut stack, &mut world, crate::consts::SIM_DT);
        assert!(stack.pieces[1].position.x < 12.05);
    }

    #[test]
    fn test_exact_width_offset_is_a_miss() {
        let (mut stack, mut world) = setup(4);
        Classic.spawn_next(&mut stack, &mut world);
        stack.settle_active();
        Classic.spawn_next(&mut stack, &mut world);
        place_at(&mut stack, 10.0);

        assert_eq!(Classic.evaluate_placement(&mut stack, &mut world), Placement::Missed);
        assert_eq!(stack.pieces.len(), 1);
        assert_eq!(world.falling.len(), 1);
    }

    #[test]
    fn test_partial_overlap_trims_and_drops_slice() {
        let (mut stack, mut world) = setup(5);
        Classic.spawn_next(&mut stack, &mut world);
        stack.settle_active();
        Classic.spawn_next(&mut stack, &mut world);
        place_at(&mut stack, 3.0);

        let placement = Classic.evaluate_placement(&mut stack, &mut world);
        assert_eq!(
            placement,
            Placement::Landed {
                points: 7,
                debris: 1,
                topple: false
            }
        );
        let kept = &stack.pieces[1];
        assert!((kept.width - 7.0).abs() < 1e-5);
        assert_eq!(kept.depth, 10.0);
        // Kept part spans [-2, 5]
        assert!((kept.position.x - 1.5).abs() < 1e-5);
        assert!(!kept.is_moving);
        assert_eq!(world.falling.len(), 1);
    }

    #[test]
    fn test_negative_side_cut() {
        let (mut stack, mut world) = setup(6);
        Classic.spawn_next(&mut stack, &mut world);
        stack.settle_active();
        Classic.spawn_next(&mut stack, &mut world);
        place_at(&mut stack, -9.5);

        let placement = Classic.evaluate_placement(&mut stack, &mut world);
        assert_eq!(
            placement,
            Placement::Landed {
                points: 0,
                debris: 1,
                topple: true
            }
        );
        let kept = &stack.pieces[1];
        assert!((kept.width - 0.5).abs() < 1e-5);
        assert!((kept.position.x + 4.75).abs() < 1e-5);
    }

    #[test]
    fn test_tiny_cut_is_absorbed() {
        let (mut stack, mut world) = setup(7);
        Classic.spawn_next(&mut stack, &mut world);
        stack.settle_active();
        Classic.spawn_next(&mut stack, &mut world);
        place_at(&mut stack, 0.05);

        let placement = Classic.evaluate_placement(&mut stack, &mut world);
        assert_eq!(
            placement,
            Placement::Landed {
                points: 9,
                debris: 0,
                topple: false
            }
        );
        assert_eq!(stack.pieces[1].width, 10.0);
        assert!(world.falling.is_empty());
    }

    #[test]
    fn test_perfect_stack_scores_full_weight() {
        let (mut stack, mut world) = setup(8);
        Classic.spawn_next(&mut stack, &mut world);
        stack.settle_active();
        for _ in 0..5 {
            Classic.spawn_next(&mut stack, &mut world);
            place_at(&mut stack, 0.0);
            let placement = Classic.evaluate_placement(&mut stack, &mut world);
            assert!(matches!(placement, Placement::Landed { points: 10, debris: 0, topple: false }));
        }
        assert_eq!(stack.pieces.len(), 6);
        // Even levels slide along Z
        assert!(matches!(stack.pieces[2].motion, Motion::Slide { axis: Axis::Z, .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn placement_never_grows_the_block(offset in -20.0f32..20.0) {
            let (mut stack, mut world) = setup(9);
            Classic.spawn_next(&mut stack, &mut world);
            stack.settle_active();
            Classic.spawn_next(&mut stack, &mut world);
            place_at(&mut stack, offset);

            match Classic.evaluate_placement(&mut stack, &mut world) {
                Placement::Missed => {
                    prop_assert!(offset.abs() >= 10.0 - 1e-4);
                    prop_assert_eq!(stack.pieces.len(), 1);
                }
                Placement::Landed { points, .. } => {
                    let kept = &stack.pieces[1];
                    prop_assert!(kept.width <= 10.0 + 1e-5);
                    prop_assert!(kept.width > 0.0);
                    prop_assert_eq!(kept.depth, 10.0);
                    prop_assert!(points <= 10);
                }
                Placement::Ignored => prop_assert!(false, "active block was ignored"),
            }
        }
    }
}
