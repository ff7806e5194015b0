//! Tower Stack - an arcade stacking game engine
//!
//! Core modules:
//! - `geometry`: Parametric piece shapes (box, ring sector, arc) and meshes
//! - `physics`: Rigid-body world and bounding-box body factory
//! - `render`: Engine-owned render scene read by an external renderer
//! - `sim`: Deterministic game simulation (modes, falling debris, state machine)
//! - `config`: Data-driven engine and per-mode tuning

pub mod config;
pub mod geometry;
pub mod physics;
pub mod render;
pub mod sim;

pub use config::{EngineConfig, ModeTuning};
pub use sim::{Engine, GameMode, GamePhase, HudSnapshot, LoopControl};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// World gravity along Y (units/s²)
    pub const GRAVITY: f32 = -30.0;
    /// Falling pieces below this height are destroyed
    pub const CULL_DEPTH: f32 = -50.0;
    /// Half extent of the static ground slab
    pub const GROUND_HALF_EXTENT: f32 = 50.0;

    /// Contact material shared by every piece body
    pub const BODY_FRICTION: f32 = 0.4;
    pub const BODY_RESTITUTION: f32 = 0.3;

    /// Vertical extent of every stacked element
    pub const PIECE_HEIGHT: f32 = 2.0;

    /// Delay between a successful placement and the next spawn
    pub const SETTLE_DELAY_MS: u32 = 200;
    /// Delay between the ring base and the first moving ring
    pub const BASE_SPAWN_DELAY_MS: u32 = 100;

    /// Score awarded for the first element of a run
    pub const FIRST_PLACEMENT_SCORE: u32 = 10;

    /// Segment counts for curved profiles
    pub const RING_SEGMENTS: usize = 24;
    pub const ARC_SEGMENTS: usize = 20;
}

/// Shorter arc between two angles, always in [0, π]
#[inline]
pub fn angular_distance(a: f32, b: f32) -> f32 {
    use std::f32::consts::TAU;
    let folded = (a - b).abs().rem_euclid(TAU);
    folded.min(TAU - folded)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Floor a non-negative score contribution
#[inline]
pub fn score_points(weight: f32, ratio: f32) -> u32 {
    (weight * ratio).floor().max(0.0) as u32
}
