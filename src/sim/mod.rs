//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Timed events counted in ticks, never wall-clock timers

pub mod engine;
pub mod falling;
pub mod modes;
pub mod state;
pub mod timer;
pub mod world;

pub use engine::{Engine, LoopControl};
pub use falling::{FallingPiece, FallingPieces, Launch};
pub use modes::{ModeStrategy, Opening, Placement};
pub use state::{
    Attachment, Axis, Entity, GameMode, GamePhase, HudSnapshot, Motion, Piece, RingPiece, Stack,
};
pub use timer::{TimedEvent, TimerQueue};
pub use world::World;
