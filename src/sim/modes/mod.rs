//! Per-mode movement and placement rules
//!
//! Each mode is a stateless strategy; all run state lives in the [`Stack`] and
//! the [`World`] passed in by the engine.

pub mod classic;
pub mod ring;
pub mod spiral_drop;
pub mod swing_arc;

use super::state::{GameMode, Stack};
use super::world::World;
use crate::consts::SIM_DT;

/// How a run opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opening {
    /// The first active element is already in the stack
    Spawned,
    /// The first active element arrives after a delay
    Deferred { delay_ms: u32 },
}

/// Result of evaluating the active element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Nothing was in motion
    Ignored,
    /// The element stays on the tower
    Landed {
        points: u32,
        /// Fragments cut off and dropped
        debris: usize,
        /// The remaining element is too small to continue
        topple: bool,
    },
    /// The element fell off the tower
    Missed,
}

pub trait ModeStrategy: Sync {
    /// Build the opening element(s) of an empty stack
    fn begin_run(&self, stack: &mut Stack, world: &mut World) -> Opening {
        self.spawn_next(stack, world);
        Opening::Spawned
    }

    /// Push a new active element on top of the stack
    fn spawn_next(&self, stack: &mut Stack, world: &mut World);

    /// Move the active element by one step of `dt` seconds
    fn advance(&self, stack: &mut Stack, world: &mut World, dt: f32);

    /// Stop the active element and judge it against the one below
    fn evaluate_placement(&self, stack: &mut Stack, world: &mut World) -> Placement;
}

impl GameMode {
    pub fn strategy(self) -> &'static dyn ModeStrategy {
        match self {
            GameMode::Classic => &classic::Classic,
            GameMode::Physics => &ring::RingStack,
            GameMode::SwingArc => &swing_arc::SwingArc,
            GameMode::SpiralDrop => &spiral_drop::SpiralDrop,
        }
    }
}

/// Kinematic constants are per 60 Hz tick; scale them to `dt`
#[inline]
pub(crate) fn ticks(dt: f32) -> f32 {
    dt / SIM_DT
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::EngineConfig;
    use crate::sim::state::Stack;
    use crate::sim::world::World;

    pub fn setup(seed: u64) -> (Stack, World) {
        (Stack::default(), World::new(EngineConfig::with_seed(seed)))
    }
}
