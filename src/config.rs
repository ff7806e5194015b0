//! Engine configuration and per-mode tuning
//!
//! Every threshold the placement rules use is a named value here. The modes do
//! not share one general miss rule, so each keeps its own.

use std::f32::consts::PI;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::consts;

/// Classic sliding-block tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassicTuning {
    /// Width and depth of the first block
    pub start_size: f32,
    pub tier_spacing: f32,
    /// Blocks reverse once they pass this distance from the center
    pub travel_limit: f32,
    pub base_speed: f32,
    pub speed_per_level: f32,
    /// Overlap at or below this is a miss
    pub miss_overlap: f32,
    /// Placed blocks narrower than this end the run
    pub min_size: f32,
    /// Cuts thinner than this are absorbed instead of dropped
    pub cut_epsilon: f32,
    pub score_weight: f32,
    pub miss_mass: f32,
    pub cut_mass: f32,
    /// Velocity multiplier applied to a missed block along its axis
    pub miss_push: f32,
    /// Velocity multiplier applied to a cut-off slice along its axis
    pub cut_push: f32,
}

impl Default for ClassicTuning {
    fn default() -> Self {
        Self {
            start_size: 10.0,
            tier_spacing: 2.1,
            travel_limit: 12.0,
            base_speed: 0.1,
            speed_per_level: 0.005,
            miss_overlap: 0.0,
            min_size: 1.0,
            cut_epsilon: 0.1,
            score_weight: 10.0,
            miss_mass: 5.0,
            cut_mass: 3.0,
            miss_push: 3.0,
            cut_push: 5.0,
        }
    }
}

/// Physics C-ring tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingTuning {
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Angular length of the base ring
    pub arc_length: f32,
    pub base_angle: f32,
    pub base_y: f32,
    pub tier_spacing: f32,
    pub spin_speed: f32,
    /// Overlap below this fraction of the arc is a miss
    pub miss_ratio: f32,
    /// Overlap below this fraction of the arc trims the ring
    pub trim_ratio: f32,
    /// Rings shorter than this many radians end the run
    pub min_arc: f32,
    /// Trimmed arcs shorter than this are absorbed instead of dropped
    pub min_wedge_arc: f32,
    pub score_weight: f32,
    pub miss_mass: f32,
    pub wedge_mass: f32,
    pub wedge_push: f32,
}

impl Default for RingTuning {
    fn default() -> Self {
        Self {
            inner_radius: 3.0,
            outer_radius: 7.0,
            arc_length: PI * 1.8,
            base_angle: PI,
            base_y: 1.0,
            tier_spacing: 2.2,
            spin_speed: 0.02,
            miss_ratio: 0.1,
            trim_ratio: 0.95,
            min_arc: 0.5,
            min_wedge_arc: 0.2,
            score_weight: 15.0,
            miss_mass: 8.0,
            wedge_mass: 3.0,
            wedge_push: 8.0,
        }
    }
}

/// Swinging arc tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingTuning {
    pub max_radius: f32,
    pub thickness: f32,
    pub arc_angle: f32,
    pub tier_spacing: f32,
    pub amplitude: f32,
    pub base_speed: f32,
    pub speed_per_level: f32,
    /// Overlap at or below this fraction of the maximum is a miss
    pub miss_ratio: f32,
    /// Overlap below this fraction of the current width trims the arc
    pub trim_ratio: f32,
    pub min_width: f32,
    pub score_weight: f32,
    pub miss_mass: f32,
    /// Lateral speed of a missed arc per unit of sin(phase)
    pub miss_push: f32,
    pub fragment_mass: f32,
    pub fragment_push: f32,
}

impl Default for SwingTuning {
    fn default() -> Self {
        Self {
            max_radius: 8.0,
            thickness: 3.0,
            arc_angle: PI * 0.6,
            tier_spacing: 2.2,
            amplitude: PI * 0.4,
            base_speed: 0.02,
            speed_per_level: 0.002,
            miss_ratio: 0.1,
            trim_ratio: 0.9,
            min_width: 2.0,
            score_weight: 15.0,
            miss_mass: 5.0,
            miss_push: 10.0,
            fragment_mass: 2.0,
            fragment_push: 8.0,
        }
    }
}

/// Spiral drop tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralTuning {
    pub start_size: f32,
    pub tier_spacing: f32,
    /// Spawn height above the target tier
    pub drop_height: f32,
    pub orbit_radius: f32,
    pub spin_speed: f32,
    pub drop_speed: f32,
    /// Center distance above this fraction of the half-diagonal is a miss
    pub miss_ratio: f32,
    /// Overlap ratio below this trims the block
    pub trim_ratio: f32,
    pub min_size: f32,
    pub score_weight: f32,
    pub miss_mass: f32,
    pub miss_push: f32,
    pub fragment_mass: f32,
    pub fragment_push: f32,
    pub fragment_count: usize,
}

impl Default for SpiralTuning {
    fn default() -> Self {
        Self {
            start_size: 10.0,
            tier_spacing: 2.1,
            drop_height: 15.0,
            orbit_radius: 3.0,
            spin_speed: 0.05,
            drop_speed: 0.15,
            miss_ratio: 0.9,
            trim_ratio: 0.9,
            min_size: 2.0,
            score_weight: 20.0,
            miss_mass: 5.0,
            miss_push: 5.0,
            fragment_mass: 2.0,
            fragment_push: 10.0,
            fragment_count: 4,
        }
    }
}

/// Tuning for all four modes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTuning {
    pub classic: ClassicTuning,
    pub ring: RingTuning,
    pub swing: SwingTuning,
    pub spiral: SpiralTuning,
}

/// Engine-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for spawn sides, ring angles and debris jitter
    pub seed: u64,
    pub fixed_dt: f32,
    pub max_substeps: u32,
    pub gravity: f32,
    pub cull_depth: f32,
    /// Half extent of the ground slab; zero or less disables it
    pub ground_half_extent: f32,
    pub settle_delay_ms: u32,
    pub base_spawn_delay_ms: u32,
    pub tuning: ModeTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_70e4,
            fixed_dt: consts::SIM_DT,
            max_substeps: consts::MAX_SUBSTEPS,
            gravity: consts::GRAVITY,
            cull_depth: consts::CULL_DEPTH,
            ground_half_extent: consts::GROUND_HALF_EXTENT,
            settle_delay_ms: consts::SETTLE_DELAY_MS,
            base_spawn_delay_ms: consts::BASE_SPAWN_DELAY_MS,
            tuning: ModeTuning::default(),
        }
    }
}

impl EngineConfig {
    /// Same defaults with a different seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid engine config JSON")?;
        anyhow::ensure!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive, got {}",
            config.fixed_dt
        );
        anyhow::ensure!(config.max_substeps > 0, "max_substeps must be at least 1");
        Ok(config)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize engine config")
    }

    /// Load from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let loaded = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))
            .and_then(|json| Self::from_json(&json));

        match loaded {
            Ok(config) => {
                log::info!("Loaded engine config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Using default engine config: {:#}", e);
                Self::default()
            }
        }
    }

    /// Simulation ticks covering `ms` milliseconds (at least one)
    pub fn ticks_for_ms(&self, ms: u32) -> u64 {
        let ticks = (ms as f32 / 1000.0 / self.fixed_dt).round() as u64;
        ticks.max(1)
    }
}
