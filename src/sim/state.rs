//! Game state and core simulation types
//!
//! Stacks hold the placed elements of the current run plus at most one active
//! element on top.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::physics::BodyHandle;
use crate::render::{MeshHandle, Transform};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    /// Waiting for the start action
    Ready,
    /// Elements spawning and being placed
    Playing,
    /// Run ended
    Over,
}

/// Movement and placement rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameMode {
    #[default]
    Classic,
    /// C-rings spinning over a static base
    Physics,
    SwingArc,
    SpiralDrop,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Classic,
        GameMode::Physics,
        GameMode::SwingArc,
        GameMode::SpiralDrop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Physics => "physics",
            GameMode::SwingArc => "swingArc",
            GameMode::SpiralDrop => "spiralDrop",
        }
    }

    /// Parse a mode name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(name))
    }
}

/// Horizontal axis a classic block slides along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Z => Vec3::Z,
        }
    }

    pub fn get(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Z => v.z,
        }
    }

    pub fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Z => v.z = value,
        }
    }
}

/// Kinematic state of a block element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Not moving (first element of a run)
    Still,
    /// Classic: back and forth along one axis
    Slide {
        axis: Axis,
        /// +1 or -1
        direction: f32,
        speed: f32,
    },
    /// Swing arc: yaw = sin(angle) * amplitude
    Swing { angle: f32, amplitude: f32, speed: f32 },
    /// Spiral drop: orbit the center while descending to target_y
    Spiral {
        angle: f32,
        drop_speed: f32,
        target_y: f32,
    },
}

impl Motion {
    /// Swing phase angle (zero for everything else)
    pub fn phase_angle(&self) -> f32 {
        match self {
            Motion::Swing { angle, .. } => *angle,
            _ => 0.0,
        }
    }
}

/// Physics body attached to a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attachment {
    pub body: BodyHandle,
    /// Body center in the mesh's local frame
    pub offset: Vec3,
}

/// Render handle plus optional physics body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub mesh: MeshHandle,
    pub body: Option<Attachment>,
}

impl Entity {
    pub fn visual(mesh: MeshHandle) -> Self {
        Self { mesh, body: None }
    }
}

/// A block or arc element of the stack
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub entity: Entity,
    pub width: f32,
    pub depth: f32,
    pub position: Vec3,
    /// Rotation about the vertical axis
    pub rotation: f32,
    pub motion: Motion,
    pub is_moving: bool,
}

impl Piece {
    pub fn transform(&self) -> Transform {
        Transform::at_yaw(self.position, self.rotation)
    }
}

/// A C-ring element (physics mode)
#[derive(Debug, Clone, PartialEq)]
pub struct RingPiece {
    pub entity: Entity,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub arc_start: f32,
    pub arc_end: f32,
    /// Rotation about the vertical axis
    pub angle: f32,
    pub height: f32,
    pub position: Vec3,
    pub is_moving: bool,
}

impl RingPiece {
    pub fn arc_length(&self) -> f32 {
        self.arc_end - self.arc_start
    }

    pub fn transform(&self) -> Transform {
        Transform::at_yaw(self.position, self.angle)
    }
}

/// Elements of the current run, bottom first
#[derive(Debug, Clone, Default)]
pub struct Stack {
    pub pieces: Vec<Piece>,
    pub rings: Vec<RingPiece>,
}

impl Stack {
    pub fn len(&self) -> usize {
        self.pieces.len() + self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn active_piece(&self) -> Option<&Piece> {
        self.pieces.last().filter(|p| p.is_moving)
    }

    pub fn active_piece_mut(&mut self) -> Option<&mut Piece> {
        self.pieces.last_mut().filter(|p| p.is_moving)
    }

    pub fn active_ring_mut(&mut self) -> Option<&mut RingPiece> {
        self.rings.last_mut().filter(|r| r.is_moving)
    }

    /// Whether an element is waiting for a placement decision
    pub fn has_active(&self) -> bool {
        self.active_piece().is_some() || self.rings.last().is_some_and(|r| r.is_moving)
    }

    /// Stop the active element; returns false when nothing was moving
    pub fn settle_active(&mut self) -> bool {
        if let Some(piece) = self.active_piece_mut() {
            piece.is_moving = false;
            return true;
        }
        if let Some(ring) = self.active_ring_mut() {
            ring.is_moving = false;
            return true;
        }
        false
    }

    /// Every entity in the stack
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.pieces
            .iter()
            .map(|p| p.entity)
            .chain(self.rings.iter().map(|r| r.entity))
    }

    pub fn clear(&mut self) {
        self.pieces.clear();
        self.rings.clear();
    }
}

/// Read model for an external HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HudSnapshot {
    pub score: u32,
    pub tower_height: u32,
    pub phase: GamePhase,
    pub mode: GameMode,
}
