//! Falling debris
//!
//! Missed elements and trimmed-off fragments live here until they drop below
//! the cull depth.

use anyhow::Context;
use glam::Vec3;

use crate::physics::{BodyHandle, PhysicsWorld, Pose};
use crate::render::{MeshHandle, RenderScene, Transform};

/// Initial dynamics for a body handed to physics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub mass: f32,
    pub linvel: Vec3,
    pub angvel: Vec3,
}

impl Launch {
    pub fn new(mass: f32, linvel: Vec3) -> Self {
        Self {
            mass,
            linvel,
            angvel: Vec3::ZERO,
        }
    }

    pub fn spinning(mut self, angvel: Vec3) -> Self {
        self.angvel = angvel;
        self
    }
}

/// Mesh transform for a body pose, undoing the body's local offset
pub fn mesh_transform(pose: Pose, offset: Vec3) -> Transform {
    Transform {
        position: pose.position - pose.rotation * offset,
        rotation: pose.rotation,
    }
}

/// A mesh driven entirely by physics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingPiece {
    pub mesh: MeshHandle,
    pub body: BodyHandle,
    pub offset: Vec3,
}

#[derive(Debug, Default)]
pub struct FallingPieces {
    pieces: Vec<FallingPiece>,
}

impl FallingPieces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, piece: FallingPiece) {
        self.pieces.push(piece);
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &FallingPiece> {
        self.pieces.iter()
    }

    /// Copy body poses onto meshes and destroy pieces below `cull_depth`
    ///
    /// Returns the number of pieces removed.
    pub fn sync_and_cull(
        &mut self,
        scene: &mut RenderScene,
        physics: &mut PhysicsWorld,
        cull_depth: f32,
    ) -> anyhow::Result<usize> {
        let mut culled = 0;
        let mut kept = Vec::with_capacity(self.pieces.len());

        for piece in self.pieces.drain(..) {
            let pose = physics
                .pose(piece.body)
                .with_context(|| format!("falling piece {:?} lost its body", piece.mesh))?;

            if pose.position.y < cull_depth {
                scene.remove(piece.mesh);
                physics.remove_body(piece.body);
                culled += 1;
                continue;
            }

            scene.set_transform(piece.mesh, mesh_transform(pose, piece.offset));
            kept.push(piece);
        }

        self.pieces = kept;
        if culled > 0 {
            log::debug!("Culled {} falling piece(s), {} left", culled, self.pieces.len());
        }
        Ok(culled)
    }

    /// Release every piece from the scene and the physics world
    pub fn clear(&mut self, scene: &mut RenderScene, physics: &mut PhysicsWorld) {
        for piece in self.pieces.drain(..) {
            scene.remove(piece.mesh);
            physics.remove_body(piece.body);
        }
    }
}
