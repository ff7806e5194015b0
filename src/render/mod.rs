//! Render scene owned by the engine
//!
//! The engine is the only writer. An external renderer receives a read-only
//! view each frame through [`Renderer::submit`].

pub mod vertex;

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;

/// Stable identifier for a mesh in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// World transform of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Position with a rotation about the vertical axis
    pub fn at_yaw(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw),
        }
    }

    /// Map a local point into world space
    pub fn apply(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// A renderable piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub geometry: Geometry,
    pub transform: Transform,
    pub color: [f32; 4],
}

/// All meshes currently in the scene, iterated in handle order
#[derive(Debug, Default)]
pub struct RenderScene {
    meshes: BTreeMap<MeshHandle, Mesh>,
    next_id: u32,
}

impl RenderScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, geometry: Geometry, transform: Transform, color: [f32; 4]) -> MeshHandle {
        let handle = MeshHandle(self.next_id);
        self.next_id += 1;
        self.meshes.insert(
            handle,
            Mesh {
                geometry,
                transform,
                color,
            },
        );
        handle
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(&handle)
    }

    pub fn remove(&mut self, handle: MeshHandle) -> Option<Mesh> {
        self.meshes.remove(&handle)
    }

    /// Replace a mesh's geometry in place (trimmed pieces keep their handle)
    pub fn set_geometry(&mut self, handle: MeshHandle, geometry: Geometry) -> bool {
        match self.meshes.get_mut(&handle) {
            Some(mesh) => {
                mesh.geometry = geometry;
                true
            }
            None => false,
        }
    }

    pub fn set_transform(&mut self, handle: MeshHandle, transform: Transform) -> bool {
        match self.meshes.get_mut(&handle) {
            Some(mesh) => {
                mesh.transform = transform;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshHandle, &Mesh)> {
        self.meshes.iter().map(|(h, m)| (*h, m))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

/// External render backend
pub trait Renderer {
    /// Draw the scene; an error is fatal for the session
    fn submit(&mut self, scene: &RenderScene) -> anyhow::Result<()>;
}

/// Renderer that draws nothing (headless runs and tests)
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames: u64,
}

impl Renderer for NullRenderer {
    fn submit(&mut self, _scene: &RenderScene) -> anyhow::Result<()> {
        self.frames += 1;
        Ok(())
    }
}
