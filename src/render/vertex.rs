//! Vertex types for 3D piece meshes

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Mesh vertex with position and face normal
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    pub fn from_vec3(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Colors for game elements
pub mod colors {
    /// Amber used by the ring base and physics rings
    pub const RING_AMBER: [f32; 4] = [1.0, 0.667, 0.0, 1.0];
    pub const GROUND: [f32; 4] = [0.04, 0.04, 0.04, 0.8];

    /// HSL to linear RGBA (h, s, l in 0..1)
    pub fn hsl(h: f32, s: f32, l: f32) -> [f32; 4] {
        let h = h.rem_euclid(1.0);
        if s <= 0.0 {
            return [l, l, l, 1.0];
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        [
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
            1.0,
        ]
    }

    fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }
}
