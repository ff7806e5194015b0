//! Parametric piece geometry
//!
//! Every shape is described in a local frame whose origin sits at the vertical
//! center of the piece. Curved shapes are built as a flat profile in the XY
//! plane and extruded along Y; a profile point (x, y) lands at world (x, ·, -y),
//! so profile angles add directly to a rotation about the vertical axis.

pub mod arc;
pub mod mesh;

pub use arc::ArcBand;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::{ARC_SEGMENTS, RING_SEGMENTS};
use crate::render::vertex::Vertex;

/// Map a profile-plane point to the local 3D frame at height `y`
#[inline]
pub fn profile_to_world(p: Vec2, y: f32) -> Vec3 {
    Vec3::new(p.x, y, -p.y)
}

/// Horizontal unit vector for a profile-plane angle
#[inline]
pub fn planar_direction(angle: f32) -> Vec3 {
    profile_to_world(crate::polar_to_cartesian(1.0, angle), 0.0)
}

/// Axis-aligned bounding box in local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, p: Vec3, tolerance: f32) -> bool {
        p.cmpge(self.min - Vec3::splat(tolerance)).all()
            && p.cmple(self.max + Vec3::splat(tolerance)).all()
    }
}

/// An extruded band (C-ring or swing arc)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extrusion {
    pub band: ArcBand,
    pub height: f32,
    pub segments: usize,
    /// Closed profile: outer edge forward then inner edge back
    pub profile: Vec<Vec2>,
}

/// Geometry descriptor handed to the renderer and the body factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Box { width: f32, depth: f32, height: f32 },
    Band(Extrusion),
}

/// Axis-aligned rectangular prism
pub fn create_box(width: f32, depth: f32, height: f32) -> Geometry {
    Geometry::Box {
        width,
        depth,
        height,
    }
}

/// Annulus sector from `arc_start` to `arc_end`, extruded by `height`
pub fn create_ring(
    inner_radius: f32,
    outer_radius: f32,
    height: f32,
    arc_start: f32,
    arc_end: f32,
) -> Geometry {
    let band = ArcBand::new(inner_radius, outer_radius, arc_start, arc_end);
    extrude(band, height, RING_SEGMENTS)
}

/// Arc of outer `radius` and radial `thickness`, swept over ±arc_angle/2
pub fn create_arc(radius: f32, thickness: f32, height: f32, arc_angle: f32) -> Geometry {
    let band = ArcBand::centered(radius, thickness, arc_angle);
    extrude(band, height, ARC_SEGMENTS)
}

fn extrude(band: ArcBand, height: f32, segments: usize) -> Geometry {
    Geometry::Band(Extrusion {
        band,
        height,
        segments,
        profile: band.outline(segments),
    })
}

impl Geometry {
    /// Closed 2D profile in the XY profile plane
    pub fn outline(&self) -> Vec<Vec2> {
        match self {
            Geometry::Box { width, depth, .. } => {
                let (hx, hy) = (width / 2.0, depth / 2.0);
                vec![
                    Vec2::new(-hx, -hy),
                    Vec2::new(hx, -hy),
                    Vec2::new(hx, hy),
                    Vec2::new(-hx, hy),
                ]
            }
            Geometry::Band(extrusion) => extrusion.profile.clone(),
        }
    }

    /// Local bounding box
    pub fn bounds(&self) -> Aabb {
        match self {
            Geometry::Box {
                width,
                depth,
                height,
            } => {
                let half = Vec3::new(width / 2.0, height / 2.0, depth / 2.0);
                Aabb {
                    min: -half,
                    max: half,
                }
            }
            Geometry::Band(extrusion) => {
                let half_height = extrusion.height / 2.0;
                let mut min = Vec3::new(f32::INFINITY, -half_height, f32::INFINITY);
                let mut max = Vec3::new(f32::NEG_INFINITY, half_height, f32::NEG_INFINITY);
                for p in &extrusion.profile {
                    let w = profile_to_world(*p, 0.0);
                    min.x = min.x.min(w.x);
                    min.z = min.z.min(w.z);
                    max.x = max.x.max(w.x);
                    max.z = max.z.max(w.z);
                }
                Aabb { min, max }
            }
        }
    }

    /// Triangle list for rendering
    pub fn mesh(&self) -> Vec<Vertex> {
        match self {
            Geometry::Box {
                width,
                depth,
                height,
            } => mesh::box_mesh(*width, *depth, *height),
            Geometry::Band(extrusion) => {
                mesh::band_extrusion_mesh(&extrusion.profile, extrusion.height)
            }
        }
    }
}
