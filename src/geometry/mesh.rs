//! Triangle mesh generation for piece geometry

use glam::{Vec2, Vec3};

use super::profile_to_world;
use crate::render::vertex::Vertex;

/// Push a quad (a, b, c, d in winding order) as two triangles
fn push_quad(vertices: &mut Vec<Vertex>, corners: [Vec3; 4], normal: Vec3) {
    let [a, b, c, d] = corners;
    for p in [a, b, c, c, d, a] {
        vertices.push(Vertex::from_vec3(p, normal));
    }
}

/// Generate vertices for an axis-aligned box centered on the origin
pub fn box_mesh(width: f32, depth: f32, height: f32) -> Vec<Vertex> {
    let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);
    let mut vertices = Vec::with_capacity(36);

    let faces: [(Vec3, Vec3, Vec3); 6] = [
        // (normal, u axis, v axis) with u × v = normal
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let half = Vec3::new(hx, hy, hz);

    for (normal, u, v) in faces {
        let center = normal * half;
        let u = u * half;
        let v = v * half;
        push_quad(
            &mut vertices,
            [center - u - v, center + u - v, center + u + v, center - u + v],
            normal,
        );
    }

    vertices
}

/// Signed area of a closed profile (positive when counter-clockwise)
fn signed_area(profile: &[Vec2]) -> f32 {
    let n = profile.len();
    (0..n)
        .map(|i| {
            let a = profile[i];
            let b = profile[(i + 1) % n];
            a.perp_dot(b)
        })
        .sum::<f32>()
        / 2.0
}

/// Generate vertices for a band profile extruded vertically and centered on y = 0
///
/// The profile must be laid out as produced by `ArcBand::outline`: `segments + 1`
/// outer points followed by `segments + 1` inner points in reverse order.
pub fn band_extrusion_mesh(profile: &[Vec2], height: f32) -> Vec<Vertex> {
    let n = profile.len();
    if n < 4 {
        return Vec::new();
    }
    let segments = n / 2 - 1;
    let (top, bottom) = (height / 2.0, -height / 2.0);
    let mut vertices = Vec::with_capacity(segments * 12 + n * 6);

    // Caps: quad strip between matching outer and inner samples
    for i in 0..segments {
        let outer_a = profile[i];
        let outer_b = profile[i + 1];
        let inner_a = profile[n - 1 - i];
        let inner_b = profile[n - 2 - i];

        push_quad(
            &mut vertices,
            [
                profile_to_world(inner_a, top),
                profile_to_world(inner_b, top),
                profile_to_world(outer_b, top),
                profile_to_world(outer_a, top),
            ],
            Vec3::Y,
        );
        push_quad(
            &mut vertices,
            [
                profile_to_world(outer_a, bottom),
                profile_to_world(outer_b, bottom),
                profile_to_world(inner_b, bottom),
                profile_to_world(inner_a, bottom),
            ],
            Vec3::NEG_Y,
        );
    }

    // Side walls, one per outline edge including the closing edge
    let orientation = signed_area(profile).signum();
    for i in 0..n {
        let a = profile[i];
        let b = profile[(i + 1) % n];
        let edge = b - a;
        if edge.length_squared() <= f32::EPSILON {
            continue;
        }
        let outward = Vec2::new(edge.y, -edge.x).normalize() * orientation;
        let normal = profile_to_world(outward, 0.0);

        push_quad(
            &mut vertices,
            [
                profile_to_world(a, bottom),
                profile_to_world(b, bottom),
                profile_to_world(b, top),
                profile_to_world(a, top),
            ],
            normal,
        );
    }

    vertices
}
