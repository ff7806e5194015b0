//! Annulus-sector band used for C-rings and swing arcs
//!
//! In the profile plane, a band is defined by:
//! - inner_radius / outer_radius: radial extent
//! - theta_start, theta_end: angular extent (end may exceed start by more than π)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::polar_to_cartesian;

/// A flat annulus sector in profile space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcBand {
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Start angle (radians)
    pub theta_start: f32,
    /// End angle (radians, not normalized so spans up to 2π survive)
    pub theta_end: f32,
}

impl ArcBand {
    pub fn new(inner_radius: f32, outer_radius: f32, theta_start: f32, theta_end: f32) -> Self {
        Self {
            inner_radius,
            outer_radius,
            theta_start,
            theta_end,
        }
    }

    /// Band swept symmetrically about angle 0
    pub fn centered(radius: f32, thickness: f32, arc_angle: f32) -> Self {
        Self::new(radius - thickness, radius, -arc_angle / 2.0, arc_angle / 2.0)
    }

    /// Angular span of the band
    #[inline]
    pub fn angular_span(&self) -> f32 {
        self.theta_end - self.theta_start
    }

    /// Sample `segments + 1` points along the outer edge, start to end
    pub fn sample_outer_edge(&self, segments: usize) -> Vec<Vec2> {
        self.sample_edge(self.outer_radius, segments)
    }

    /// Sample `segments + 1` points along the inner edge, start to end
    pub fn sample_inner_edge(&self, segments: usize) -> Vec<Vec2> {
        self.sample_edge(self.inner_radius, segments)
    }

    fn sample_edge(&self, radius: f32, segments: usize) -> Vec<Vec2> {
        let span = self.angular_span();
        let segments = segments.max(1);

        (0..=segments)
            .map(|i| {
                let t = i as f32 / segments as f32;
                polar_to_cartesian(radius, self.theta_start + t * span)
            })
            .collect()
    }

    /// Closed profile: outer edge forward, then inner edge back
    pub fn outline(&self, segments: usize) -> Vec<Vec2> {
        let mut points = self.sample_outer_edge(segments);
        let mut inner = self.sample_inner_edge(segments);
        inner.reverse();
        points.extend(inner);
        points
    }
}
