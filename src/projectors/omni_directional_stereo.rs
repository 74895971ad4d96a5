// Copyright @yucwang 2026

use crate::core::projector::Projector;
use crate::math::constants::{Float, Vector3f, HALF_PI, PI};
use crate::math::ray::Ray3f;

pub const DEFAULT_INTERPUPILLARY_DISTANCE: Float = 0.069;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Omni-directional stereo panorama. x maps to yaw over the full circle, y
/// maps to pitch. Ray origins sit on a circle of radius IPD/2 around the
/// vertical axis, on opposite sides for the two eyes, so the horizontal
/// parallax lives in the per-pixel origins. Both eyes share directions.
pub struct OmniDirectionalStereoProjector {
    eye: Eye,
    interpupillary_distance: Float,
}

impl OmniDirectionalStereoProjector {
    pub fn new(eye: Eye) -> Self {
        Self::with_interpupillary_distance(eye, DEFAULT_INTERPUPILLARY_DISTANCE)
    }

    pub fn with_interpupillary_distance(eye: Eye, interpupillary_distance: Float) -> Self {
        Self { eye, interpupillary_distance }
    }

    pub fn eye(&self) -> Eye {
        self.eye
    }
}

impl Projector for OmniDirectionalStereoProjector {
    fn apply(&self, x: Float, y: Float) -> Ray3f {
        let theta = (x + 0.5) * PI - PI;
        let phi = HALF_PI - (y + 0.5) * PI;

        let scale = match self.eye {
            Eye::Left => -self.interpupillary_distance / 2.0,
            Eye::Right => self.interpupillary_distance / 2.0,
        };
        let (sin_theta, cos_theta) = theta.sin_cos();
        let (sin_phi, cos_phi) = phi.sin_cos();
        Ray3f::new(Vector3f::new(cos_theta * scale, 0.0, sin_theta * scale),
                   Vector3f::new(sin_theta * cos_phi, sin_phi, -cos_theta * cos_phi))
    }

    fn min_recommended_fov(&self) -> Float {
        180.0
    }

    fn max_recommended_fov(&self) -> Float {
        180.0
    }

    fn default_fov(&self) -> Float {
        180.0
    }

    fn full_frame(&self) -> bool {
        true
    }
}
