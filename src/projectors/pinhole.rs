// Copyright @yucwang 2026

use crate::core::projector::Projector;
use crate::math::constants::{deg_to_rad, Float, Vector3f};
use crate::math::ray::Ray3f;

/// Rectilinear projection through a single point. `y` spans [-0.5, 0.5],
/// so the vertical field of view is the configured one.
pub struct PinholeProjector {
    fov_tan: Float,
}

impl PinholeProjector {
    pub fn new(fov: Float) -> Self {
        Self { fov_tan: fov_tan(fov) }
    }
}

/// Image-plane half-extent scale for a vertical field of view in degrees.
pub fn fov_tan(fov: Float) -> Float {
    2.0 * deg_to_rad(fov / 2.0).tan()
}

impl Projector for PinholeProjector {
    fn apply(&self, x: Float, y: Float) -> Ray3f {
        Ray3f::new(Vector3f::zeros(),
                   Vector3f::new(self.fov_tan * x, self.fov_tan * y, 1.0))
    }

    fn min_recommended_fov(&self) -> Float {
        1.0
    }

    fn max_recommended_fov(&self) -> Float {
        175.0
    }

    fn default_fov(&self) -> Float {
        70.0
    }
}
