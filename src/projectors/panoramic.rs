// Copyright @yucwang 2026

use crate::core::projector::Projector;
use crate::math::constants::{deg_to_rad, Float, Vector3f};
use crate::math::ray::Ray3f;

/// Equirectangular panorama: x maps to yaw, y maps to pitch, both scaled by
/// the field of view.
pub struct PanoramicProjector {
    fov: Float,
}

impl PanoramicProjector {
    pub fn new(fov: Float) -> Self {
        Self { fov }
    }
}

impl Projector for PanoramicProjector {
    fn apply(&self, x: Float, y: Float) -> Ray3f {
        let ax = deg_to_rad(x * self.fov);
        let ay = deg_to_rad(y * self.fov);
        let (sin_ay, cos_ay) = ay.sin_cos();
        let (sin_ax, cos_ax) = ax.sin_cos();
        Ray3f::new(Vector3f::zeros(), Vector3f::new(cos_ay * sin_ax, sin_ay, cos_ay * cos_ax))
    }

    fn min_recommended_fov(&self) -> Float {
        1.0
    }

    fn max_recommended_fov(&self) -> Float {
        180.0
    }

    fn default_fov(&self) -> Float {
        120.0
    }
}
