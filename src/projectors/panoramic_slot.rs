// Copyright @yucwang 2026

use crate::core::projector::Projector;
use crate::math::constants::{deg_to_rad, Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::projectors::pinhole::fov_tan;

/// Cylindrical panorama: angular in x, rectilinear in y.
pub struct PanoramicSlotProjector {
    fov: Float,
    fov_tan: Float,
}

impl PanoramicSlotProjector {
    pub fn new(fov: Float) -> Self {
        Self { fov, fov_tan: fov_tan(fov) }
    }
}

impl Projector for PanoramicSlotProjector {
    fn apply(&self, x: Float, y: Float) -> Ray3f {
        let ax = deg_to_rad(x * self.fov);
        let (sin_ax, cos_ax) = ax.sin_cos();
        Ray3f::new(Vector3f::zeros(), Vector3f::new(sin_ax, self.fov_tan * y, cos_ax))
    }

    fn min_recommended_fov(&self) -> Float {
        1.0
    }

    fn max_recommended_fov(&self) -> Float {
        90.0
    }

    fn default_fov(&self) -> Float {
        90.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_rays_stay_on_cylinder() {
        let projector = PanoramicSlotProjector::new(90.0);
        let ray = projector.apply(0.3, 0.2);
        let dir = ray.dir();
        let horizontal = (dir.x * dir.x + dir.z * dir.z).sqrt();
        assert!((dir.x.atan2(dir.z) - deg_to_rad(27.0)).abs() < 1e-12);
        assert!((dir.y / horizontal - 0.4).abs() < 1e-12);
    }
}
