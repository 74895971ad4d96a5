// Copyright @yucwang 2026

use crate::core::projector::Projector;
use crate::math::constants::{deg_to_rad, Float, Vector3f, PI};
use crate::math::ray::Ray3f;

/// Equidistant fisheye: the angle from the optical axis grows linearly with
/// the distance from the image center.
pub struct FisheyeProjector {
    fov: Float,
}

impl FisheyeProjector {
    pub fn new(fov: Float) -> Self {
        Self { fov: deg_to_rad(fov) }
    }

    fn angles(&self, x: Float, y: Float) -> (Float, Float, Float) {
        let ax = self.fov * x;
        let ay = self.fov * y;
        (ax, ay, (ax * ax + ay * ay).sqrt())
    }
}

impl Projector for FisheyeProjector {
    fn apply(&self, x: Float, y: Float) -> Ray3f {
        let (ax, ay, angle) = self.angles(x, y);
        let (sin_a, cos_a) = angle.sin_cos();
        let (dx, dy) = if angle == 0.0 {
            (0.0, 0.0)
        } else {
            (sin_a * ax / angle, sin_a * ay / angle)
        };
        Ray3f::new(Vector3f::zeros(), Vector3f::new(dx, dy, cos_a))
    }

    /// Past PI from the axis the mapping wraps around; those pixels lie
    /// outside the circular image.
    fn covers(&self, x: Float, y: Float) -> bool {
        self.angles(x, y).2 <= PI
    }

    fn min_recommended_fov(&self) -> Float {
        1.0
    }

    fn max_recommended_fov(&self) -> Float {
        360.0
    }

    fn default_fov(&self) -> Float {
        180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fisheye_angle_is_linear_in_radius() {
        let projector = FisheyeProjector::new(180.0);
        let dir = projector.apply(0.5, 0.0).dir();
        assert!((dir - Vector3f::new(1.0, 0.0, 0.0)).norm() < 1e-12);
        let dir = projector.apply(0.0, 0.25).dir();
        assert!((dir.y.atan2(dir.z) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_fisheye_flags_pixels_outside_image_circle() {
        let projector = FisheyeProjector::new(360.0);
        assert!(projector.covers(0.5, 0.0));
        assert!(!projector.covers(0.5, 0.5));
        // Ray generation itself still succeeds.
        assert!(projector.apply(0.5, 0.5).is_finite());
    }
}
