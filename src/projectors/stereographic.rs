// Copyright @yucwang 2026

use crate::core::projector::Projector;
use crate::math::constants::{deg_to_rad, Float, Vector3f};
use crate::math::ray::Ray3f;

/// Inverse stereographic projection, conformal wide-angle mapping.
pub struct StereographicProjector {
    scale: Float,
}

impl StereographicProjector {
    pub fn new(fov: Float) -> Self {
        Self { scale: 4.0 * (deg_to_rad(fov) / 4.0).tan() }
    }
}

impl Projector for StereographicProjector {
    fn apply(&self, x: Float, y: Float) -> Ray3f {
        let u = self.scale * x;
        let v = self.scale * y;
        let r2 = u * u + v * v;
        Ray3f::new(Vector3f::zeros(), Vector3f::new(4.0 * u, 4.0 * v, 4.0 - r2))
    }

    fn min_recommended_fov(&self) -> Float {
        1.0
    }

    fn max_recommended_fov(&self) -> Float {
        270.0
    }

    fn default_fov(&self) -> Float {
        120.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereographic_edge_matches_half_fov() {
        let projector = StereographicProjector::new(120.0);
        let dir = projector.apply(0.5, 0.0).dir();
        let angle = dir.x.atan2(dir.z);
        assert!((angle - deg_to_rad(60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_stereographic_beyond_hemisphere() {
        let projector = StereographicProjector::new(240.0);
        let dir = projector.apply(0.5, 0.0).dir();
        assert!(dir.z < 0.0);
        assert!((dir.norm() - 1.0).abs() < 1e-12);
    }
}
