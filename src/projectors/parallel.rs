// Copyright @yucwang 2026

use crate::core::projector::Projector;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

/// Orthographic projection. The field of view is reinterpreted as the
/// width of the view volume in world units.
pub struct ParallelProjector {
    world_width: Float,
}

impl ParallelProjector {
    pub fn new(world_width: Float) -> Self {
        Self { world_width }
    }
}

impl Projector for ParallelProjector {
    fn apply(&self, x: Float, y: Float) -> Ray3f {
        Ray3f::new(Vector3f::new(self.world_width * x, self.world_width * y, 0.0),
                   Vector3f::new(0.0, 0.0, 1.0))
    }

    fn min_recommended_fov(&self) -> Float {
        1.0
    }

    fn max_recommended_fov(&self) -> Float {
        1000.0
    }

    fn default_fov(&self) -> Float {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_rays_share_direction() {
        let projector = ParallelProjector::new(10.0);
        let a = projector.apply(-0.5, 0.25);
        let b = projector.apply(0.3, -0.1);
        assert_eq!(a.dir(), b.dir());
        assert!((a.origin() - Vector3f::new(-5.0, 2.5, 0.0)).norm() < 1e-12);
    }
}
