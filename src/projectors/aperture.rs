// Copyright @yucwang 2026

use crate::core::projector::Projector;
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON};
use crate::math::ray::Ray3f;
use crate::math::warp::sample_uniform_disk_concentric;

/// Depth of field on top of another projector. Rays from a disk-shaped
/// aperture converge on the plane `z = subject_distance`.
pub struct ApertureProjector {
    wrapped: Box<dyn Projector>,
    aperture: Float,
    subject_distance: Float,
}

impl ApertureProjector {
    pub fn new(wrapped: Box<dyn Projector>, aperture: Float, subject_distance: Float) -> Self {
        Self { wrapped, aperture, subject_distance }
    }
}

impl Projector for ApertureProjector {
    fn apply(&self, x: Float, y: Float) -> Ray3f {
        self.wrapped.apply(x, y)
    }

    fn apply_random(&self, x: Float, y: Float, rng: &mut LcgRng) -> Ray3f {
        let ray = self.wrapped.apply_random(x, y, rng);
        let dir = ray.dir();
        // Rays that never reach the focal plane keep a pinhole path.
        if dir.z < EPSILON {
            return ray;
        }
        let focal = dir * (self.subject_distance / dir.z);
        let u = Vector2f::new(rng.next_float(), rng.next_float());
        let lens = sample_uniform_disk_concentric(&u) * self.aperture;
        let offset = Vector3f::new(lens.x, lens.y, 0.0);
        Ray3f::new(ray.origin() + offset, focal - offset)
    }

    fn covers(&self, x: Float, y: Float) -> bool {
        self.wrapped.covers(x, y)
    }

    fn min_recommended_fov(&self) -> Float {
        self.wrapped.min_recommended_fov()
    }

    fn max_recommended_fov(&self) -> Float {
        self.wrapped.max_recommended_fov()
    }

    fn default_fov(&self) -> Float {
        self.wrapped.default_fov()
    }

    fn full_frame(&self) -> bool {
        self.wrapped.full_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projectors::pinhole::PinholeProjector;

    #[test]
    fn test_aperture_rays_meet_on_focal_plane() {
        let subject_distance = 3.0;
        let pinhole = Box::new(PinholeProjector::new(70.0));
        let projector = ApertureProjector::new(pinhole, 0.5, subject_distance);
        let pinhole = PinholeProjector::new(70.0).apply(0.2, -0.1);
        let target = pinhole.dir() * (subject_distance / pinhole.dir().z);

        let mut rng = LcgRng::new(11);
        for _ in 0..32 {
            let ray = projector.apply_random(0.2, -0.1, &mut rng);
            let t = (subject_distance - ray.origin().z) / ray.dir().z;
            assert!((ray.at(t) - target).norm() < 1e-9);
            assert!(ray.origin().norm() <= 0.5 + 1e-12);
        }
    }

    #[test]
    fn test_aperture_deterministic_apply_is_pinhole() {
        let projector = ApertureProjector::new(Box::new(PinholeProjector::new(70.0)), 0.5, 3.0);
        assert_eq!(projector.apply(0.1, 0.1), PinholeProjector::new(70.0).apply(0.1, 0.1));
    }
}
