// Copyright @yucwang 2026

use crate::core::integrator::{Integrator, TraceError};
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::math::constants::Vector3f;
use crate::math::ray::Ray3f;

/// Integrator for scenes without geometry: every camera ray escapes and
/// picks up the sky radiance along its direction.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkyIntegrator;

impl SkyIntegrator {
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for SkyIntegrator {
    fn trace_ray(&self, scene: &Scene, ray: &Ray3f, _rng: &mut LcgRng)
                 -> Result<Vector3f, TraceError> {
        Ok(scene.sky().sky_color(&ray.dir()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sky::SkyMode;

    #[test]
    fn test_sky_integrator_returns_sky_color() {
        let mut scene = Scene::new();
        scene.sky_mut().set_sky_mode(SkyMode::SolidColor);
        scene.sky_mut().set_color(Vector3f::new(0.9, 0.8, 1.0));
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.2, 0.3, 1.0));
        let mut rng = LcgRng::new(0);
        let radiance = SkyIntegrator::new().trace_ray(&scene, &ray, &mut rng).unwrap();
        assert_eq!(radiance, Vector3f::new(0.9, 0.8, 1.0));
    }
}
