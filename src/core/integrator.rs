// Copyright @yucwang 2026

use std::fmt;

use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::math::constants::Vector3f;
use crate::math::ray::Ray3f;

/// Failure to produce a radiance estimate for one camera ray.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceError {
    NonFinite,
    Integrator(String),
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::NonFinite => write!(f, "radiance estimate is not finite"),
            TraceError::Integrator(msg) => write!(f, "integrator failed: {}", msg),
        }
    }
}

impl std::error::Error for TraceError {}

/// Radiance estimator for world-space camera rays. Shared read-only by all
/// render workers; randomness comes from the calling worker's stream.
pub trait Integrator: Send + Sync {
    fn trace_ray(&self, scene: &Scene, ray: &Ray3f, rng: &mut LcgRng)
                 -> Result<Vector3f, TraceError>;
}
