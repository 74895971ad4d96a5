// Copyright @yucwang 2026

use crate::core::rng::LcgRng;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;

/// Maps a normalized image-plane coordinate to a camera-space ray.
///
/// Coordinates have their origin at the image center; see
/// [`CameraView::normalized`](crate::core::camera::CameraView::normalized)
/// for how pixels map onto them. Ray generation never fails; a coordinate outside the image a
/// projector can form is reported through [`Projector::covers`] and the
/// caller discards the pixel.
pub trait Projector: Send + Sync {
    /// Deterministic mapping, used for previews and regression checks.
    fn apply(&self, x: Float, y: Float) -> Ray3f;

    /// Stochastic mapping. Projectors without lens effects ignore `rng`.
    fn apply_random(&self, x: Float, y: Float, _rng: &mut LcgRng) -> Ray3f {
        self.apply(x, y)
    }

    fn covers(&self, _x: Float, _y: Float) -> bool {
        true
    }

    fn min_recommended_fov(&self) -> Float;
    fn max_recommended_fov(&self) -> Float;
    fn default_fov(&self) -> Float;

    /// Whether both axes span [-0.5, 0.5] over the whole canvas instead of
    /// being corrected for the canvas aspect ratio.
    fn full_frame(&self) -> bool {
        false
    }
}
