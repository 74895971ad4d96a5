// Copyright @yucwang 2026

use crate::core::projector::Projector;
use crate::core::rng::LcgRng;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;

/// Lens shift: translates the image plane before projecting.
pub struct ShiftProjector {
    wrapped: Box<dyn Projector>,
    shift_x: Float,
    shift_y: Float,
}

impl ShiftProjector {
    pub fn new(wrapped: Box<dyn Projector>, shift_x: Float, shift_y: Float) -> Self {
        Self { wrapped, shift_x, shift_y }
    }
}

impl Projector for ShiftProjector {
    fn apply(&self, x: Float, y: Float) -> Ray3f {
        self.wrapped.apply(x + self.shift_x, y + self.shift_y)
    }

    fn apply_random(&self, x: Float, y: Float, rng: &mut LcgRng) -> Ray3f {
        self.wrapped.apply_random(x + self.shift_x, y + self.shift_y, rng)
    }

    fn covers(&self, x: Float, y: Float) -> bool {
        self.wrapped.covers(x + self.shift_x, y + self.shift_y)
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
