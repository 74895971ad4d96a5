/* Copyright 2020 @Yuchen Wong */

use nalgebra::{Matrix3, Vector2, Vector3};

pub type Float = f64;

pub type Vector2f = Vector2<Float>;
pub type Vector3f = Vector3<Float>;
pub type Matrix3f = Matrix3<Float>;

pub const EPSILON: Float = 1e-4;
pub const PI: Float = std::f64::consts::PI;
pub const HALF_PI: Float = std::f64::consts::FRAC_PI_2;

#[inline]
pub fn deg_to_rad(degrees: Float) -> Float {
    degrees * (PI / 180.0)
}
