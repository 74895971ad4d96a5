// Copyright @yucwang 2026

pub mod aperture;
pub mod fisheye;
pub mod omni_directional_stereo;
pub mod panoramic;
pub mod panoramic_slot;
pub mod parallel;
pub mod pinhole;
pub mod shift;
pub mod stereographic;
