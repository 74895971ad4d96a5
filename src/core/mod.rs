// Copyright @yucwang 2021

pub mod camera;
pub mod integrator;
pub mod projector;
pub mod rng;
pub mod sample_buffer;
pub mod scene;
pub mod scene_io;
pub mod scene_provider;
pub mod sky;
