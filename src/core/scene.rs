// Copyright @yucwang 2026

use crate::core::camera::Camera;
use crate::core::scene_io::{self, SceneIoError};
use crate::core::sky::Sky;

/// Smallest canvas the renderer accepts.
pub const MIN_CANVAS_WIDTH: usize = 20;
pub const MIN_CANVAS_HEIGHT: usize = 20;

pub const DEFAULT_CANVAS_WIDTH: usize = 400;
pub const DEFAULT_CANVAS_HEIGHT: usize = 400;
pub const DEFAULT_TARGET_SPP: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Scene is being prepared; nothing is sampled.
    Precompute,
    /// Workers idle, the sample buffer is frozen.
    Paused,
    Rendering,
}

/// Scene configuration consumed by the render manager.
///
/// Every change to the canvas, camera or sky bumps the generation token so
/// the manager can tell that samples in flight belong to an older
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    name: String,
    width: usize,
    height: usize,
    target_spp: u32,
    render_mode: RenderMode,
    camera: Camera,
    sky: Sky,
    generation: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            name: String::from("default"),
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            target_spp: DEFAULT_TARGET_SPP,
            render_mode: RenderMode::Paused,
            camera: Camera::default(),
            sky: Sky::default(),
            generation: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_canvas_size(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.refresh();
        }
    }

    pub fn target_spp(&self) -> u32 {
        self.target_spp
    }

    pub fn set_target_spp(&mut self, spp: u32) {
        self.target_spp = spp;
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        self.refresh();
        &mut self.camera
    }

    pub fn sky(&self) -> &Sky {
        &self.sky
    }

    pub fn sky_mut(&mut self) -> &mut Sky {
        self.refresh();
        &mut self.sky
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidates samples rendered for the current configuration.
    pub fn refresh(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn to_xml(&self) -> Result<String, SceneIoError> {
        scene_io::write_scene(self)
    }

    /// Replaces this scene's configuration with the one stored in `xml`.
    /// The scene is left paused.
    pub fn import_xml(&mut self, xml: &str) -> Result<(), SceneIoError> {
        let imported = scene_io::read_scene(xml)?;
        let generation = self.generation;
        *self = imported;
        self.generation = generation;
        self.render_mode = RenderMode::Paused;
        self.refresh();
        Ok(())
    }
}
