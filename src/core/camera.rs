// Copyright @yucwang 2026

use crate::core::projector::Projector;
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Matrix3f, Vector3f};
use crate::math::ray::Ray3f;
use crate::projectors::aperture::ApertureProjector;
use crate::projectors::fisheye::FisheyeProjector;
use crate::projectors::omni_directional_stereo::{
    Eye, OmniDirectionalStereoProjector, DEFAULT_INTERPUPILLARY_DISTANCE,
};
use crate::projectors::panoramic::PanoramicProjector;
use crate::projectors::panoramic_slot::PanoramicSlotProjector;
use crate::projectors::parallel::ParallelProjector;
use crate::projectors::pinhole::PinholeProjector;
use crate::projectors::shift::ShiftProjector;
use crate::projectors::stereographic::StereographicProjector;

use nalgebra::{Rotation3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Pinhole,
    Parallel,
    Fisheye,
    Stereographic,
    Panoramic,
    PanoramicSlot,
    OdsLeft,
    OdsRight,
}

impl ProjectionMode {
    pub const ALL: [ProjectionMode; 8] = [
        ProjectionMode::Pinhole,
        ProjectionMode::Parallel,
        ProjectionMode::Fisheye,
        ProjectionMode::Stereographic,
        ProjectionMode::Panoramic,
        ProjectionMode::PanoramicSlot,
        ProjectionMode::OdsLeft,
        ProjectionMode::OdsRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProjectionMode::Pinhole => "pinhole",
            ProjectionMode::Parallel => "parallel",
            ProjectionMode::Fisheye => "fisheye",
            ProjectionMode::Stereographic => "stereographic",
            ProjectionMode::Panoramic => "panoramic",
            ProjectionMode::PanoramicSlot => "panoramic_slot",
            ProjectionMode::OdsLeft => "ods_left",
            ProjectionMode::OdsRight => "ods_right",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|mode| mode.name() == name)
    }

    /// Projections with a finite lens that an aperture can be fitted to.
    fn supports_depth_of_field(self) -> bool {
        match self {
            ProjectionMode::Pinhole
            | ProjectionMode::Fisheye
            | ProjectionMode::Stereographic
            | ProjectionMode::PanoramicSlot => true,
            _ => false,
        }
    }
}

/// Camera configuration: projection, lens and placement in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub projection_mode: ProjectionMode,
    pub fov: Float,
    /// Aperture radius; zero means infinite depth of field.
    pub aperture: Float,
    pub subject_distance: Float,
    pub shift_x: Float,
    pub shift_y: Float,
    pub interpupillary_distance: Float,
    pub position: Vector3f,
    pub yaw: Float,
    pub pitch: Float,
    pub roll: Float,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection_mode: ProjectionMode::Pinhole,
            fov: 70.0,
            aperture: 0.0,
            subject_distance: 2.0,
            shift_x: 0.0,
            shift_y: 0.0,
            interpupillary_distance: DEFAULT_INTERPUPILLARY_DISTANCE,
            position: Vector3f::zeros(),
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }
}

impl Camera {
    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        self.projection_mode = mode;
    }

    pub fn set_fov(&mut self, fov: Float) {
        self.fov = fov;
    }

    fn ods_projector(&self, eye: Eye) -> OmniDirectionalStereoProjector {
        let ipd = self.interpupillary_distance;
        OmniDirectionalStereoProjector::with_interpupillary_distance(eye, ipd)
    }

    pub fn create_projector(&self) -> Box<dyn Projector> {
        let mut projector: Box<dyn Projector> = match self.projection_mode {
            ProjectionMode::Pinhole => Box::new(PinholeProjector::new(self.fov)),
            ProjectionMode::Parallel => Box::new(ParallelProjector::new(self.fov)),
            ProjectionMode::Fisheye => Box::new(FisheyeProjector::new(self.fov)),
            ProjectionMode::Stereographic => Box::new(StereographicProjector::new(self.fov)),
            ProjectionMode::Panoramic => Box::new(PanoramicProjector::new(self.fov)),
            ProjectionMode::PanoramicSlot => Box::new(PanoramicSlotProjector::new(self.fov)),
            ProjectionMode::OdsLeft => Box::new(self.ods_projector(Eye::Left)),
            ProjectionMode::OdsRight => Box::new(self.ods_projector(Eye::Right)),
        };
        if self.aperture > 0.0 && self.projection_mode.supports_depth_of_field() {
            projector = Box::new(ApertureProjector::new(projector,
                                                        self.aperture,
                                                        self.subject_distance));
        }
        if !projector.full_frame() && (self.shift_x != 0.0 || self.shift_y != 0.0) {
            projector = Box::new(ShiftProjector::new(projector, self.shift_x, self.shift_y));
        }
        projector
    }

    /// Camera-to-world rotation: roll about z, then pitch about x, then yaw
    /// about the vertical axis.
    pub fn rotation(&self) -> Matrix3f {
        let yaw = Rotation3::from_axis_angle(&Vector3::y_axis(), self.yaw);
        let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), self.pitch);
        let roll = Rotation3::from_axis_angle(&Vector3::z_axis(), self.roll);
        (yaw * pitch * roll).into_inner()
    }

    pub fn view(&self, width: usize, height: usize) -> CameraView {
        CameraView {
            projector: self.create_projector(),
            rotation: self.rotation(),
            position: self.position,
            width: width as Float,
            height: height as Float,
        }
    }
}

/// Immutable per-generation ray generator shared by all render workers.
pub struct CameraView {
    projector: Box<dyn Projector>,
    rotation: Matrix3f,
    position: Vector3f,
    width: Float,
    height: Float,
}

impl CameraView {
    pub fn projector(&self) -> &dyn Projector {
        self.projector.as_ref()
    }

    /// Normalized image coordinate of a (sub)pixel position.
    ///
    /// Full-frame projectors get both axes in [-0.5, 0.5] with the top row
    /// at y = -0.5. Other projectors keep square pixels: y spans
    /// [-0.5, 0.5] with the top row at +0.5 and x is scaled by the aspect
    /// ratio.
    pub fn normalized(&self, px: Float, py: Float) -> (Float, Float) {
        if self.projector.full_frame() {
            (px / self.width - 0.5, py / self.height - 0.5)
        } else {
            (px / self.height - 0.5 * self.width / self.height, 0.5 - py / self.height)
        }
    }

    /// World-space ray through pixel `(px, py)`, or `None` when the pixel
    /// falls outside the image the projector can form.
    pub fn view_ray(&self, px: Float, py: Float, rng: Option<&mut LcgRng>) -> Option<Ray3f> {
        let (x, y) = self.normalized(px, py);
        if !self.projector.covers(x, y) {
            return None;
        }
        let ray = match rng {
            Some(rng) => self.projector.apply_random(x, y, rng),
            None => self.projector.apply(x, y),
        };
        Some(Ray3f::new(self.position + self.rotation * ray.origin(), self.rotation * ray.dir()))
    }
}
