// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f, HALF_PI, PI};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyMode {
    Black,
    SolidColor,
    Gradient,
    Simulated,
}

impl SkyMode {
    pub fn name(self) -> &'static str {
        match self {
            SkyMode::Black => "black",
            SkyMode::SolidColor => "solid_color",
            SkyMode::Gradient => "gradient",
            SkyMode::Simulated => "simulated",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "black" => Some(SkyMode::Black),
            "solid_color" => Some(SkyMode::SolidColor),
            "gradient" => Some(SkyMode::Gradient),
            "simulated" => Some(SkyMode::Simulated),
            _ => None,
        }
    }
}

/// A gradient stop. `pos` runs from 0 at the zenith to 1 at the nadir.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub color: Vector3f,
    pub pos: Float,
}

impl GradientStop {
    pub fn new(r: Float, g: Float, b: Float, pos: Float) -> Self {
        Self { color: Vector3f::new(r, g, b), pos }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sun {
    pub azimuth: Float,
    pub altitude: Float,
    pub turbidity: Float,
}

impl Default for Sun {
    fn default() -> Self {
        Self { azimuth: PI / 2.5, altitude: PI / 3.0, turbidity: 2.5 }
    }
}

impl Sun {
    pub fn direction(&self) -> Vector3f {
        let (sin_alt, cos_alt) = self.altitude.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        Vector3f::new(cos_alt * cos_az, sin_alt, cos_alt * sin_az)
    }
}

/// Radiance seen by rays that leave the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Sky {
    mode: SkyMode,
    color: Vector3f,
    gradient: Vec<GradientStop>,
    sun: Sun,
    light: Float,
    mirrored: bool,
}

impl Default for Sky {
    fn default() -> Self {
        Self {
            mode: SkyMode::Simulated,
            color: Vector3f::new(0.5, 0.7, 1.0),
            gradient: vec![
                GradientStop::new(0.36, 0.52, 0.81, 0.0),
                GradientStop::new(0.92, 0.95, 1.0, 1.0),
            ],
            sun: Sun::default(),
            light: 1.0,
            mirrored: true,
        }
    }
}

// Scales simulated luminance (kcd/m^2) into the renderer's radiance range.
const SIMULATED_SKY_SCALE: Float = 0.04;

impl Sky {
    pub fn mode(&self) -> SkyMode {
        self.mode
    }

    pub fn set_sky_mode(&mut self, mode: SkyMode) {
        self.mode = mode;
    }

    pub fn color(&self) -> Vector3f {
        self.color
    }

    pub fn set_color(&mut self, color: Vector3f) {
        self.color = color;
    }

    pub fn gradient(&self) -> &[GradientStop] {
        &self.gradient
    }

    /// Replaces the gradient; stops are kept sorted by position.
    pub fn set_gradient(&mut self, mut gradient: Vec<GradientStop>) {
        gradient.sort_by(|a, b| a.pos.partial_cmp(&b.pos).unwrap_or(std::cmp::Ordering::Equal));
        self.gradient = gradient;
    }

    pub fn sun(&self) -> &Sun {
        &self.sun
    }

    pub fn set_sun(&mut self, sun: Sun) {
        self.sun = sun;
    }

    pub fn light(&self) -> Float {
        self.light
    }

    pub fn set_light(&mut self, light: Float) {
        self.light = light;
    }

    pub fn mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    /// Sky radiance along a unit direction.
    pub fn sky_color(&self, dir: &Vector3f) -> Vector3f {
        let color = match self.mode {
            SkyMode::Black => return Vector3f::zeros(),
            SkyMode::SolidColor => self.color,
            SkyMode::Gradient => self.gradient_color(dir),
            SkyMode::Simulated => self.simulated_color(dir),
        };
        color * self.light
    }

    fn gradient_color(&self, dir: &Vector3f) -> Vector3f {
        let (first, last) = match (self.gradient.first(), self.gradient.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Vector3f::zeros(),
        };
        let angle = dir.y.max(-1.0).min(1.0).asin();
        let w = 1.0 - (angle + HALF_PI) / PI;
        if w <= first.pos {
            return first.color;
        }
        for pair in self.gradient.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if w <= b.pos {
                let span = b.pos - a.pos;
                if span <= 0.0 {
                    return b.color;
                }
                let t = (w - a.pos) / span;
                return a.color * (1.0 - t) + b.color * t;
            }
        }
        last.color
    }

    /// Preetham et al. analytic daylight model.
    fn simulated_color(&self, dir: &Vector3f) -> Vector3f {
        if dir.y < 0.0 && !self.mirrored {
            return Vector3f::zeros();
        }
        let view = Vector3f::new(dir.x, dir.y.abs(), dir.z);
        let sun_dir = self.sun.direction();
        let t = self.sun.turbidity;
        let theta_s = (HALF_PI - self.sun.altitude).max(0.0).min(HALF_PI - 0.01);
        let cos_theta = view.y.max(0.01);
        let cos_gamma = view.dot(&sun_dir).max(-1.0).min(1.0);
        let gamma = cos_gamma.acos();

        let perez_y = [0.1787 * t - 1.4630, -0.3554 * t + 0.4275, -0.0227 * t + 5.3251,
                       0.1206 * t - 2.5771, -0.0670 * t + 0.3703];
        let perez_x = [-0.0193 * t - 0.2592, -0.0665 * t + 0.0008, -0.0004 * t + 0.2125,
                       -0.0641 * t - 0.8989, -0.0033 * t + 0.0452];
        let perez_yc = [-0.0167 * t - 0.2608, -0.0950 * t + 0.0092, -0.0079 * t + 0.2102,
                        -0.0441 * t - 1.6537, -0.0109 * t + 0.0529];

        let chi = (4.0 / 9.0 - t / 120.0) * (PI - 2.0 * theta_s);
        let zenith_y = (4.0453 * t - 4.9710) * chi.tan() - 0.2155 * t + 2.4192;
        let th = theta_s;
        let th2 = th * th;
        let th3 = th2 * th;
        let zenith_x = t * t * (0.00166 * th3 - 0.00375 * th2 + 0.00209 * th)
            + t * (-0.02903 * th3 + 0.06377 * th2 - 0.03202 * th + 0.00394)
            + (0.11693 * th3 - 0.21196 * th2 + 0.06052 * th + 0.25886);
        let zenith_yc = t * t * (0.00275 * th3 - 0.00610 * th2 + 0.00317 * th)
            + t * (-0.04214 * th3 + 0.08970 * th2 - 0.04153 * th + 0.00516)
            + (0.15346 * th3 - 0.26756 * th2 + 0.06670 * th + 0.26688);

        let distribution = |c: &[Float; 5]| {
            perez(c, cos_theta, gamma, cos_gamma) / perez(c, 1.0, theta_s, theta_s.cos())
        };
        let lum = (zenith_y * distribution(&perez_y)).max(0.0) * SIMULATED_SKY_SCALE;
        let x = zenith_x * distribution(&perez_x);
        let y = (zenith_yc * distribution(&perez_yc)).max(1e-6);

        xyy_to_rgb(x, y, lum)
    }
}

fn perez(c: &[Float; 5], cos_theta: Float, gamma: Float, cos_gamma: Float) -> Float {
    (1.0 + c[0] * (c[1] / cos_theta).exp())
        * (1.0 + c[2] * (c[3] * gamma).exp() + c[4] * cos_gamma * cos_gamma)
}

fn xyy_to_rgb(x: Float, y: Float, lum: Float) -> Vector3f {
    let big_x = x * lum / y;
    let big_z = (1.0 - x - y) * lum / y;
    let r = 3.2406 * big_x - 1.5372 * lum - 0.4986 * big_z;
    let g = -0.9689 * big_x + 1.8758 * lum + 0.0415 * big_z;
    let b = 0.0557 * big_x - 0.2040 * lum + 1.0570 * big_z;
    Vector3f::new(r.max(0.0), g.max(0.0), b.max(0.0))
}
