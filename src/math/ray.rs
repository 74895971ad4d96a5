// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray3f {
    origin: Vector3f,
    dir: Vector3f,
}

impl Ray3f {
    /// Builds a ray from an origin and a (not necessarily unit) direction.
    pub fn new(o: Vector3f, d: Vector3f) -> Self {
        Self { origin: o, dir: d.normalize() }
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn dir(&self) -> Vector3f {
        self.dir
    }

    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.dir * t
    }

    /// False for rays with a NaN or infinite component, which is what a zero
    /// direction turns into once normalized.
    pub fn is_finite(&self) -> bool {
        self.origin.iter().all(|v| v.is_finite())
            && self.dir.iter().all(|v| v.is_finite())
            && self.dir.norm_squared() > 0.0
    }
}

/* Tests for Ray */

#[cfg(test)]
mod tests {
    use super::Vector3f;
    use super::Ray3f;

    #[test]
    fn test_ray3f() {
        let o = Vector3f::new(0.0, 0.0, 0.0);
        let d = Vector3f::new(1.0, 0.0, 1.0);
        let ray = Ray3f::new(o, d);
        assert_eq!(o, ray.origin());
        assert!((ray.dir().norm() - 1.0).abs() < 1e-12);

        let v1 = ray.at(2.0);
        assert!((v1[0] - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert!(v1[1].abs() < 1e-12);
        assert!((v1[2] - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_ray_is_not_finite() {
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::zeros());
        assert!(!ray.is_finite());
        let ray = Ray3f::new(Vector3f::new(f64::INFINITY, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0));
        assert!(!ray.is_finite());
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0));
        assert!(ray.is_finite());
    }
}
