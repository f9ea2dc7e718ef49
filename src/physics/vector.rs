//! 2D vector algebra, angles in degrees, and line segments.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when the angle of a zero-length vector is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the angle of a zero vector is undefined")]
pub struct ZeroVectorAngle;

/// Angle helpers. All angles are in degrees.
pub struct Angle;

impl Angle {
    /// Normalize an angle into the range (-180, 180].
    pub fn normalize(angle: f64) -> f64 {
        if angle.is_nan() {
            return 0.0;
        }
        let mut result = angle % 360.0;
        if result > 180.0 {
            result -= 360.0;
        }
        if result <= -180.0 {
            result += 360.0;
        }
        result
    }

    #[inline]
    pub fn sin(angle: f64) -> f64 {
        angle.to_radians().sin()
    }

    #[inline]
    pub fn cos(angle: f64) -> f64 {
        angle.to_radians().cos()
    }
}

/// Immutable 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn cartesian(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Build a vector from an angle (degrees) and a length.
    pub fn polar(angle: f64, length: f64) -> Self {
        Self {
            x: Angle::cos(angle) * length,
            y: Angle::sin(angle) * length,
        }
    }

    #[inline]
    pub fn plus(&self, other: Vector) -> Vector {
        Vector::cartesian(self.x + other.x, self.y + other.y)
    }

    #[inline]
    pub fn minus(&self, other: Vector) -> Vector {
        Vector::cartesian(self.x - other.x, self.y - other.y)
    }

    #[inline]
    pub fn by(&self, scalar: f64) -> Vector {
        Vector::cartesian(self.x * scalar, self.y * scalar)
    }

    #[inline]
    pub fn dot(&self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn distance_to(&self, other: Vector) -> f64 {
        self.minus(other).length()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Angle of this vector in degrees, in (-180, 180].
    pub fn angle(&self) -> Result<f64, ZeroVectorAngle> {
        if self.is_zero() {
            return Err(ZeroVectorAngle);
        }
        Ok(Angle::normalize(self.y.atan2(self.x).to_degrees()))
    }

    /// Rotate around the origin by `angle` degrees.
    pub fn rotate(&self, angle: f64) -> Vector {
        let (sin, cos) = (Angle::sin(angle), Angle::cos(angle));
        Vector::cartesian(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Rotate around `pivot` by `angle` degrees.
    pub fn rotate_around(&self, pivot: Vector, angle: f64) -> Vector {
        self.minus(pivot).rotate(angle).plus(pivot)
    }

    /// Same direction, unit length. The zero vector stays zero.
    pub fn normalized(&self) -> Vector {
        let length = self.length();
        if length == 0.0 {
            Vector::ZERO
        } else {
            self.by(1.0 / length)
        }
    }

    pub fn with_length(&self, length: f64) -> Vector {
        self.normalized().by(length)
    }

    pub fn approx_eq(&self, other: Vector, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

/// A segment from `start` along `vector`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vector,
    pub vector: Vector,
}

impl Segment {
    pub fn new(start: Vector, vector: Vector) -> Self {
        Self { start, vector }
    }

    pub fn between(start: Vector, end: Vector) -> Self {
        Self::new(start, end.minus(start))
    }

    pub fn end(&self) -> Vector {
        self.start.plus(self.vector)
    }

    pub fn center(&self) -> Vector {
        self.start.plus(self.vector.by(0.5))
    }

    pub fn length(&self) -> f64 {
        self.vector.length()
    }

    /// Shortest distance from `point` to any point on this segment.
    /// A zero-length segment degenerates to a point distance.
    pub fn distance_from_point(&self, point: Vector) -> f64 {
        let length_sq = self.vector.dot(self.vector);
        if length_sq == 0.0 {
            return self.start.distance_to(point);
        }
        let t = (point.minus(self.start).dot(self.vector) / length_sq).clamp(0.0, 1.0);
        self.start.plus(self.vector.by(t)).distance_to(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle() {
        assert_eq!(Angle::normalize(0.0), 0.0);
        assert_eq!(Angle::normalize(180.0), 180.0);
        assert_eq!(Angle::normalize(-180.0), 180.0);
        assert_eq!(Angle::normalize(270.0), -90.0);
        assert_eq!(Angle::normalize(-270.0), 90.0);
        assert_eq!(Angle::normalize(720.0 + 45.0), 45.0);
    }

    #[test]
    fn test_angle_of_zero_vector_fails() {
        assert_eq!(Vector::ZERO.angle(), Err(ZeroVectorAngle));
        assert!((Vector::cartesian(0.0, 1.0).angle().unwrap() - 90.0).abs() < 1e-9);
        assert!((Vector::cartesian(-1.0, 0.0).angle().unwrap() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_polar_and_rotation() {
        let v = Vector::polar(90.0, 2.0);
        assert!(v.approx_eq(Vector::cartesian(0.0, 2.0), 1e-9));

        let rotated = Vector::cartesian(1.0, 0.0).rotate_around(Vector::cartesian(1.0, 1.0), 90.0);
        assert!(rotated.approx_eq(Vector::cartesian(2.0, 1.0), 1e-9));
    }

    #[test]
    fn test_segment_distance() {
        let segment = Segment::between(Vector::cartesian(0.0, 0.0), Vector::cartesian(10.0, 0.0));
        assert!((segment.distance_from_point(Vector::cartesian(5.0, 3.0)) - 3.0).abs() < 1e-9);
        assert!((segment.distance_from_point(Vector::cartesian(-4.0, 3.0)) - 5.0).abs() < 1e-9);

        let point = Segment::new(Vector::cartesian(1.0, 1.0), Vector::ZERO);
        assert!((point.distance_from_point(Vector::cartesian(4.0, 5.0)) - 5.0).abs() < 1e-9);
    }
}
