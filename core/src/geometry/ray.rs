//! Rays

use super::{Point3f, Vector3f};
use crate::common::*;

/// A ray with parametric extent `[t_min, t_max]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Origin.
    pub o: Point3f,

    /// Direction.
    pub d: Vector3f,

    /// Minimum extent of the ray.
    pub t_min: Float,

    /// Maximum extent of the ray.
    pub t_max: Float,

    /// Time value.
    pub time: Float,
}

impl Ray {
    /// Creates a new ray with an epsilon minimum extent and unbounded maximum
    /// extent.
    ///
    /// * `o`    - Origin.
    /// * `d`    - Direction.
    /// * `time` - Time value.
    pub fn new(o: Point3f, d: Vector3f, time: Float) -> Self {
        Self {
            o,
            d,
            t_min: SHADOW_EPSILON,
            t_max: INFINITY,
            time,
        }
    }

    /// Get position along the ray at given parameter.
    ///
    /// * `t` - Parameter to evaluate.
    pub fn at(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }

    /// Returns true if any component is NaN.
    pub fn has_nans(&self) -> bool {
        self.o.has_nans() || self.d.has_nans() || self.t_max.is_nan()
    }
}

impl Default for Ray {
    /// Returns a degenerate ray at the origin.
    fn default() -> Self {
        Self::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), 0.0)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_along_ray() {
        let r = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 2.0), 0.0);
        assert_eq!(r.at(1.5), Point3f::new(0.0, 0.0, 3.0));
        assert!(r.t_min > 0.0);
        assert_eq!(r.t_max, INFINITY);
    }
}
