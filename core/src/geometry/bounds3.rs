//! 3-D axis aligned bounding boxes

use super::{Point3, Point3f, Vector3};
use crate::common::*;
use num_traits::{Bounded, Num};

/// A 3-D axis aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds3<T> {
    /// Minimum corner.
    pub p_min: Point3<T>,

    /// Maximum corner.
    pub p_max: Point3<T>,
}

/// 3-D bounding box containing `Float` values.
pub type Bounds3f = Bounds3<Float>;

impl Bounds3f {
    /// Empty bounds, the identity for `union()`.
    pub const EMPTY: Self = Self {
        p_min: Point3 {
            x: INFINITY,
            y: INFINITY,
            z: INFINITY,
        },
        p_max: Point3 {
            x: -INFINITY,
            y: -INFINITY,
            z: -INFINITY,
        },
    };
}

impl<T: Num + PartialOrd + Copy> Bounds3<T> {
    /// Creates a new bounding box from two corner points.
    ///
    /// * `p1` - First corner.
    /// * `p2` - Second corner.
    pub fn new(p1: Point3<T>, p2: Point3<T>) -> Self {
        Self {
            p_min: p1.min(&p2),
            p_max: p1.max(&p2),
        }
    }

    /// Creates an empty bounding box.
    pub fn empty() -> Self
    where
        T: Bounded,
    {
        Self {
            p_min: Point3::new(T::max_value(), T::max_value(), T::max_value()),
            p_max: Point3::new(T::min_value(), T::min_value(), T::min_value()),
        }
    }

    /// Returns the union with another bounding box.
    ///
    /// * `other` - The other bounding box.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            p_min: self.p_min.min(&other.p_min),
            p_max: self.p_max.max(&other.p_max),
        }
    }

    /// Returns the union with a point.
    ///
    /// * `p` - The point.
    pub fn union_point(&self, p: &Point3<T>) -> Self {
        Self {
            p_min: self.p_min.min(p),
            p_max: self.p_max.max(p),
        }
    }

    /// Returns the bounding box expanded by a constant amount in all
    /// dimensions.
    ///
    /// * `delta` - The amount to expand by.
    pub fn expand(&self, delta: T) -> Self {
        let v = Vector3::new(delta, delta, delta);
        Self {
            p_min: self.p_min - v,
            p_max: self.p_max + v,
        }
    }

    /// Returns the vector along the box diagonal from the minimum to the
    /// maximum corner.
    pub fn diagonal(&self) -> Vector3<T> {
        self.p_max - self.p_min
    }

    /// Returns the axis of the longest box extent.
    pub fn maximum_extent(&self) -> Axis {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            Axis::X
        } else if d.y > d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Returns true if the point lies inside the bounding box (boundary
    /// inclusive).
    ///
    /// * `p` - The point.
    pub fn contains(&self, p: &Point3<T>) -> bool {
        p.x >= self.p_min.x
            && p.x <= self.p_max.x
            && p.y >= self.p_min.y
            && p.y <= self.p_max.y
            && p.z >= self.p_min.z
            && p.z <= self.p_max.z
    }
}

impl Bounds3f {
    /// Returns the point at the center of the bounding box.
    pub fn center(&self) -> Point3f {
        self.p_min + self.diagonal() * 0.5
    }
}

impl Default for Bounds3f {
    /// Returns the "default value" of an empty bounding box.
    fn default() -> Self {
        Self::EMPTY
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
