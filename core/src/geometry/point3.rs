//! 3-D points

use super::Vector3;
use crate::common::*;
use num_traits::{Num, Zero};
use std::ops::{Add, AddAssign, Index, Mul, Sub};

/// A 3-D point containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point3<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,

    /// Z-coordinate.
    pub z: T,
}

/// 3-D point containing `Float` values.
pub type Point3f = Point3<Float>;

impl<T: Num + Copy> Point3<T> {
    /// Creates a new 3-D point.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// Creates a new 3-D zero point.
    pub fn zero() -> Self
    where
        T: Zero,
    {
        Self::new(T::zero(), T::zero(), T::zero())
    }

    /// Returns the square of the distance to another point.
    ///
    /// * `other` - The other point.
    pub fn distance_squared(self, other: Self) -> T {
        (self - other).length_squared()
    }

    /// Returns a point holding the component-wise minimums.
    ///
    /// * `other` - The other point.
    pub fn min(&self, other: &Self) -> Self
    where
        T: PartialOrd,
    {
        Self::new(min(self.x, other.x), min(self.y, other.y), min(self.z, other.z))
    }

    /// Returns a point holding the component-wise maximums.
    ///
    /// * `other` - The other point.
    pub fn max(&self, other: &Self) -> Self
    where
        T: PartialOrd,
    {
        Self::new(max(self.x, other.x), max(self.y, other.y), max(self.z, other.z))
    }
}

impl Point3f {
    /// Returns the distance to another point.
    ///
    /// * `other` - The other point.
    pub fn distance(self, other: Self) -> Float {
        self.distance_squared(other).sqrt()
    }

    /// Returns true if either coordinate is NaN.
    pub fn has_nans(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
}

impl<T: Num + Copy> Add<Vector3<T>> for Point3<T> {
    type Output = Self;

    /// Offsets the point by the given vector.
    ///
    /// * `v` - The offset vector.
    fn add(self, v: Vector3<T>) -> Self::Output {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl<T: Num + Copy> AddAssign<Vector3<T>> for Point3<T> {
    /// Performs the `+=` operation with an offset vector.
    ///
    /// * `v` - The offset vector.
    fn add_assign(&mut self, v: Vector3<T>) {
        *self = *self + v;
    }
}

impl<T: Num + Copy> Sub for Point3<T> {
    type Output = Vector3<T>;

    /// Returns the vector pointing from the given point to this one.
    ///
    /// * `other` - The other point.
    fn sub(self, other: Self) -> Self::Output {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl<T: Num + Copy> Sub<Vector3<T>> for Point3<T> {
    type Output = Self;

    /// Offsets the point by the negated vector.
    ///
    /// * `v` - The offset vector.
    fn sub(self, v: Vector3<T>) -> Self::Output {
        Self::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl<T: Num + Copy> Mul<T> for Point3<T> {
    type Output = Self;

    /// Scales the point.
    ///
    /// * `f` - The scaling factor.
    fn mul(self, f: T) -> Self::Output {
        Self::new(self.x * f, self.y * f, self.z * f)
    }
}

impl<T> Index<Axis> for Point3<T> {
    type Output = T;

    /// Indexes the point by axis.
    ///
    /// * `axis` - The axis.
    fn index(&self, axis: Axis) -> &Self::Output {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_squared() {
        let p1 = Point3::new(1.0, 2.0, 3.0);
        let p2 = Point3::new(1.0, 2.0, 5.0);
        assert_eq!(p1.distance_squared(p2), 4.0);
        assert_eq!(p1.distance(p2), 2.0);
    }

    #[test]
    fn point_vector_arithmetic() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let v = Vector3::new(0.5, -1.0, 2.0);
        assert_eq!(p + v, Point3::new(1.5, 0.0, 3.0));
        assert_eq!(p - v, Point3::new(0.5, 2.0, -1.0));
        assert_eq!(Point3::new(2.0, 0.0, 0.0) - p, Vector3::new(1.0, -1.0, -1.0));
    }
}
