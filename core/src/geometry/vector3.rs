//! 3-D vectors

use super::{Normal3, Point3};
use crate::common::*;
use num_traits::{Num, Zero};
use std::ops::{Add, AddAssign, Div, Index, Mul, MulAssign, Neg, Sub, SubAssign};

/// A 3-D vector containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector3<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,

    /// Z-coordinate.
    pub z: T,
}

/// 3-D vector containing `Float` values.
pub type Vector3f = Vector3<Float>;

impl<T: Num + Copy> Vector3<T> {
    /// Creates a new 3-D vector.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// Creates a new 3-D zero vector.
    pub fn zero() -> Self
    where
        T: Zero,
    {
        Self::new(T::zero(), T::zero(), T::zero())
    }

    /// Returns the square of the vector's length.
    pub fn length_squared(&self) -> T {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Returns the dot product with another vector.
    ///
    /// * `other` - The other vector.
    pub fn dot(&self, other: &Self) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Returns the absolute value of the dot product with another vector.
    ///
    /// * `other` - The other vector.
    pub fn abs_dot(&self, other: &Self) -> T
    where
        T: Neg<Output = T> + PartialOrd,
    {
        abs(self.dot(other))
    }

    /// Returns the cross product with another vector.
    ///
    /// * `other` - The other vector.
    pub fn cross(&self, other: &Self) -> Self
    where
        T: std::ops::Sub<Output = T>,
    {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

impl Vector3f {
    /// Returns true if either coordinate is NaN.
    pub fn has_nans(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    /// Returns the vector's length.
    pub fn length(&self) -> Float {
        self.length_squared().sqrt()
    }

    /// Returns the unit vector pointing in the same direction.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        assert!(len > 0.0, "cannot normalize a zero length vector");
        *self / len
    }
}

impl<T: Num + Copy> Add for Vector3<T> {
    type Output = Self;

    /// Adds the given vector and returns the result.
    ///
    /// * `other` - The vector to add.
    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl<T: Num + Copy> AddAssign for Vector3<T> {
    /// Performs the `+=` operation.
    ///
    /// * `other` - The vector to add.
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl<T: Num + Copy> Sub for Vector3<T> {
    type Output = Self;

    /// Subtracts the given vector and returns the result.
    ///
    /// * `other` - The vector to subtract.
    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl<T: Num + Copy> SubAssign for Vector3<T> {
    /// Performs the `-=` operation.
    ///
    /// * `other` - The vector to subtract.
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl<T: Num + Copy> Mul<T> for Vector3<T> {
    type Output = Self;

    /// Scales the vector.
    ///
    /// * `f` - The scaling factor.
    fn mul(self, f: T) -> Self::Output {
        Self::new(self.x * f, self.y * f, self.z * f)
    }
}

impl<T: Num + Copy> MulAssign<T> for Vector3<T> {
    /// Performs the `*=` operation.
    ///
    /// * `f` - The scaling factor.
    fn mul_assign(&mut self, f: T) {
        *self = *self * f;
    }
}

impl Mul<Vector3f> for Float {
    type Output = Vector3f;

    /// Scales the vector.
    ///
    /// * `v` - The vector to scale.
    fn mul(self, v: Vector3f) -> Self::Output {
        v * self
    }
}

impl<T: Num + Copy> Div<T> for Vector3<T> {
    type Output = Self;

    /// Divides the vector by a scalar.
    ///
    /// * `f` - The divisor.
    fn div(self, f: T) -> Self::Output {
        debug_assert!(!f.is_zero());
        Self::new(self.x / f, self.y / f, self.z / f)
    }
}

impl<T: Num + Neg<Output = T> + Copy> Neg for Vector3<T> {
    type Output = Self;

    /// Returns the vector pointing in the opposite direction.
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl<T> Index<Axis> for Vector3<T> {
    type Output = T;

    /// Indexes the vector by axis.
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

impl<T> From<Point3<T>> for Vector3<T> {
    /// Convert a 3-D point to a 3-D vector.
    ///
    /// * `p` - 3-D point.
    fn from(p: Point3<T>) -> Self {
        Self { x: p.x, y: p.y, z: p.z }
    }
}

impl<T> From<Normal3<T>> for Vector3<T> {
    /// Convert a 3-D normal to a 3-D vector.
    ///
    /// * `n` - 3-D normal.
    fn from(n: Normal3<T>) -> Self {
        Self { x: n.x, y: n.y, z: n.z }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_vector() {
        assert!(Vector3::new(0, 0, 0) == Vector3::zero());
        assert!(Vector3::new(0.0, 0.0, 0.0) == Vector3::zero());
    }

    #[test]
    #[should_panic]
    fn normalize_zero() {
        Vector3f::zero().normalize();
    }

    fn vector3_f32() -> impl Strategy<Value = Vector3f> {
        (-100.0..100.0f32, -100.0..100.0f32, -100.0..100.0f32).prop_map(|(x, y, z)| Vector3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn length_squared_f32(v in vector3_f32()) {
            prop_assert_eq!(v.length_squared(), v.x * v.x + v.y * v.y + v.z * v.z);
        }

        #[test]
        fn dot_f32(v1 in vector3_f32(), v2 in vector3_f32()) {
            prop_assert_eq!(v1.dot(&v2), v1.x * v2.x + v1.y * v2.y + v1.z * v2.z);
            prop_assert!(v1.abs_dot(&v2) >= 0.0);
        }

        #[test]
        fn neg_f32(v in vector3_f32()) {
            prop_assert_eq!(-v, Vector3::new(-v.x, -v.y, -v.z));
        }
    }
}
