//! 3-D normals

use super::Vector3;
use crate::common::*;
use num_traits::Num;
use std::ops::{Mul, Neg};

/// A 3-D surface normal containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Normal3<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,

    /// Z-coordinate.
    pub z: T,
}

/// 3-D normal containing `Float` values.
pub type Normal3f = Normal3<Float>;

impl<T: Num + Copy> Normal3<T> {
    /// Creates a new 3-D normal.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// Returns the dot product with another normal.
    ///
    /// * `other` - The other normal.
    pub fn dot(&self, other: &Self) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Returns the dot product with a vector.
    ///
    /// * `v` - The vector.
    pub fn dot_vec(&self, v: &Vector3<T>) -> T {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    /// Returns the absolute value of the dot product with a vector.
    ///
    /// * `v` - The vector.
    pub fn abs_dot_vec(&self, v: &Vector3<T>) -> T
    where
        T: Neg<Output = T> + PartialOrd,
    {
        abs(self.dot_vec(v))
    }

    /// Returns this normal, flipped so it lies in the same hemisphere as the
    /// given vector.
    ///
    /// * `v` - The vector.
    pub fn face_forward(&self, v: &Vector3<T>) -> Self
    where
        T: Neg<Output = T> + PartialOrd,
    {
        if self.dot_vec(v) >= T::zero() {
            *self
        } else {
            -*self
        }
    }
}

impl Normal3f {
    /// Returns true if either coordinate is NaN.
    pub fn has_nans(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    /// Returns the unit normal pointing in the same direction.
    pub fn normalize(&self) -> Self {
        let len = self.dot(self).sqrt();
        assert!(len > 0.0, "cannot normalize a zero length normal");
        Self::new(self.x / len, self.y / len, self.z / len)
    }
}

impl<T: Num + Neg<Output = T> + Copy> Neg for Normal3<T> {
    type Output = Self;

    /// Returns the normal pointing in the opposite direction.
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Normal3f> for Float {
    type Output = Normal3f;

    /// Scales the normal; scaling by `-1.0` flips its orientation.
    ///
    /// * `n` - The normal to scale.
    fn mul(self, n: Normal3f) -> Self::Output {
        Normal3::new(self * n.x, self * n.y, self * n.z)
    }
}

impl<T> From<Vector3<T>> for Normal3<T> {
    /// Convert a 3-D vector to a 3-D normal.
    ///
    /// * `v` - 3-D vector.
    fn from(v: Vector3<T>) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_forward_flips_against_hemisphere() {
        let n = Normal3::new(0.0, 1.0, 0.0);
        let up = Vector3::new(0.0, 1.0, 0.0);
        let down = Vector3::new(0.0, -1.0, 0.0);
        assert_eq!(n.face_forward(&up), n);
        assert_eq!(n.face_forward(&down), -n);
    }

    #[test]
    fn mixed_dot_products() {
        let n = Normal3::new(0.0, 1.0, 0.0);
        let v = Vector3::new(0.0, -2.0, 0.0);
        assert_eq!(n.dot_vec(&v), -2.0);
        assert_eq!(n.abs_dot_vec(&v), 2.0);
        assert_eq!(n.dot(&-n), -1.0);
    }
}
