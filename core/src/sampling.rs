//! Low discrepancy sequences

use crate::common::*;
use crate::rng::ONE_MINUS_EPSILON;

/// The first 64 prime numbers, one radix per sample dimension.
pub const PRIMES: [u64; 64] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97, 101, 103, 107,
    109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229,
    233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311,
];

/// Maximum number of sample dimensions supported by `radical_inverse()`.
pub const MAX_SAMPLE_DIMENSIONS: usize = PRIMES.len();

/// Computes the radical inverse of `a` in the prime base selected by
/// `base_index`, the digit-reversed fraction used to build low discrepancy
/// sample points.
///
/// * `base_index` - Selects the prime base (the sample dimension).
/// * `a`          - The sample index.
pub fn radical_inverse(base_index: usize, a: u64) -> Float {
    let base = PRIMES[base_index];

    // Accumulate in f64; the reversed digits of large indices exceed f32
    // precision.
    let inv_base = 1.0 / base as f64;
    let mut reversed_digits: u64 = 0;
    let mut inv_base_n = 1.0;
    let mut a = a;
    while a != 0 {
        let next = a / base;
        let digit = a - next * base;
        reversed_digits = reversed_digits * base + digit;
        inv_base_n *= inv_base;
        a = next;
    }

    min(
        (reversed_digits as f64 * inv_base_n) as Float,
        ONE_MINUS_EPSILON,
    )
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn base_two_bit_reversal() {
        assert_eq!(radical_inverse(0, 0), 0.0);
        assert_eq!(radical_inverse(0, 1), 0.5);
        assert_eq!(radical_inverse(0, 2), 0.25);
        assert_eq!(radical_inverse(0, 3), 0.75);
        assert_eq!(radical_inverse(0, 4), 0.125);
    }

    #[test]
    fn base_three_digit_reversal() {
        assert!((radical_inverse(1, 1) - 1.0 / 3.0).abs() < 1e-6);
        assert!((radical_inverse(1, 2) - 2.0 / 3.0).abs() < 1e-6);
        assert!((radical_inverse(1, 3) - 1.0 / 9.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn stays_in_half_open_interval(dim in 0..MAX_SAMPLE_DIMENSIONS, a in 0u64..u64::MAX / 4) {
            let u = radical_inverse(dim, a);
            prop_assert!((0.0..1.0).contains(&u));
        }
    }
}
