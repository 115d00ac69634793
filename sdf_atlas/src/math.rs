// Copyright 2025 the Vello Authors and the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mathematical helper functions.

use core::ops::Sub;

// From <https://github.com/linebender/tiny-skia/blob/68b198a7210a6bbf752b43d6bc4db62445730313/path/src/scalar.rs#L12>
const SCALAR_NEARLY_ZERO: f64 = 1.0 / (1 << 12) as f64;

/// A number of useful methods for f64 numbers.
pub(crate) trait FloatExt: Sized + Sub<f64, Output = f64> {
    /// Whether the number is approximately 0.
    fn is_nearly_zero(&self) -> bool {
        self.is_nearly_zero_within_tolerance(SCALAR_NEARLY_ZERO)
    }

    /// Whether the number is approximately 0, with a given tolerance.
    fn is_nearly_zero_within_tolerance(&self, tolerance: f64) -> bool;
}

impl FloatExt for f64 {
    #[inline(always)]
    fn is_nearly_zero_within_tolerance(&self, tolerance: f64) -> bool {
        debug_assert!(tolerance >= 0.0, "tolerance must be positive");

        self.abs() <= tolerance
    }
}

/// Median of three values.
#[inline]
pub(crate) fn median(a: f32, b: f32, c: f32) -> f32 {
    a.min(b).max(a.max(b).min(c))
}

/// Converts a non-negative float to a pixel count, saturating at `u32::MAX`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "values are clamped to the u32 range first"
)]
#[inline]
pub(crate) fn to_pixels(value: f64) -> u32 {
    value.clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Converts a float to a signed pixel coordinate, saturating at the `i32` range.
#[expect(
    clippy::cast_possible_truncation,
    reason = "values are clamped to the i32 range first"
)]
#[inline]
pub(crate) fn to_coordinate(value: f64) -> i32 {
    value.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_three() {
        assert_eq!(median(0.1, 0.5, 0.9), 0.5);
        assert_eq!(median(0.9, 0.1, 0.5), 0.5);
        assert_eq!(median(0.5, 0.9, 0.1), 0.5);
        assert_eq!(median(0.3, 0.3, 0.9), 0.3);
    }

    #[test]
    fn saturating_conversions() {
        assert_eq!(to_pixels(-3.0), 0);
        assert_eq!(to_pixels(12.9), 12);
        assert_eq!(to_pixels(1e20), u32::MAX);
        assert_eq!(to_coordinate(-12.9), -12);
    }

    #[test]
    fn nearly_zero() {
        assert!(0.0_f64.is_nearly_zero());
        assert!(1e-6_f64.is_nearly_zero());
        assert!(!0.01_f64.is_nearly_zero());
    }
}
