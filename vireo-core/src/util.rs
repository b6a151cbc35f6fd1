// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `util` module provides a repository of commonly used utility functions sorted into distinct
//! categories.
//!
//! If a function is used all-over the codebase, and does not belong to specific top-level module,
//! it should be placed here.

pub mod bits {
    //! Utilities for bit manipulation.

    /// Returns the index of the most significant set bit of `value`. `value` must be non-zero.
    #[inline(always)]
    pub fn msb(value: u32) -> u32 {
        debug_assert!(value != 0);
        31 - value.leading_zeros()
    }

    /// Divides `value` by `2^n`, rounding to the nearest integer with ties rounding up.
    #[inline(always)]
    pub fn round_power_of_two(value: i64, n: u32) -> i64 {
        if n == 0 {
            return value;
        }
        (value + (1 << (n - 1))) >> n
    }

    /// Divides `value` by `2^n`, rounding the magnitude to the nearest integer and preserving the
    /// sign.
    #[inline(always)]
    pub fn round_power_of_two_signed(value: i64, n: u32) -> i64 {
        if value < 0 {
            -round_power_of_two(-value, n)
        }
        else {
            round_power_of_two(value, n)
        }
    }
}

pub mod clamp {
    //! Utilities for clamping integers.

    /// Clamps `value` to the inclusive range `[lo, hi]`.
    #[inline(always)]
    pub fn clamp_i32(value: i32, lo: i32, hi: i32) -> i32 {
        debug_assert!(lo <= hi);
        if value < lo {
            lo
        }
        else if value > hi {
            hi
        }
        else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::bits::*;
    use super::clamp::*;

    #[test]
    fn verify_msb() {
        assert_eq!(msb(1), 0);
        assert_eq!(msb(2), 1);
        assert_eq!(msb(3), 1);
        assert_eq!(msb(255), 7);
        assert_eq!(msb(256), 8);
        assert_eq!(msb(u32::MAX), 31);
    }

    #[test]
    fn verify_round_power_of_two_signed() {
        assert_eq!(round_power_of_two_signed(0, 14), 0);
        assert_eq!(round_power_of_two_signed(8192, 14), 1);
        assert_eq!(round_power_of_two_signed(8191, 14), 0);
        assert_eq!(round_power_of_two_signed(-8192, 14), -1);
        assert_eq!(round_power_of_two_signed(-8191, 14), 0);
        assert_eq!(round_power_of_two_signed(-24576, 14), -2);
        assert_eq!(round_power_of_two_signed(5, 0), 5);
    }

    #[test]
    fn verify_clamp_i32() {
        assert_eq!(clamp_i32(-3, 0, 63), 0);
        assert_eq!(clamp_i32(70, 0, 63), 63);
        assert_eq!(clamp_i32(17, 0, 63), 17);
    }
}
