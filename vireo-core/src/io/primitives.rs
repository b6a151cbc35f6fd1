// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::errors::{logic_error, Result};
use crate::util::bits::msb;

use super::SymbolDecoder;

/// Computes the window `[lo, hi]` of `p` values centred on `reference` and clipped to `[0, n)`.
#[inline(always)]
pub(crate) fn refbilevel_window(n: u16, p: u16, reference: u16) -> (i32, i32) {
    let (n, p) = (i32::from(n), i32::from(p));

    let mut lo = i32::from(reference) - p / 2;
    let mut hi = lo + p - 1;

    if lo < 0 {
        lo = 0;
        hi = p - 1;
    }
    else if hi >= n {
        hi = n - 1;
        lo = n - p;
    }

    (lo, hi)
}

/// Returns the literal width `l` and the short code count `m` of the quasi-uniform code for `n`
/// values. `n` must be at least 2.
#[inline(always)]
pub(crate) fn quniform_params(n: u16) -> (u32, u32) {
    debug_assert!(n > 1);

    let l = msb(u32::from(n) - 1) + 1;
    let m = (1 << l) - u32::from(n);

    (l, m)
}

/// `ReadPrimitives` decodes the variable-length primitive integer codes built on top of any
/// [`SymbolDecoder`]. The codes keep no state of their own.
pub trait ReadPrimitives: SymbolDecoder {
    /// Decodes a signed value coded as a presence bit, a sign bit, and an `abs_bits`-bit literal
    /// holding the magnitude minus one.
    fn read_primitive_symmetric(&mut self, abs_bits: u32) -> i32 {
        if !self.read_bit() {
            return 0;
        }

        let sign = self.read_bit();
        let x = self.read_literal(abs_bits) as i32 + 1;

        if sign {
            -x
        }
        else {
            x
        }
    }

    /// Decodes a value in `[0, n)` with a quasi-uniform code. The first `2^l - n` values are
    /// coded with `l - 1` bits, the remainder with `l` bits, where `l = floor(log2(n - 1)) + 1`.
    fn read_primitive_quniform(&mut self, n: u16) -> u16 {
        if n <= 1 {
            return 0;
        }

        let (l, m) = quniform_params(n);
        let v = self.read_literal(l - 1);

        if v < m {
            v as u16
        }
        else {
            ((v << 1) - m + u32::from(self.read_bit())) as u16
        }
    }

    /// Decodes a value in `[0, n)` that is expected to lie close to `reference`.
    ///
    /// The `p` values nearest to `reference` are coded with a `p`-ary quasi-uniform code, and the
    /// remaining `n - p` values with an `n - p`-ary quasi-uniform code. Requires `0 < p < n` and
    /// `reference < n` whenever `n > 1`.
    fn read_primitive_refbilevel(&mut self, n: u16, p: u16, reference: u16) -> Result<u16> {
        if n <= 1 {
            return Ok(0);
        }
        if p == 0 || p >= n {
            return logic_error("refbilevel window size out of range");
        }
        if reference >= n {
            return logic_error("refbilevel reference out of range");
        }

        let (lo, _) = refbilevel_window(n, p, reference);

        let v = if self.read_bit() {
            i32::from(self.read_primitive_quniform(p)) + lo
        }
        else {
            let v = i32::from(self.read_primitive_quniform(n - p));
            if v >= lo {
                v + i32::from(p)
            }
            else {
                v
            }
        };

        Ok(v as u16)
    }
}

impl<D: SymbolDecoder + ?Sized> ReadPrimitives for D {}

#[cfg(test)]
mod tests {
    use super::{quniform_params, ReadPrimitives};
    use crate::errors::Error;
    use crate::io::{BoolDecoder, BoolEncoder, SymbolDecoder};

    use proptest::prelude::*;

    /// A decoder over a fixed bit sequence that counts the bits consumed.
    struct BitSource {
        bits: Vec<bool>,
        pos: usize,
    }

    impl BitSource {
        fn new(bits: &[bool]) -> Self {
            BitSource { bits: bits.to_vec(), pos: 0 }
        }
    }

    impl SymbolDecoder for BitSource {
        fn read_bool(&mut self, _prob: u8) -> bool {
            let bit = self.bits.get(self.pos).copied().unwrap_or(false);
            self.pos += 1;
            bit
        }

        fn has_error(&self) -> bool {
            self.pos > self.bits.len()
        }
    }

    #[test]
    fn verify_symmetric_bit_pattern() {
        // abs_bits = 4, v = -7: presence, sign, then 6 as a 4-bit literal.
        let mut enc = BoolEncoder::new();
        enc.write_primitive_symmetric(-7, 4);

        let mut bits = BitSource::new(&[true, true, false, true, true, false]);
        assert_eq!(bits.read_primitive_symmetric(4), -7);
        assert_eq!(bits.pos, 6);

        let buf = enc.finish();
        let mut bs = BoolDecoder::new(&buf).unwrap();

        assert!(bs.read_bit());
        assert!(bs.read_bit());
        assert_eq!(bs.read_literal(4), 6);
    }

    #[test]
    fn verify_symmetric_zero() {
        let mut bits = BitSource::new(&[false, true, true]);
        assert_eq!(bits.read_primitive_symmetric(8), 0);
        assert_eq!(bits.pos, 1);
    }

    #[test]
    fn verify_quniform_bit_counts() {
        // Both powers of two (where every code is l - 1 bits long) and other sizes.
        for n in 2..=256u16 {
            let (l, m) = quniform_params(n);

            for v in 0..n {
                let mut enc = BoolEncoder::new();
                enc.write_primitive_quniform(n, v);

                let bits = enc.bits_written();

                if u32::from(v) < m {
                    assert_eq!(bits, l - 1, "n {} v {}", n, v);
                }
                else {
                    assert_eq!(bits, l, "n {} v {}", n, v);
                }

                let buf = enc.finish();
                let mut bs = BoolDecoder::new(&buf).unwrap();

                assert_eq!(bs.read_primitive_quniform(n), v);
            }
        }
    }

    #[test]
    fn verify_quniform_trivial() {
        let mut bits = BitSource::new(&[true]);
        assert_eq!(bits.read_primitive_quniform(0), 0);
        assert_eq!(bits.read_primitive_quniform(1), 0);
        assert_eq!(bits.pos, 0);
    }

    #[test]
    fn verify_refbilevel_preconditions() {
        let mut bits = BitSource::new(&[]);

        assert_eq!(bits.read_primitive_refbilevel(1, 0, 0), Ok(0));

        match bits.read_primitive_refbilevel(10, 10, 3) {
            Err(Error::LogicError(_)) => (),
            other => panic!("unexpected result {:?}", other),
        }
        match bits.read_primitive_refbilevel(10, 0, 3) {
            Err(Error::LogicError(_)) => (),
            other => panic!("unexpected result {:?}", other),
        }
        match bits.read_primitive_refbilevel(10, 4, 10) {
            Err(Error::LogicError(_)) => (),
            other => panic!("unexpected result {:?}", other),
        }

        assert_eq!(bits.pos, 0);
    }

    #[test]
    fn verify_refbilevel_window_edges() {
        // Window clipped at the low end: n = 16, p = 4, reference = 0 covers [0, 3].
        let mut enc = BoolEncoder::new();
        enc.write_primitive_refbilevel(16, 4, 0, 3);
        enc.write_primitive_refbilevel(16, 4, 0, 4);
        // Window clipped at the high end: covers [12, 15].
        enc.write_primitive_refbilevel(16, 4, 15, 12);
        enc.write_primitive_refbilevel(16, 4, 15, 11);

        let buf = enc.finish();
        let mut bs = BoolDecoder::new(&buf).unwrap();

        assert_eq!(bs.read_primitive_refbilevel(16, 4, 0), Ok(3));
        assert_eq!(bs.read_primitive_refbilevel(16, 4, 0), Ok(4));
        assert_eq!(bs.read_primitive_refbilevel(16, 4, 15), Ok(12));
        assert_eq!(bs.read_primitive_refbilevel(16, 4, 15), Ok(11));
    }

    proptest! {
        #[test]
        fn symmetric_round_trip(abs_bits in 1u32..=12, seed in any::<i32>()) {
            let max = 1i32 << abs_bits;
            let v = seed.rem_euclid(2 * max + 1) - max;

            let mut enc = BoolEncoder::new();
            enc.write_primitive_symmetric(v, abs_bits);

            let buf = enc.finish();
            let mut bs = BoolDecoder::new(&buf).unwrap();

            prop_assert_eq!(bs.read_primitive_symmetric(abs_bits), v);
            prop_assert!(!bs.has_error());
        }

        #[test]
        fn refbilevel_round_trip(
            n in 2u16..=512,
            p_seed in any::<u16>(),
            r_seed in any::<u16>(),
            v_seed in any::<u16>(),
        ) {
            let p = 1 + p_seed % (n - 1);
            let reference = r_seed % n;
            let v = v_seed % n;

            let mut enc = BoolEncoder::new();
            enc.write_primitive_refbilevel(n, p, reference, v);

            let buf = enc.finish();
            let mut bs = BoolDecoder::new(&buf).unwrap();

            prop_assert_eq!(bs.read_primitive_refbilevel(n, p, reference), Ok(v));
        }

        #[test]
        fn mixed_sequence_round_trip(
            values in proptest::collection::vec((2u16..1000, any::<u16>()), 1..64),
        ) {
            let mut enc = BoolEncoder::new();

            for &(n, v) in &values {
                enc.write_primitive_quniform(n, v % n);
            }

            let buf = enc.finish();
            let mut bs = BoolDecoder::new(&buf).unwrap();

            for &(n, v) in &values {
                prop_assert_eq!(bs.read_primitive_quniform(n), v % n);
            }
        }
    }
}
