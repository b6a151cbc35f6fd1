// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::primitives::{quniform_params, refbilevel_window};

/// `BoolEncoder` is the boolean range encoder matching [`super::BoolDecoder`].
///
/// It exists to produce coded streams for tests and fuzzing. It is not part of the decoding
/// path.
pub struct BoolEncoder {
    low: u32,
    range: u32,
    count: i32,
    bits_written: u32,
    buf: Vec<u8>,
}

impl Default for BoolEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BoolEncoder {
    pub fn new() -> Self {
        BoolEncoder { low: 0, range: 255, count: -24, bits_written: 0, buf: Vec::new() }
    }

    /// The number of binary symbols written so far.
    pub fn bits_written(&self) -> u32 {
        self.bits_written
    }

    /// Encodes one binary symbol where `prob` is the probability, out of 256, of `false`.
    pub fn write_bool(&mut self, bit: bool, prob: u8) {
        let split = 1 + (((self.range - 1) * u32::from(prob)) >> 8);

        let mut low = self.low;
        let mut range = split;

        if bit {
            low += split;
            range = self.range - split;
        }

        let mut shift = range.leading_zeros() - (u32::BITS - 8);

        range <<= shift;

        let mut count = self.count + shift as i32;

        if count >= 0 {
            let offset = shift as i32 - count;

            // Propagate the carry into the bytes already written.
            if (low << (offset - 1)) & 0x8000_0000 != 0 {
                for byte in self.buf.iter_mut().rev() {
                    if *byte == 0xff {
                        *byte = 0;
                    }
                    else {
                        *byte += 1;
                        break;
                    }
                }
            }

            self.buf.push((low >> (24 - offset)) as u8);

            low <<= offset;
            shift = count as u32;
            low &= 0xff_ffff;
            count -= 8;
        }

        low <<= shift;

        self.low = low;
        self.range = range;
        self.count = count;
        self.bits_written += 1;
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.write_bool(bit, 128);
    }

    /// Encodes the low `bit_width` bits of `literal`, most-significant bit first.
    pub fn write_literal(&mut self, literal: u32, bit_width: u32) {
        for bit in (0..bit_width).rev() {
            self.write_bit((literal >> bit) & 1 == 1);
        }
    }

    pub fn write_primitive_symmetric(&mut self, value: i32, abs_bits: u32) {
        if value == 0 {
            self.write_bit(false);
        }
        else {
            self.write_bit(true);
            self.write_bit(value < 0);
            self.write_literal(value.unsigned_abs() - 1, abs_bits);
        }
    }

    pub fn write_primitive_quniform(&mut self, n: u16, value: u16) {
        if n <= 1 {
            return;
        }

        let (l, m) = quniform_params(n);
        let v = u32::from(value);

        if v < m {
            self.write_literal(v, l - 1);
        }
        else {
            self.write_literal(m + ((v - m) >> 1), l - 1);
            self.write_bit((v - m) & 1 == 1);
        }
    }

    pub fn write_primitive_refbilevel(&mut self, n: u16, p: u16, reference: u16, value: u16) {
        if n <= 1 {
            return;
        }

        let (lo, hi) = refbilevel_window(n, p, reference);
        let v = i32::from(value);

        if v >= lo && v <= hi {
            self.write_bit(true);
            self.write_primitive_quniform(p, (v - lo) as u16);
        }
        else {
            self.write_bit(false);
            let v = if v > hi { v - i32::from(p) } else { v };
            self.write_primitive_quniform(n - p, v as u16);
        }
    }

    /// Flushes the coder and returns the coded bytes.
    pub fn finish(mut self) -> Vec<u8> {
        for _ in 0..32 {
            self.write_bit(false);
        }
        self.buf
    }
}
