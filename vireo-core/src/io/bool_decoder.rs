// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp::min;
use std::fmt;

use log::warn;

use crate::errors::{decode_error, invalid_buffer_error, Result};

use super::{Decrypt, SymbolDecoder};

/// The width of the value accumulator in bits.
const VALUE_SIZE: i32 = u64::BITS as i32;

/// Added to the bit count once the buffer is exhausted. The count can then never drop below zero
/// again, so no further fills are attempted, yet a read past the end is still observable.
const LOTS_OF_BITS: i32 = 0x4000_0000;

/// Maximum number of bytes decrypted per fill.
const CLEAR_BUFFER_LEN: usize = std::mem::size_of::<u64>() + 1;

/// `BoolDecoder` is the boolean range decoder.
///
/// The decoder keeps an 8-bit coding interval, `range`, that always lies in `[128, 256)` between
/// reads. Coded bits are buffered high-order aligned in a 64-bit accumulator, `value`, of which the
/// top 8 bits take part in the comparison against the split point. `count` is the number of
/// buffered bits beyond those 8.
pub struct BoolDecoder<'a> {
    value: u64,
    count: i32,
    range: u32,
    buf: &'a [u8],
    pos: usize,
    decrypt: Option<&'a mut dyn Decrypt>,
}

impl<'a> BoolDecoder<'a> {
    /// Instantiate a new `BoolDecoder` over `buf`.
    pub fn new(buf: &'a [u8]) -> Result<Self> {
        Self::init(buf, None)
    }

    /// Instantiate a new `BoolDecoder` over `buf` where every buffered chunk is passed through
    /// `decrypt` before use.
    pub fn with_decrypt(buf: &'a [u8], decrypt: &'a mut dyn Decrypt) -> Result<Self> {
        Self::init(buf, Some(decrypt))
    }

    fn init(buf: &'a [u8], decrypt: Option<&'a mut dyn Decrypt>) -> Result<Self> {
        if buf.is_empty() {
            return invalid_buffer_error("bool decoder requires at least one byte");
        }

        let mut decoder = BoolDecoder { value: 0, count: -8, range: 255, buf, pos: 0, decrypt };

        decoder.fill();

        Ok(decoder)
    }

    /// Refills the value accumulator from the buffer.
    ///
    /// Once the buffer is exhausted, `LOTS_OF_BITS` is added to the count and the accumulator is
    /// left to shift in zero bits from then on.
    fn fill(&mut self) {
        let bytes_left = self.buf.len() - self.pos;
        let bits_left = (bytes_left * 8) as i64;

        let mut shift = VALUE_SIZE - 8 - (self.count + 8);
        let mut value = self.value;
        let mut count = self.count;

        let mut clear = [0u8; CLEAR_BUFFER_LEN];

        let src: &[u8] = match self.decrypt.as_mut() {
            Some(decrypt) => {
                let len = min(CLEAR_BUFFER_LEN, bytes_left);
                decrypt.decrypt(&mut clear[..len], &self.buf[self.pos..self.pos + len]);
                &clear[..len]
            }
            None => &self.buf[self.pos..],
        };

        let consumed;

        if bits_left > i64::from(VALUE_SIZE) {
            // Bulk load as many whole bytes as fit below the bits still buffered.
            let bits = (shift & !7) + 8;

            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&src[..8]);

            let next = u64::from_be_bytes(bytes) >> (VALUE_SIZE - bits);

            count += bits;
            value |= next << (shift & 7);
            consumed = (bits >> 3) as usize;
        }
        else {
            let bits_over = i64::from(shift) + 8 - bits_left;
            let mut loop_end = 0;

            if bits_over >= 0 {
                count += LOTS_OF_BITS;
                loop_end = bits_over as i32;
            }

            let mut n = 0;

            if bits_over < 0 || bits_left > 0 {
                while shift >= loop_end {
                    count += 8;
                    value |= u64::from(src[n]) << shift;
                    shift -= 8;
                    n += 1;
                }
            }

            consumed = n;
        }

        self.pos += consumed;
        self.value = value;
        self.count = count;
    }

    /// Returns the offset of the first byte of the buffer that has not been used by decoded
    /// symbols. Whole bytes that were fetched into the accumulator but never shifted into the
    /// coding window are given back.
    pub fn find_end(&self) -> usize {
        let mut count = self.count;
        let mut pos = self.pos;

        while count > 8 && count < VALUE_SIZE {
            count -= 8;
            pos = pos.saturating_sub(1);
        }

        pos
    }

    /// Returns an error if any symbol was decoded after the end of the buffer was reached.
    pub fn check_exhausted(&self) -> Result<()> {
        if self.has_error() {
            warn!("bool decoder read {} byte buffer past its end", self.buf.len());
            return decode_error("bool decoder read past end of buffer");
        }
        Ok(())
    }
}

impl SymbolDecoder for BoolDecoder<'_> {
    #[inline(always)]
    fn read_bool(&mut self, prob: u8) -> bool {
        debug_assert!(prob > 0);

        let prob = u32::from(prob);
        let split = (self.range * prob + (256 - prob)) >> 8;

        if self.count < 0 {
            self.fill();
        }

        let mut value = self.value;
        let mut range = split;

        let big_split = u64::from(split) << (VALUE_SIZE - 8);

        let bit = value >= big_split;

        if bit {
            range = self.range - split;
            value -= big_split;
        }

        // Normalize the range back into [128, 256).
        let shift = range.leading_zeros() - (u32::BITS - 8);

        self.range = range << shift;
        self.value = value << shift;
        self.count -= shift as i32;

        bit
    }

    #[inline(always)]
    fn has_error(&self) -> bool {
        self.count > VALUE_SIZE && self.count < LOTS_OF_BITS
    }
}

impl fmt::Debug for BoolDecoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoolDecoder")
            .field("value", &self.value)
            .field("count", &self.count)
            .field("range", &self.range)
            .field("pos", &self.pos)
            .field("len", &self.buf.len())
            .field("decrypt", &self.decrypt.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::BoolDecoder;
    use crate::errors::Error;
    use crate::io::{BoolEncoder, SymbolDecoder, TreeIndex};

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn verify_init_rejects_empty_buffer() {
        match BoolDecoder::new(&[]) {
            Err(Error::InvalidBuffer(_)) => (),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn verify_range_stays_normalized() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let buf: Vec<u8> = (0..64).map(|_| rng.random()).collect();

        let mut bs = BoolDecoder::new(&buf).unwrap();

        for _ in 0..1000 {
            bs.read_bool(rng.random_range(1..=255));
            assert!(bs.range >= 128 && bs.range < 256);
        }
    }

    #[test]
    fn verify_encoded_literals() {
        // Eight 0xaa literals as produced by the boolean encoder.
        let buf = [0xaa, 0x55, 0x55, 0x55, 0x55, 0x55, 0x55, 0x54, 0xac, 0x00];

        let mut bs = BoolDecoder::new(&buf).unwrap();

        for _ in 0..8 {
            assert_eq!(bs.read_literal(8), 0xaa);
        }

        assert!(!bs.has_error());
    }

    #[test]
    fn verify_raw_alternating_bytes() {
        // Raw bytes are not a boolean coded stream. The output is fixed nonetheless.
        let buf = [0xaa; 64];

        let mut bs = BoolDecoder::new(&buf).unwrap();

        let literals: Vec<u32> = (0..8).map(|_| bs.read_literal(8)).collect();

        assert_eq!(literals, [0xab, 0x00, 0xac, 0x02, 0xb0, 0x0a, 0xc0, 0x2b]);
        assert!(!bs.has_error());
    }

    #[test]
    fn verify_encoder_round_trip() {
        let mut rng = SmallRng::seed_from_u64(1);

        for _ in 0..50 {
            let symbols: Vec<(bool, u8)> =
                (0..500).map(|_| (rng.random_bool(0.5), rng.random_range(1..=255))).collect();

            let mut enc = BoolEncoder::new();

            for &(bit, prob) in &symbols {
                enc.write_bool(bit, prob);
            }

            let buf = enc.finish();

            let mut bs = BoolDecoder::new(&buf).unwrap();

            for &(bit, prob) in &symbols {
                assert_eq!(bs.read_bool(prob), bit);
            }

            assert!(!bs.has_error());
            assert!(bs.check_exhausted().is_ok());
        }
    }

    #[test]
    fn verify_exhaustion_is_sticky() {
        for &size in &[1, 2, 4, 8, 9, 16, 64] {
            let buf = vec![0u8; size];
            let mut bs = BoolDecoder::new(&buf).unwrap();

            let mut prev = false;

            for i in 0..8 * size + 64 {
                bs.read_bit();

                let err = bs.has_error();

                if i < 8 * size - 8 {
                    assert!(!err, "size {} read {}", size, i);
                }
                if i >= 8 * size + 8 {
                    assert!(err, "size {} read {}", size, i);
                }

                // Once set, the error must stay set.
                assert!(!prev || err);
                prev = err;
            }

            // Zero input decodes as zero bits, before and after exhaustion.
            assert!(!bs.read_bit());
            assert_eq!(bs.read_literal(16), 0);

            match bs.check_exhausted() {
                Err(Error::DecodeError(_)) => (),
                other => panic!("unexpected result {:?}", other),
            }
        }
    }

    #[test]
    fn verify_read_tree() {
        // A three symbol tree: symbol 0 on the left, then symbols 1 and 2.
        const TREE: [TreeIndex; 4] = [0, 2, -1, -2];
        const PROBS: [u8; 2] = [100, 200];

        let mut enc = BoolEncoder::new();

        // Symbol 2, symbol 0, symbol 1.
        enc.write_bool(true, PROBS[0]);
        enc.write_bool(true, PROBS[1]);
        enc.write_bool(false, PROBS[0]);
        enc.write_bool(true, PROBS[0]);
        enc.write_bool(false, PROBS[1]);

        let buf = enc.finish();
        let mut bs = BoolDecoder::new(&buf).unwrap();

        assert_eq!(bs.read_tree(&TREE, &PROBS), 2);
        assert_eq!(bs.read_tree(&TREE, &PROBS), 0);
        assert_eq!(bs.read_tree(&TREE, &PROBS), 1);
    }

    #[test]
    fn verify_decrypt_callback() {
        let mut enc = BoolEncoder::new();

        for i in 0..200u32 {
            enc.write_literal(i & 0xff, 8);
        }

        let plain = enc.finish();
        let cipher: Vec<u8> = plain.iter().map(|b| b ^ 0x5a).collect();

        let mut calls = 0;
        let mut xor = |dst: &mut [u8], src: &[u8]| {
            calls += 1;
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s ^ 0x5a;
            }
        };

        {
            let mut bs = BoolDecoder::with_decrypt(&cipher, &mut xor).unwrap();

            for i in 0..200u32 {
                assert_eq!(bs.read_literal(8), i & 0xff);
            }

            assert!(!bs.has_error());
        }

        assert!(calls > 0);
    }

    #[test]
    fn verify_find_end() {
        let mut enc = BoolEncoder::new();

        for _ in 0..4 {
            enc.write_literal(0x3c, 8);
        }

        let mut buf = enc.finish();
        let coded_len = buf.len();

        // Trailing data that follows the coded symbols.
        buf.extend_from_slice(&[0xff; 32]);

        let mut bs = BoolDecoder::new(&buf).unwrap();

        for _ in 0..4 {
            assert_eq!(bs.read_literal(8), 0x3c);
        }

        assert_eq!(bs.find_end(), coded_len);
    }
}
