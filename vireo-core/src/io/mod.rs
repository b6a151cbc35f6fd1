// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements entropy-coded symbol I/O.
//!
//! All entropy decoders implement the [`SymbolDecoder`] trait, which exposes probability-weighted
//! binary decisions and the fixed-width literals and binary trees composed from them. The
//! [`ReadPrimitives`] extension trait layers the variable-length primitive integer codes on top of
//! any [`SymbolDecoder`].
//!
//! A `Decoder` consumes a `&[u8]` strictly forward. Each tile of a frame owns its own decoder and
//! its own slice of the compressed buffer, so decoders may be used concurrently on different
//! tiles.

mod bool_decoder;
#[cfg(any(test, feature = "test-util"))]
mod bool_encoder;
mod primitives;

pub use bool_decoder::BoolDecoder;
#[cfg(any(test, feature = "test-util"))]
pub use bool_encoder::BoolEncoder;
pub use primitives::ReadPrimitives;

/// An index into a binary tree encoded as a flat array. Positive values index the next pair of
/// children, while zero or negative values are leaves holding the negated symbol.
pub type TreeIndex = i32;

/// `Decrypt` transforms ciphertext bytes into plaintext bytes before they are interpreted as coded
/// bits.
///
/// A decoder invokes the callback exactly once per buffered chunk, synchronously, with equal
/// length `src` and `dst` slices. Any state required by the cipher lives in the implementor.
pub trait Decrypt {
    /// Decrypts `src` into `dst`.
    fn decrypt(&mut self, dst: &mut [u8], src: &[u8]);
}

impl<F: FnMut(&mut [u8], &[u8])> Decrypt for F {
    fn decrypt(&mut self, dst: &mut [u8], src: &[u8]) {
        self(dst, src)
    }
}

/// `SymbolDecoder` provides methods to decode binary symbols coded with an adaptive binary
/// arithmetic coder.
///
/// Reading past the end of the underlying buffer is never an error at this layer. Decoders must
/// return deterministic bits once exhausted and report the condition through
/// [`SymbolDecoder::has_error`].
pub trait SymbolDecoder {
    /// Decodes one binary symbol where `prob` is the probability, out of 256, that the symbol is
    /// `false`. `prob` must be in the range `[1, 255]`.
    fn read_bool(&mut self, prob: u8) -> bool;

    /// Returns true if symbols were decoded after the end of the buffer was reached.
    fn has_error(&self) -> bool;

    /// Decodes one equiprobable bit.
    #[inline(always)]
    fn read_bit(&mut self) -> bool {
        self.read_bool(128)
    }

    /// Decodes a `bit_width`-bit unsigned literal, most-significant bit first.
    #[inline(always)]
    fn read_literal(&mut self, bit_width: u32) -> u32 {
        debug_assert!(bit_width <= 32);

        let mut literal = 0;

        for bit in (0..bit_width).rev() {
            literal |= u32::from(self.read_bit()) << bit;
        }

        literal
    }

    /// Decodes a symbol coded with the binary tree `tree`. The probability of taking the left
    /// branch of the node at index `i` is `probs[i >> 1]`.
    fn read_tree(&mut self, tree: &[TreeIndex], probs: &[u8]) -> u32 {
        let mut i: TreeIndex = 0;

        loop {
            let prob = probs[(i >> 1) as usize];
            i = tree[(i + TreeIndex::from(self.read_bool(prob))) as usize];

            if i <= 0 {
                break;
            }
        }

        (-i) as u32
    }
}
