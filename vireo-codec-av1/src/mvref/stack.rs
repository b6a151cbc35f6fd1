// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use smallvec::SmallVec;

use crate::common::Mv;

use super::{GLOBALMV_OFFSET, MAX_REF_MV_STACK_SIZE, REFMV_OFFSET};

/// A motion vector candidate. `comp_mv` is only meaningful for compound hypotheses and is zero
/// otherwise.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateMv {
    pub this_mv: Mv,
    pub comp_mv: Mv,
    pub weight: u16,
}

/// `CandidateStack` is the ordered list of motion vector candidates of a block.
///
/// Entries are unique by `(this_mv, comp_mv)`. The first [`CandidateStack::nearest_count`]
/// entries were found adjacent to the block.
#[derive(Clone, Debug, Default)]
pub struct CandidateStack {
    entries: SmallVec<[CandidateMv; MAX_REF_MV_STACK_SIZE]>,
    nearest: usize,
}

impl CandidateStack {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of entries found by the nearest spatial scan.
    pub fn nearest_count(&self) -> usize {
        self.nearest
    }

    pub fn get(&self, idx: usize) -> Option<&CandidateMv> {
        self.entries.get(idx)
    }

    pub fn as_slice(&self) -> &[CandidateMv] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CandidateMv> {
        self.entries.iter()
    }

    fn position(&self, this_mv: Mv, comp_mv: Mv) -> Option<usize> {
        self.entries.iter().position(|e| e.this_mv == this_mv && e.comp_mv == comp_mv)
    }

    /// Adds `weight` to the entry holding the same vectors, or appends a new entry if there is
    /// none and the stack is not full.
    pub(super) fn add(&mut self, this_mv: Mv, comp_mv: Mv, weight: u16) {
        match self.position(this_mv, comp_mv) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.weight = entry.weight.saturating_add(weight);
            }
            None => {
                if self.entries.len() < MAX_REF_MV_STACK_SIZE {
                    self.entries.push(CandidateMv { this_mv, comp_mv, weight });
                }
            }
        }
    }

    /// Appends an entry with no duplicate check.
    pub(super) fn push(&mut self, this_mv: Mv, comp_mv: Mv, weight: u16) {
        if self.entries.len() < MAX_REF_MV_STACK_SIZE {
            self.entries.push(CandidateMv { this_mv, comp_mv, weight });
        }
    }

    /// Appends `this_mv` unless an entry already holds it.
    pub(super) fn push_unique(&mut self, this_mv: Mv, weight: u16) {
        if !self.entries.iter().any(|e| e.this_mv == this_mv) {
            self.push(this_mv, Mv::ZERO, weight);
        }
    }

    /// Closes the nearest partition and adds `bonus` to all of its entries.
    pub(super) fn mark_nearest(&mut self, bonus: u16) {
        self.nearest = self.entries.len();

        for entry in self.entries.iter_mut() {
            entry.weight = entry.weight.saturating_add(bonus);
        }
    }

    /// Sorts the nearest partition and the remainder independently by descending weight. Equal
    /// weights keep their insertion order.
    pub(super) fn sort(&mut self) {
        let nearest = self.nearest;
        bubble_sort(&mut self.entries[..nearest]);
        bubble_sort(&mut self.entries[nearest..]);
    }

    pub(super) fn for_each_mut<F: FnMut(&mut CandidateMv)>(&mut self, f: F) {
        self.entries.iter_mut().for_each(f)
    }
}

fn bubble_sort(entries: &mut [CandidateMv]) {
    let mut len = entries.len();

    while len > 0 {
        let mut last_swap = 0;

        for idx in 1..len {
            if entries[idx - 1].weight < entries[idx].weight {
                entries.swap(idx - 1, idx);
                last_swap = idx;
            }
        }

        len = last_swap;
    }
}

/// The inter mode context of a reference frame hypothesis.
///
/// Bits 0..3 hold the new motion vector context, bit 3 the global motion context, and bits 4..8
/// the reference motion vector context.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ModeContext(pub u16);

impl ModeContext {
    const NEWMV_CTX_MASK: u16 = (1 << GLOBALMV_OFFSET) - 1;
    const GLOBALMV_CTX_MASK: u16 = (1 << (REFMV_OFFSET - GLOBALMV_OFFSET)) - 1;
    const REFMV_CTX_MASK: u16 = (1 << (8 - REFMV_OFFSET)) - 1;

    pub fn newmv_ctx(self) -> u16 {
        self.0 & Self::NEWMV_CTX_MASK
    }

    pub fn globalmv_ctx(self) -> u16 {
        (self.0 >> GLOBALMV_OFFSET) & Self::GLOBALMV_CTX_MASK
    }

    pub fn refmv_ctx(self) -> u16 {
        (self.0 >> REFMV_OFFSET) & Self::REFMV_CTX_MASK
    }

    pub(super) fn set_globalmv(&mut self) {
        self.0 |= 1 << GLOBALMV_OFFSET;
    }

    /// Derives the new and reference motion vector contexts from the number of nearest scans
    /// (`nearest_match`) and of all scans (`ref_match`) that found a matching candidate, and
    /// from the number of matches coded with a new motion vector.
    pub(super) fn set_match_context(&mut self, nearest_match: u8, ref_match: u8, newmv: u32) {
        let (newmv_ctx, refmv_ctx) = match nearest_match {
            0 => {
                let refmv_ctx = match ref_match {
                    0 => 0,
                    1 => 1,
                    _ => 2,
                };
                (u16::from(ref_match >= 1), refmv_ctx)
            }
            1 => {
                let refmv_ctx = match ref_match {
                    0 => 0,
                    1 => 3,
                    _ => 4,
                };
                (if newmv > 0 { 2 } else { 3 }, refmv_ctx)
            }
            _ => (if newmv >= 1 { 4 } else { 5 }, 5),
        };

        self.0 |= newmv_ctx | (refmv_ctx << REFMV_OFFSET);
    }
}
