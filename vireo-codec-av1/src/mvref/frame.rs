// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference frame bookkeeping: display order distances, sign bias, skip mode references,
//! short-signaled reference assignment and the motion vectors a decoded frame keeps for the frames
//! that reference it.

use std::sync::Arc;

use log::debug;
use smallvec::SmallVec;

use vireo_core::errors::{decode_error, logic_error, Result};

use crate::common::{Mv, RefFrame, INTER_REFS_PER_FRAME, REF_FRAMES};
use crate::grid::{BlockInfo, ModeInfoGrid};

/// The largest magnitude of a motion vector component that is saved for temporal prediction.
pub const REFMVS_LIMIT: i32 = (1 << 12) - 1;

/// The number of frames held by the reference map.
pub const REF_MAP_SIZE: usize = 8;

/// The references left to assign once LAST and GOLDEN are known, in assignment order.
const SHORT_SIGNALED_REFS: [RefFrame; INTER_REFS_PER_FRAME - 2] =
    [RefFrame::Last2, RefFrame::Last3, RefFrame::BwdRef, RefFrame::AltRef2, RefFrame::AltRef];

/// Order hint coding parameters of a sequence.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderHintInfo {
    pub enable: bool,
    /// The number of bits of an order hint, at most 8.
    pub bits: u32,
}

impl OrderHintInfo {
    /// Order hints enabled with `bits` bits.
    pub fn new(bits: u32) -> Self {
        OrderHintInfo { enable: bits > 0, bits: bits.min(8) }
    }

    /// Gets the signed display order distance from `b` to `a`, accounting for wrap-around of the
    /// order hints. Always 0 if order hints are disabled.
    pub fn relative_dist(&self, a: u32, b: u32) -> i32 {
        if !self.enable || self.bits == 0 {
            return 0;
        }

        let diff = a as i32 - b as i32;
        let m = 1 << (self.bits - 1);

        (diff & (m - 1)) - (diff & m)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameType {
    Key,
    Inter,
    IntraOnly,
    Switch,
}

impl FrameType {
    /// Returns true if frames of this type are coded without inter prediction.
    pub fn is_intra_only(self) -> bool {
        matches!(self, FrameType::Key | FrameType::IntraOnly)
    }
}

/// A motion vector saved for temporal prediction, and the reference it points into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SavedMv {
    pub ref_frame: RefFrame,
    pub mv: Mv,
}

/// `SavedMvs` stores one motion vector per 8x8 luma area of a frame.
#[derive(Clone, Debug)]
pub struct SavedMvs {
    mi_rows: usize,
    mi_cols: usize,
    stride: usize,
    entries: Vec<Option<SavedMv>>,
}

impl SavedMvs {
    pub fn new(mi_rows: usize, mi_cols: usize) -> Self {
        let stride = (mi_cols + 1) >> 1;
        let rows = (mi_rows + 1) >> 1;

        SavedMvs { mi_rows, mi_cols, stride, entries: vec![None; rows * stride] }
    }

    /// Saves the motion vectors of every block of `grid`, in decoding order.
    pub fn from_grid(grid: &ModeInfoGrid, ref_frame_side: &[i8; REF_FRAMES]) -> Self {
        let mut mvs = SavedMvs::new(grid.mi_rows(), grid.mi_cols());

        for (mi_row, mi_col, block) in grid.blocks() {
            mvs.copy_block(block, mi_row, mi_col, ref_frame_side);
        }

        mvs
    }

    /// Saves the motion vector of a decoded block over the 8x8 areas it covers.
    ///
    /// Vectors pointing to references that lie ahead of the frame in display order, or to the
    /// frame itself, are not saved, nor are vectors with a component beyond [`REFMVS_LIMIT`]. The
    /// second reference of a compound block takes precedence.
    pub fn copy_block(
        &mut self,
        block: &BlockInfo,
        mi_row: usize,
        mi_col: usize,
        ref_frame_side: &[i8; REF_FRAMES],
    ) {
        if mi_row >= self.mi_rows || mi_col >= self.mi_cols {
            return;
        }

        let x_mis = (block.size.width_mi().min(self.mi_cols - mi_col) + 1) >> 1;
        let y_mis = (block.size.height_mi().min(self.mi_rows - mi_row) + 1) >> 1;

        let mut saved = None;

        for idx in 0..2 {
            let ref_frame = match block.ref_frame(idx) {
                Some(rf) if rf.is_inter() => rf,
                _ => continue,
            };

            if ref_frame_side[ref_frame.index()] != 0 {
                continue;
            }

            let mv = block.mv[idx];

            if i32::from(mv.row).abs() > REFMVS_LIMIT || i32::from(mv.col).abs() > REFMVS_LIMIT {
                continue;
            }

            saved = Some(SavedMv { ref_frame, mv });
        }

        let row0 = mi_row >> 1;
        let col0 = mi_col >> 1;

        for row in row0..row0 + y_mis {
            let base = row * self.stride;
            self.entries[base + col0..base + col0 + x_mis].fill(saved);
        }
    }

    /// Gets the motion vector saved for the 8x8 area at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<SavedMv> {
        if col < self.stride {
            self.entries.get(row * self.stride + col).copied().flatten()
        }
        else {
            None
        }
    }

    pub fn mi_rows(&self) -> usize {
        self.mi_rows
    }

    pub fn mi_cols(&self) -> usize {
        self.mi_cols
    }
}

/// What a decoded frame keeps for the frames that use it as a reference.
#[derive(Clone, Debug)]
pub struct SavedFrame {
    pub order_hint: u32,
    pub frame_type: FrameType,
    pub mi_rows: usize,
    pub mi_cols: usize,
    /// The order hints of the frame's own references, in slot order.
    pub ref_order_hints: [u32; INTER_REFS_PER_FRAME],
    pub mvs: SavedMvs,
}

impl SavedFrame {
    /// Captures the state of the frame just decoded into `grid` with the references `refs`.
    pub fn new(refs: &FrameRefs, frame_type: FrameType, grid: &ModeInfoGrid) -> Self {
        SavedFrame {
            order_hint: refs.order_hint(),
            frame_type,
            mi_rows: grid.mi_rows(),
            mi_cols: grid.mi_cols(),
            ref_order_hints: refs.ref_order_hints(),
            mvs: SavedMvs::from_grid(grid, &refs.ref_frame_side()),
        }
    }
}

/// `FrameRefs` holds the reference frames of the frame being decoded.
#[derive(Clone, Debug, Default)]
pub struct FrameRefs {
    order_hints: OrderHintInfo,
    order_hint: u32,
    slots: [Option<Arc<SavedFrame>>; INTER_REFS_PER_FRAME],
}

impl FrameRefs {
    /// Instantiate the references of a frame with order hint `order_hint`. All reference slots
    /// start empty.
    pub fn new(order_hints: OrderHintInfo, order_hint: u32) -> Self {
        FrameRefs { order_hints, order_hint, slots: Default::default() }
    }

    /// Assigns a saved frame to the reference `ref_frame`. Assigning to `Intra` has no effect.
    pub fn set(&mut self, ref_frame: RefFrame, frame: Arc<SavedFrame>) {
        if let Some(slot) = Self::slot(ref_frame).and_then(|idx| self.slots.get_mut(idx)) {
            *slot = Some(frame);
        }
    }

    pub fn get(&self, ref_frame: RefFrame) -> Option<&SavedFrame> {
        Self::slot(ref_frame).and_then(|idx| self.slots[idx].as_deref())
    }

    fn slot(ref_frame: RefFrame) -> Option<usize> {
        ref_frame.index().checked_sub(1)
    }

    pub fn order_hints(&self) -> &OrderHintInfo {
        &self.order_hints
    }

    /// The order hint of the current frame.
    pub fn order_hint(&self) -> u32 {
        self.order_hint
    }

    /// The order hint of a reference, or 0 if the reference is missing.
    pub fn ref_order_hint(&self, ref_frame: RefFrame) -> u32 {
        self.get(ref_frame).map_or(0, |frame| frame.order_hint)
    }

    /// The order hints of all references in slot order.
    pub fn ref_order_hints(&self) -> [u32; INTER_REFS_PER_FRAME] {
        let mut hints = [0; INTER_REFS_PER_FRAME];

        for (hint, rf) in hints.iter_mut().zip(RefFrame::INTER) {
            *hint = self.ref_order_hint(rf);
        }

        hints
    }

    /// Gets the display order distance from the current frame to a reference.
    pub fn distance_to(&self, ref_frame: RefFrame) -> i32 {
        self.order_hints.relative_dist(self.order_hint, self.ref_order_hint(ref_frame))
    }

    /// Computes the sign bias of every reference: true for references that follow the current
    /// frame in display order.
    pub fn sign_bias(&self) -> [bool; REF_FRAMES] {
        let mut bias = [false; REF_FRAMES];

        if !self.order_hints.enable {
            return bias;
        }

        for rf in RefFrame::INTER {
            if let Some(frame) = self.get(rf) {
                bias[rf.index()] =
                    self.order_hints.relative_dist(frame.order_hint, self.order_hint) > 0;
            }
        }

        bias
    }

    /// Computes the side of every reference: 1 if it follows the current frame in display order,
    /// -1 if it shares the current frame's order hint, 0 otherwise.
    pub fn ref_frame_side(&self) -> [i8; REF_FRAMES] {
        let mut side = [0; REF_FRAMES];

        if !self.order_hints.enable {
            return side;
        }

        for rf in RefFrame::INTER {
            let hint = self.ref_order_hint(rf);

            if self.order_hints.relative_dist(hint, self.order_hint) > 0 {
                side[rf.index()] = 1;
            }
            else if hint == self.order_hint {
                side[rf.index()] = -1;
            }
        }

        side
    }

    /// Assigns every reference from the reference map when only LAST and GOLDEN are signaled,
    /// returning the map index chosen for each reference in slot order.
    ///
    /// The frames following the current frame in display order are assigned first: the furthest
    /// to `AltRef`, then the nearest to `BwdRef` and the next nearest to `AltRef2`. The preceding
    /// frames, nearest first and skipping LAST and GOLDEN, fill the references still unassigned in
    /// the order `Last2`, `Last3`, `BwdRef`, `AltRef2`, `AltRef`. Whatever remains takes the
    /// earliest preceding frame. Frames sharing an order hint are ranked by map index, the lower
    /// index counting as the earlier frame.
    pub fn set_frame_refs(
        &mut self,
        ref_map: &[Option<Arc<SavedFrame>>; REF_MAP_SIZE],
        last_idx: usize,
        gld_idx: usize,
    ) -> Result<[usize; INTER_REFS_PER_FRAME]> {
        if !self.order_hints.enable || self.order_hints.bits == 0 {
            return logic_error("mvref: short-signaled references require order hints");
        }
        if last_idx >= REF_MAP_SIZE || gld_idx >= REF_MAP_SIZE {
            return logic_error("mvref: reference map index out of range");
        }

        let cur_sort = 1 << (self.order_hints.bits - 1);

        let sort_idx = |idx: usize| {
            ref_map[idx].as_ref().map(|frame| {
                cur_sort + self.order_hints.relative_dist(frame.order_hint, self.order_hint)
            })
        };

        if !matches!(sort_idx(last_idx), Some(sort) if sort < cur_sort) {
            return decode_error("mvref: LAST is not a preceding frame");
        }
        if !matches!(sort_idx(gld_idx), Some(sort) if sort < cur_sort) {
            return decode_error("mvref: GOLDEN is not a preceding frame");
        }

        let mut frames: SmallVec<[(i32, usize); REF_MAP_SIZE]> =
            (0..REF_MAP_SIZE).filter_map(|idx| sort_idx(idx).map(|sort| (sort, idx))).collect();

        frames.sort_unstable();

        let split = frames.iter().position(|&(sort, _)| sort >= cur_sort).unwrap_or(frames.len());
        let (forward, backward) = frames.split_at(split);

        // LAST is a preceding frame, so there is at least one.
        let earliest = match forward.first() {
            Some(&(_, idx)) => idx,
            None => return decode_error("mvref: no preceding reference frame"),
        };

        let mut assigned: [Option<usize>; INTER_REFS_PER_FRAME] = [None; INTER_REFS_PER_FRAME];

        let slot = |rf: RefFrame| rf.index() - 1;

        let mut following = backward.iter().map(|&(_, idx)| idx);

        assigned[slot(RefFrame::AltRef)] = following.next_back();
        assigned[slot(RefFrame::BwdRef)] = following.next();
        assigned[slot(RefFrame::AltRef2)] = following.next();

        assigned[slot(RefFrame::Last)] = Some(last_idx);
        assigned[slot(RefFrame::Golden)] = Some(gld_idx);

        let mut preceding = forward
            .iter()
            .rev()
            .map(|&(_, idx)| idx)
            .filter(|&idx| idx != last_idx && idx != gld_idx);

        for rf in SHORT_SIGNALED_REFS {
            if assigned[slot(rf)].is_none() {
                assigned[slot(rf)] = Some(preceding.next().unwrap_or(earliest));
            }
        }

        let map = assigned.map(|idx| idx.unwrap_or(earliest));

        for (slot, &idx) in self.slots.iter_mut().zip(&map) {
            *slot = ref_map[idx].clone();
        }

        debug!("short-signaled reference map indices: {:?}", map);

        Ok(map)
    }

    /// Selects the two references of skip mode, or returns `None` if skip mode is not allowed.
    ///
    /// The pair is the nearest preceding and the nearest following reference in display order.
    /// Without a following reference, the two nearest preceding references are used. The pair is
    /// returned in slot order.
    pub fn skip_mode_refs(
        &self,
        frame_type: FrameType,
        reference_select: bool,
    ) -> Option<[RefFrame; 2]> {
        if !self.order_hints.enable || frame_type.is_intra_only() || !reference_select {
            return None;
        }

        let dist = |a: u32, b: u32| self.order_hints.relative_dist(a, b);

        let mut forward: Option<(u32, usize)> = None;
        let mut backward: Option<(u32, usize)> = None;

        for (idx, rf) in RefFrame::INTER.into_iter().enumerate() {
            let hint = match self.get(rf) {
                Some(frame) => frame.order_hint,
                None => continue,
            };

            let to_cur = dist(hint, self.order_hint);

            if to_cur < 0 {
                if forward.map_or(true, |(best, _)| dist(hint, best) > 0) {
                    forward = Some((hint, idx));
                }
            }
            else if to_cur > 0 && backward.map_or(true, |(best, _)| dist(hint, best) < 0) {
                backward = Some((hint, idx));
            }
        }

        let (fwd_hint, fwd_idx) = forward?;

        let second_idx = match backward {
            Some((_, idx)) => idx,
            None => {
                let mut second: Option<(u32, usize)> = None;

                for (idx, rf) in RefFrame::INTER.into_iter().enumerate() {
                    let hint = match self.get(rf) {
                        Some(frame) => frame.order_hint,
                        None => continue,
                    };

                    if dist(hint, fwd_hint) < 0
                        && second.map_or(true, |(best, _)| dist(hint, best) > 0)
                    {
                        second = Some((hint, idx));
                    }
                }

                second?.1
            }
        };

        let lo = RefFrame::from_inter_index(fwd_idx.min(second_idx))?;
        let hi = RefFrame::from_inter_index(fwd_idx.max(second_idx))?;

        debug!("skip mode references: {:?}, {:?}", lo, hi);

        Some([lo, hi])
    }
}
