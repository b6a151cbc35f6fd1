// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Motion vector reference search.
//!
//! For every block and reference frame hypothesis, [`FrameMvContext::find_mv_refs`] gathers the
//! motion vectors of the already decoded neighbours and of the projected motion field into a
//! weighted [`CandidateStack`], and derives the [`ModeContext`] used to decode the inter mode.
//!
//! The search visits, in order:
//!
//! 1. the row above, the column to the left, and the block above-right;
//! 2. the motion field at and around the block;
//! 3. the block above-left, then the second and third rows above and columns to the left.
//!
//! Candidates found by the first step are boosted by [`REF_CAT_LEVEL`] and kept ahead of all
//! others.

use log::trace;

use crate::common::{
    BlockSize, Mv, MvPrecision, RefFrame, SuperblockSize, MI_SIZE, MI_SIZE_64X64, REF_FRAMES,
};
use crate::grid::{BlockInfo, ModeInfoGrid, TileInfo};

mod field;
mod frame;
mod global;
mod samples;
mod stack;

pub use field::{get_mv_projection, MotionField, ProjectedMv, MAX_FRAME_DISTANCE, MFMV_STACK_SIZE};
pub use frame::{
    FrameRefs, FrameType, OrderHintInfo, SavedFrame, SavedMv, SavedMvs, REFMVS_LIMIT,
    REF_MAP_SIZE,
};
pub use global::{is_global_mv_block, GlobalMotion, WARPEDMODEL_PREC_BITS};
pub use samples::{select_warp_samples, WarpSample, WarpSamples, LEAST_SQUARES_SAMPLES_MAX};
pub use stack::{CandidateMv, CandidateStack, ModeContext};

/// The number of rows above, and columns to the left, that are searched.
pub const MVREF_ROW_COLS: i32 = 3;

/// The capacity of a candidate stack.
pub const MAX_REF_MV_STACK_SIZE: usize = 8;

/// The number of candidates the nearest and near motion vectors are selected from.
pub const MAX_MV_REF_CANDIDATES: usize = 2;

/// The weight added to the candidates adjacent to the block.
pub const REF_CAT_LEVEL: u16 = 640;

pub const GLOBALMV_OFFSET: u16 = 3;
pub const REFMV_OFFSET: u16 = 4;

/// How far, in 1/8th pixels, a reference motion vector may point beyond the frame.
const MV_BORDER: i32 = 16 << 3;

/// The reference frame hypothesis of a search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MvRefTarget {
    Single(RefFrame),
    Compound(RefFrame, RefFrame),
}

/// Per-frame options of the motion vector reference search.
#[derive(Clone, Debug)]
pub struct MvRefOptions {
    pub sb_size: SuperblockSize,
    pub mv_precision: MvPrecision,
    /// Search the motion field. Requires a motion field to be attached with
    /// [`FrameMvContext::with_motion_field`], otherwise temporal candidates are unavailable.
    pub allow_ref_frame_mvs: bool,
    /// The global motion model of every reference frame.
    pub global_motion: [GlobalMotion; REF_FRAMES],
}

impl Default for MvRefOptions {
    fn default() -> Self {
        MvRefOptions {
            sb_size: SuperblockSize::Sb64,
            mv_precision: MvPrecision::Quarter,
            allow_ref_frame_mvs: false,
            global_motion: [GlobalMotion::IDENTITY; REF_FRAMES],
        }
    }
}

/// The outcome of a motion vector reference search.
#[derive(Clone, Debug, Default)]
pub struct MvRefs {
    pub stack: CandidateStack,
    pub mode_context: ModeContext,
    /// The first two candidates, or the global motion vector where there are fewer. Only
    /// filled for single reference hypotheses; compound searches leave the global motion
    /// vector in both.
    pub mv_ref_list: [Mv; MAX_MV_REF_CANDIDATES],
    /// The global motion vectors of the hypothesis' references at the block.
    pub global_mvs: [Mv; 2],
}

impl MvRefs {
    /// Gets the nearest and near motion vectors rounded to `precision`.
    pub fn find_best_ref_mvs(&self, precision: MvPrecision) -> (Mv, Mv) {
        (precision.lower(self.mv_ref_list[0]), precision.lower(self.mv_ref_list[1]))
    }
}

/// Clamps a reference motion vector of the block of size `bsize` at `(mi_row, mi_col)` so that
/// the prediction lies at most [`MV_BORDER`] beyond a block width or height outside the frame.
pub fn clamp_mv_ref(
    mv: Mv,
    mi_row: usize,
    mi_col: usize,
    bsize: BlockSize,
    mi_rows: usize,
    mi_cols: usize,
) -> Mv {
    let bw = bsize.width() as i32 * 8;
    let bh = bsize.height() as i32 * 8;

    let to_left = -((mi_col * MI_SIZE) as i32 * 8);
    let to_right = (mi_cols as i32 - bsize.width_mi() as i32 - mi_col as i32) * MI_SIZE as i32 * 8;
    let to_top = -((mi_row * MI_SIZE) as i32 * 8);
    let to_bottom =
        (mi_rows as i32 - bsize.height_mi() as i32 - mi_row as i32) * MI_SIZE as i32 * 8;

    let clamp = |v: i16, lo: i32, hi: i32| i32::from(v).max(lo).min(hi) as i16;

    Mv::new(
        clamp(mv.row, to_top - bh - MV_BORDER, to_bottom + bh + MV_BORDER),
        clamp(mv.col, to_left - bw - MV_BORDER, to_right + bw + MV_BORDER),
    )
}

/// Returns true if the unit at the offset lies in the same 64x64 area as `(mi_row, mi_col)`.
fn check_sb_border(mi_row: i32, mi_col: i32, row_offset: i32, col_offset: i32) -> bool {
    let sb = MI_SIZE_64X64 as i32;
    let row = (mi_row & (sb - 1)) + row_offset;
    let col = (mi_col & (sb - 1)) + col_offset;

    (0..sb).contains(&row) && (0..sb).contains(&col)
}

/// `FrameMvContext` holds the frame-level state of the motion vector reference search.
pub struct FrameMvContext<'a> {
    grid: &'a ModeInfoGrid,
    refs: &'a FrameRefs,
    tile: TileInfo,
    motion_field: Option<&'a MotionField>,
    options: MvRefOptions,
    sign_bias: [bool; REF_FRAMES],
}

impl<'a> FrameMvContext<'a> {
    /// Instantiate a search over the decoded blocks of `grid`, treating the whole frame as a
    /// single tile.
    pub fn new(grid: &'a ModeInfoGrid, refs: &'a FrameRefs, options: MvRefOptions) -> Self {
        FrameMvContext {
            grid,
            refs,
            tile: TileInfo::whole_frame(grid),
            motion_field: None,
            options,
            sign_bias: refs.sign_bias(),
        }
    }

    /// Restricts the search to the tile `tile`.
    pub fn with_tile(mut self, tile: TileInfo) -> Self {
        self.tile = tile;
        self
    }

    /// Attaches the motion field of the frame.
    pub fn with_motion_field(mut self, motion_field: &'a MotionField) -> Self {
        self.motion_field = Some(motion_field);
        self
    }

    pub fn options(&self) -> &MvRefOptions {
        &self.options
    }

    /// Returns true if the block above-right of the block of `n4_w` by `n4_h` units at
    /// `(mi_row, mi_col)` is decoded. Availability across superblock rows is left to the tile
    /// bounds.
    fn has_top_right(&self, mi_row: i32, mi_col: i32, n4_w: i32, n4_h: i32) -> bool {
        let sb = self.options.sb_size.mi_size() as i32;

        if n4_w.max(n4_h) > MI_SIZE_64X64 as i32 {
            return false;
        }

        let mask_row = mi_row & (sb - 1);
        let mask_col = mi_col & (sb - 1);

        if mask_row - 1 < 0 {
            true
        }
        else if mask_col + n4_w >= sb {
            false
        }
        else {
            self.grid.is_decoded(mi_row - 1, mi_col + n4_w)
        }
    }

    fn global_mv(&self, rf: RefFrame, bsize: BlockSize, mi_row: usize, mi_col: usize) -> Mv {
        if !rf.is_inter() {
            return Mv::ZERO;
        }
        self.options.global_motion[rf.index()].motion_vector(
            self.options.mv_precision,
            bsize,
            mi_row,
            mi_col,
        )
    }

    /// Searches the reference motion vectors of the block of size `bsize` at `(mi_row, mi_col)`
    /// for the hypothesis `target`.
    pub fn find_mv_refs(
        &self,
        mi_row: usize,
        mi_col: usize,
        bsize: BlockSize,
        target: MvRefTarget,
    ) -> MvRefs {
        let (rf, compound) = match target {
            MvRefTarget::Single(rf) => ([rf, RefFrame::Intra], false),
            MvRefTarget::Compound(rf0, rf1) => ([rf0, rf1], true),
        };

        let global_mvs = if compound {
            rf.map(|rf| self.global_mv(rf, bsize, mi_row, mi_col))
        }
        else {
            [self.global_mv(rf[0], bsize, mi_row, mi_col), Mv::ZERO]
        };

        let mut scan = BlockScan {
            ctx: self,
            bsize,
            mi_row: mi_row as i32,
            mi_col: mi_col as i32,
            n4_w: bsize.width_mi() as i32,
            n4_h: bsize.height_mi() as i32,
            rf,
            compound,
            global_mvs,
            stack: CandidateStack::new(),
        };

        let mode_context = scan.run();

        let stack = scan.stack;

        let mut mv_ref_list = [global_mvs[0]; MAX_MV_REF_CANDIDATES];

        if !compound {
            for (slot, cand) in mv_ref_list.iter_mut().zip(stack.iter()) {
                *slot = cand.this_mv;
            }
        }

        trace!(
            "mv refs at ({}, {}) {:?} {:?}: {} candidates ({} nearest), context {:#04x}",
            mi_row,
            mi_col,
            bsize,
            target,
            stack.len(),
            stack.nearest_count(),
            mode_context.0
        );

        MvRefs { stack, mode_context, mv_ref_list, global_mvs }
    }
}

/// The number of matching candidates found by a scan, and how many of them were coded with a new
/// motion vector.
#[derive(Copy, Clone, Debug, Default)]
struct Matches {
    refs: u32,
    newmv: u32,
}

impl std::ops::AddAssign for Matches {
    fn add_assign(&mut self, rhs: Matches) {
        self.refs += rhs.refs;
        self.newmv += rhs.newmv;
    }
}

/// The motion vectors of the neighbours used to complete a compound stack: those pointing to the
/// same reference, and those pointing elsewhere.
#[derive(Default)]
struct CompoundNeighbours {
    same: [[Mv; 2]; 2],
    same_count: [usize; 2],
    other: [[Mv; 2]; 2],
    other_count: [usize; 2],
}

impl CompoundNeighbours {
    fn add(&mut self, cand: &BlockInfo, rf: [RefFrame; 2], sign_bias: &[bool; REF_FRAMES]) {
        for rf_idx in 0..2 {
            let cand_rf = cand.ref_frame(rf_idx);

            for cmp_idx in 0..2 {
                if cand_rf == Some(rf[cmp_idx]) && self.same_count[cmp_idx] < 2 {
                    self.same[cmp_idx][self.same_count[cmp_idx]] = cand.mv[rf_idx];
                    self.same_count[cmp_idx] += 1;
                }
                else if let Some(cand_rf) = cand_rf.filter(|rf| rf.is_inter()) {
                    if self.other_count[cmp_idx] < 2 {
                        let mut mv = cand.mv[rf_idx];
                        if sign_bias[cand_rf.index()] != sign_bias[rf[cmp_idx].index()] {
                            mv = mv.negate();
                        }
                        self.other[cmp_idx][self.other_count[cmp_idx]] = mv;
                        self.other_count[cmp_idx] += 1;
                    }
                }
            }
        }
    }

    /// Builds two vector pairs from the neighbours, falling back to the global motion vectors.
    fn pairs(&self, global_mvs: [Mv; 2]) -> [[Mv; 2]; MAX_MV_REF_CANDIDATES] {
        let mut pairs = [global_mvs; MAX_MV_REF_CANDIDATES];

        for idx in 0..2 {
            let found = self.same[idx][..self.same_count[idx]]
                .iter()
                .chain(&self.other[idx][..self.other_count[idx]]);

            for (pair, &mv) in pairs.iter_mut().zip(found) {
                pair[idx] = mv;
            }
        }

        pairs
    }
}

/// The state of one search.
struct BlockScan<'c, 'a> {
    ctx: &'c FrameMvContext<'a>,
    bsize: BlockSize,
    mi_row: i32,
    mi_col: i32,
    n4_w: i32,
    n4_h: i32,
    rf: [RefFrame; 2],
    compound: bool,
    global_mvs: [Mv; 2],
    stack: CandidateStack,
}

impl<'a> BlockScan<'_, 'a> {
    fn candidate(&self, row_offset: i32, col_offset: i32) -> Option<&'a BlockInfo> {
        let grid: &'a ModeInfoGrid = self.ctx.grid;
        grid.get_signed(self.mi_row + row_offset, self.mi_col + col_offset)
    }

    fn run(&mut self) -> ModeContext {
        let tile = self.ctx.tile;
        let (mi_row, mi_col, n4_w, n4_h) = (self.mi_row, self.mi_col, self.n4_w, self.n4_h);

        let mut mode_context = ModeContext::default();

        // Sub-8x8 blocks at odd positions search from the even row or column.
        let row_adj = i32::from(n4_h < 2 && mi_row & 1 != 0);
        let col_adj = i32::from(n4_w < 2 && mi_col & 1 != 0);

        let mut max_row_offset = 0;
        let mut max_col_offset = 0;

        if mi_row > tile.mi_row_start as i32 {
            let reach = if n4_h < 2 { 2 } else { MVREF_ROW_COLS };
            max_row_offset = (-(reach << 1) + row_adj)
                .max(tile.mi_row_start as i32 - mi_row)
                .min(tile.mi_row_end as i32 - mi_row - 1);
        }

        if mi_col > tile.mi_col_start as i32 {
            let reach = if n4_w < 2 { 2 } else { MVREF_ROW_COLS };
            max_col_offset = (-(reach << 1) + col_adj)
                .max(tile.mi_col_start as i32 - mi_col)
                .min(tile.mi_col_end as i32 - mi_col - 1);
        }

        let mut processed_rows = 0;
        let mut processed_cols = 0;

        let mut row_matches = Matches::default();
        let mut col_matches = Matches::default();

        if max_row_offset.abs() >= 1 {
            row_matches += self.scan_row(-1, max_row_offset, &mut processed_rows);
        }
        if max_col_offset.abs() >= 1 {
            col_matches += self.scan_col(-1, max_col_offset, &mut processed_cols);
        }
        if self.has_top_right() {
            row_matches += self.scan_blk(-1, n4_w);
        }

        let nearest_match = u8::from(row_matches.refs > 0) + u8::from(col_matches.refs > 0);
        let newmv = row_matches.newmv + col_matches.newmv;

        self.stack.mark_nearest(REF_CAT_LEVEL);

        if self.ctx.options.allow_ref_frame_mvs {
            self.scan_temporal(&mut mode_context);
        }

        row_matches.refs += self.scan_blk(-1, -1).refs;

        for idx in 2..=MVREF_ROW_COLS {
            let row_offset = -(idx << 1) + 1 + row_adj;
            let col_offset = -(idx << 1) + 1 + col_adj;

            if row_offset.abs() <= max_row_offset.abs() && row_offset.abs() > processed_rows {
                let found = self.scan_row(row_offset, max_row_offset, &mut processed_rows);
                row_matches.refs += found.refs;
            }
            if col_offset.abs() <= max_col_offset.abs() && col_offset.abs() > processed_cols {
                let found = self.scan_col(col_offset, max_col_offset, &mut processed_cols);
                col_matches.refs += found.refs;
            }
        }

        let ref_match = u8::from(row_matches.refs > 0) + u8::from(col_matches.refs > 0);

        mode_context.set_match_context(nearest_match, ref_match, newmv);

        self.stack.sort();

        let grid = self.ctx.grid;
        let mi_width = n4_w.min(MI_SIZE_64X64 as i32).min(grid.mi_cols() as i32 - mi_col);
        let mi_height = n4_h.min(MI_SIZE_64X64 as i32).min(grid.mi_rows() as i32 - mi_row);
        let mi_size = mi_width.min(mi_height);

        let above = max_row_offset.abs() >= 1;
        let left = max_col_offset.abs() >= 1;

        if self.compound {
            self.extend_compound(above, left, mi_size);
        }
        else {
            self.extend_single(above, left, mi_size);
        }

        let (mi_rows, mi_cols) = (grid.mi_rows(), grid.mi_cols());
        let (row, col, bsize) = (mi_row as usize, mi_col as usize, self.bsize);
        let clamp = |mv| clamp_mv_ref(mv, row, col, bsize, mi_rows, mi_cols);
        let compound = self.compound;

        self.stack.for_each_mut(|cand| {
            cand.this_mv = clamp(cand.this_mv);
            if compound {
                cand.comp_mv = clamp(cand.comp_mv);
            }
        });

        mode_context
    }

    /// Adds a neighbour to the stack if it predicts from the hypothesis' references.
    fn add_candidate(&mut self, cand: &BlockInfo, weight: u16) -> Matches {
        let mut matches = Matches::default();

        if !cand.is_inter() {
            return matches;
        }

        let gm = &self.ctx.options.global_motion;

        if !self.compound {
            let rf = self.rf[0];

            for idx in 0..2 {
                if cand.ref_frame(idx) != Some(rf) {
                    continue;
                }

                let this_mv = if is_global_mv_block(cand, gm[rf.index()].wmtype) {
                    self.global_mvs[0]
                }
                else {
                    cand.mv[idx]
                };

                self.stack.add(this_mv, Mv::ZERO, weight);

                matches.refs += 1;
                matches.newmv += u32::from(cand.mode.has_newmv());
            }
        }
        else if cand.ref_frame(0) == Some(self.rf[0]) && cand.ref_frame(1) == Some(self.rf[1]) {
            let mut mvs = cand.mv;

            for (idx, mv) in mvs.iter_mut().enumerate() {
                if is_global_mv_block(cand, gm[self.rf[idx].index()].wmtype) {
                    *mv = self.global_mvs[idx];
                }
            }

            self.stack.add(mvs[0], mvs[1], weight);

            matches.refs += 1;
            matches.newmv += u32::from(cand.mode.has_newmv());
        }

        matches
    }

    /// Scans the row `row_offset` units above the block.
    fn scan_row(
        &mut self,
        row_offset: i32,
        max_row_offset: i32,
        processed_rows: &mut i32,
    ) -> Matches {
        let n4_w = self.n4_w;
        let end = n4_w
            .min(self.ctx.grid.mi_cols() as i32 - self.mi_col)
            .min(MI_SIZE_64X64 as i32);

        let mut col_offset = 0;

        if row_offset.abs() > 1 {
            col_offset = 1;
            if self.mi_col & 1 != 0 && n4_w < 2 {
                col_offset -= 1;
            }
        }

        let use_step_16 = n4_w >= 16;

        let mut matches = Matches::default();
        let mut i = 0;

        while i < end {
            let cand = match self.candidate(row_offset, col_offset + i) {
                Some(cand) => cand,
                None => break,
            };

            let cand_w = cand.size.width_mi() as i32;

            let mut len = n4_w.min(cand_w);

            if use_step_16 {
                len = len.max(4);
            }
            else if row_offset.abs() > 1 {
                len = len.max(2);
            }

            let mut weight = 2;

            if n4_w >= 2 && n4_w <= cand_w {
                let inc = (-max_row_offset + row_offset + 1).min(cand.size.height_mi() as i32);
                weight = weight.max(inc);
                *processed_rows = inc - row_offset - 1;
            }

            matches += self.add_candidate(cand, (len * weight) as u16);

            i += len;
        }

        matches
    }

    /// Scans the column `col_offset` units left of the block.
    fn scan_col(
        &mut self,
        col_offset: i32,
        max_col_offset: i32,
        processed_cols: &mut i32,
    ) -> Matches {
        let n4_h = self.n4_h;
        let end = n4_h
            .min(self.ctx.grid.mi_rows() as i32 - self.mi_row)
            .min(MI_SIZE_64X64 as i32);

        let mut row_offset = 0;

        if col_offset.abs() > 1 {
            row_offset = 1;
            if self.mi_row & 1 != 0 && n4_h < 2 {
                row_offset -= 1;
            }
        }

        let use_step_16 = n4_h >= 16;

        let mut matches = Matches::default();
        let mut i = 0;

        while i < end {
            let cand = match self.candidate(row_offset + i, col_offset) {
                Some(cand) => cand,
                None => break,
            };

            let cand_h = cand.size.height_mi() as i32;

            let mut len = n4_h.min(cand_h);

            if use_step_16 {
                len = len.max(4);
            }
            else if col_offset.abs() > 1 {
                len = len.max(2);
            }

            let mut weight = 2;

            if n4_h >= 2 && n4_h <= cand_h {
                let inc = (-max_col_offset + col_offset + 1).min(cand.size.width_mi() as i32);
                weight = weight.max(inc);
                *processed_cols = inc - col_offset - 1;
            }

            matches += self.add_candidate(cand, (len * weight) as u16);

            i += len;
        }

        matches
    }

    /// Scans the single 8x8 area at the offset.
    fn scan_blk(&mut self, row_offset: i32, col_offset: i32) -> Matches {
        if !self.ctx.tile.is_inside(self.mi_row, self.mi_col, row_offset, col_offset) {
            return Matches::default();
        }

        match self.candidate(row_offset, col_offset) {
            Some(cand) => self.add_candidate(cand, 4),
            None => Matches::default(),
        }
    }

    fn has_top_right(&self) -> bool {
        self.ctx.has_top_right(self.mi_row, self.mi_col, self.n4_w, self.n4_h)
    }

    fn scan_temporal(&mut self, mode_context: &mut ModeContext) {
        let (n4_w, n4_h) = (self.n4_w, self.n4_h);
        let sb = MI_SIZE_64X64 as i32;

        let voffset = n4_h.max(2);
        let hoffset = n4_w.max(2);

        let step_h = if n4_h >= sb { 4 } else { 2 };
        let step_w = if n4_w >= sb { 4 } else { 2 };

        let mut is_available = false;

        for blk_row in (0..n4_h.min(sb)).step_by(step_h) {
            for blk_col in (0..n4_w.min(sb)).step_by(step_w) {
                let found = self.add_temporal(blk_row, blk_col, mode_context);
                if blk_row == 0 && blk_col == 0 {
                    is_available = found;
                }
            }
        }

        if !is_available {
            mode_context.set_globalmv();
        }

        let allow_extension = (2..sb).contains(&n4_h) && (2..sb).contains(&n4_w);

        if allow_extension {
            for (blk_row, blk_col) in [(voffset, -2), (voffset, hoffset), (voffset - 2, hoffset)] {
                if check_sb_border(self.mi_row, self.mi_col, blk_row, blk_col) {
                    self.add_temporal(blk_row, blk_col, mode_context);
                }
            }
        }
    }

    /// Adds the projected motion vector covering the offset. Returns false if there is none.
    fn add_temporal(
        &mut self,
        blk_row: i32,
        blk_col: i32,
        mode_context: &mut ModeContext,
    ) -> bool {
        let field = match self.ctx.motion_field {
            Some(field) => field,
            None => return false,
        };

        let row_offset = if self.mi_row & 1 != 0 { blk_row } else { blk_row + 1 };
        let col_offset = if self.mi_col & 1 != 0 { blk_col } else { blk_col + 1 };

        if !self.ctx.tile.is_inside(self.mi_row, self.mi_col, row_offset, col_offset) {
            return false;
        }

        let row = ((self.mi_row + row_offset) >> 1) as usize;
        let col = ((self.mi_col + col_offset) >> 1) as usize;

        let projected = match field.get(row, col) {
            Some(projected) => projected,
            None => return false,
        };

        let refs = self.ctx.refs;
        let precision = self.ctx.options.mv_precision;

        let project = |rf: RefFrame| {
            let mv = get_mv_projection(
                projected.mv,
                refs.distance_to(rf),
                projected.ref_frame_offset,
            );
            precision.lower(mv)
        };

        let far = |a: Mv, b: Mv| {
            (i32::from(a.row) - i32::from(b.row)).abs() >= 16
                || (i32::from(a.col) - i32::from(b.col)).abs() >= 16
        };

        let this_mv = project(self.rf[0]);
        let origin = blk_row == 0 && blk_col == 0;

        if !self.compound {
            if origin && far(this_mv, self.global_mvs[0]) {
                mode_context.set_globalmv();
            }
            self.stack.add(this_mv, Mv::ZERO, 2);
        }
        else {
            let comp_mv = project(self.rf[1]);

            if origin && (far(this_mv, self.global_mvs[0]) || far(comp_mv, self.global_mvs[1])) {
                mode_context.set_globalmv();
            }
            self.stack.add(this_mv, comp_mv, 2);
        }

        true
    }

    /// Completes a compound stack of fewer than two entries with vector pairs assembled from the
    /// adjacent neighbours.
    fn extend_compound(&mut self, above: bool, left: bool, mi_size: i32) {
        if self.stack.len() >= MAX_MV_REF_CANDIDATES {
            return;
        }

        let mut neighbours = CompoundNeighbours::default();

        if above {
            let mut idx = 0;
            while idx < mi_size {
                let cand = match self.candidate(-1, idx) {
                    Some(cand) => cand,
                    None => break,
                };
                neighbours.add(cand, self.rf, &self.ctx.sign_bias);
                idx += cand.size.width_mi() as i32;
            }
        }

        if left {
            let mut idx = 0;
            while idx < mi_size {
                let cand = match self.candidate(idx, -1) {
                    Some(cand) => cand,
                    None => break,
                };
                neighbours.add(cand, self.rf, &self.ctx.sign_bias);
                idx += cand.size.height_mi() as i32;
            }
        }

        let pairs = neighbours.pairs(self.global_mvs);

        match self.stack.get(0).copied() {
            Some(first) => {
                let pair = if pairs[0] == [first.this_mv, first.comp_mv] {
                    pairs[1]
                }
                else {
                    pairs[0]
                };
                self.stack.push(pair[0], pair[1], 2);
            }
            None => {
                for pair in pairs {
                    self.stack.push(pair[0], pair[1], 2);
                }
            }
        }
    }

    /// Adds the vectors of the adjacent neighbours to a single reference stack of fewer than two
    /// entries, whatever reference they point to.
    fn extend_single(&mut self, above: bool, left: bool, mi_size: i32) {
        if above {
            let mut idx = 0;
            while idx < mi_size && self.stack.len() < MAX_MV_REF_CANDIDATES {
                let cand = match self.candidate(-1, idx) {
                    Some(cand) => cand,
                    None => break,
                };
                self.add_any_reference(cand);
                idx += cand.size.width_mi() as i32;
            }
        }

        if left {
            let mut idx = 0;
            while idx < mi_size && self.stack.len() < MAX_MV_REF_CANDIDATES {
                let cand = match self.candidate(idx, -1) {
                    Some(cand) => cand,
                    None => break,
                };
                self.add_any_reference(cand);
                idx += cand.size.height_mi() as i32;
            }
        }
    }

    /// Adds every inter vector of `cand`, negated when it points to the other side of the current
    /// frame than the hypothesis' reference.
    fn add_any_reference(&mut self, cand: &BlockInfo) {
        let sign_bias = &self.ctx.sign_bias;

        for idx in 0..2 {
            let cand_rf = match cand.ref_frame(idx) {
                Some(rf) if rf.is_inter() => rf,
                _ => continue,
            };

            let mut mv = cand.mv[idx];

            if sign_bias[cand_rf.index()] != sign_bias[self.rf[0].index()] {
                mv = mv.negate();
            }

            self.stack.push_unique(mv, 2);
        }
    }
}
