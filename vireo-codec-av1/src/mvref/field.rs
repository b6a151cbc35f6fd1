// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The motion field: motion vectors of the reference frames projected onto the current frame at
//! 8x8 granularity.

use log::{debug, warn};

use vireo_core::util::bits::round_power_of_two_signed;

use crate::common::{Mv, RefFrame, MI_SIZE_LOG2, REF_FRAMES};

use super::frame::FrameRefs;

/// The largest display order distance used for projection.
pub const MAX_FRAME_DISTANCE: i32 = 31;

/// The number of references that may be projected onto a frame.
pub const MFMV_STACK_SIZE: i32 = 3;

const MV_LOW: i32 = -(1 << 14);
const MV_UPP: i32 = 1 << 14;

const MAX_OFFSET_WIDTH: i32 = 64;
const MAX_OFFSET_HEIGHT: i32 = 0;

/// Reciprocals of the frame distances with 14 fractional bits.
#[rustfmt::skip]
const DIV_MULT: [i32; 32] = [
       0, 16384, 8192, 5461, 4096, 3276, 2730, 2340,
    2048,  1820, 1638, 1489, 1365, 1260, 1170, 1092,
    1024,   963,  910,  862,  819,  780,  744,  712,
     682,   655,  630,  606,  585,  564,  546,  528,
];

/// Scales `mv`, which spans `den` frames, to span `num` frames. Both distances are clipped to
/// [`MAX_FRAME_DISTANCE`].
pub fn get_mv_projection(mv: Mv, num: i32, den: i32) -> Mv {
    let den = den.clamp(0, MAX_FRAME_DISTANCE);
    let num = i64::from(num.clamp(-MAX_FRAME_DISTANCE, MAX_FRAME_DISTANCE));
    let mult = i64::from(DIV_MULT[den as usize]);

    let project = |v: i16| {
        let v = round_power_of_two_signed(i64::from(v) * num * mult, 14);
        v.clamp(i64::from(MV_LOW + 1), i64::from(MV_UPP - 1)) as i16
    };

    Mv::new(project(mv.row), project(mv.col))
}

/// A motion vector of a reference frame, and the display order distance it spans.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProjectedMv {
    pub mv: Mv,
    pub ref_frame_offset: i32,
}

/// The direction a reference is projected in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Projection {
    /// The reference follows the current frame.
    FromFuture,
    /// The reference precedes the current frame.
    FromPast,
}

/// `MotionField` holds at most one projected motion vector per 8x8 area of the current frame.
#[derive(Clone, Debug)]
pub struct MotionField {
    mi_rows: usize,
    mi_cols: usize,
    stride: usize,
    entries: Vec<Option<ProjectedMv>>,
}

impl MotionField {
    /// Instantiate an empty motion field for a frame of `mi_rows` by `mi_cols` mode-info units.
    pub fn new(mi_rows: usize, mi_cols: usize) -> Self {
        let stride = (mi_cols + 1) >> 1;
        let rows = (mi_rows + 1) >> 1;

        MotionField { mi_rows, mi_cols, stride, entries: vec![None; rows * stride] }
    }

    /// Builds the motion field of the current frame from its references.
    ///
    /// `Last` is projected first unless it is an overlay of `Golden`, then `BwdRef`, `AltRef2`
    /// and `AltRef` if they follow the current frame, and finally `Last2`, for as long as fewer
    /// than [`MFMV_STACK_SIZE`] references have been used. Later projections overwrite earlier
    /// ones.
    pub fn setup(refs: &FrameRefs, mi_rows: usize, mi_cols: usize) -> Self {
        let mut field = MotionField::new(mi_rows, mi_cols);

        let order_hints = refs.order_hints();

        if !order_hints.enable {
            return field;
        }

        let cur = refs.order_hint();
        let follows = |rf| order_hints.relative_dist(refs.ref_order_hint(rf), cur) > 0;

        let mut stamp = MFMV_STACK_SIZE - 1;

        if let Some(last) = refs.get(RefFrame::Last) {
            let alt_of_last = last.ref_order_hints[RefFrame::AltRef.index() - 1];
            let is_overlay = alt_of_last == refs.ref_order_hint(RefFrame::Golden);

            if !is_overlay {
                field.project(refs, RefFrame::Last, Projection::FromPast);
            }
            stamp -= 1;
        }

        if follows(RefFrame::BwdRef)
            && field.project(refs, RefFrame::BwdRef, Projection::FromFuture)
        {
            stamp -= 1;
        }

        if follows(RefFrame::AltRef2)
            && field.project(refs, RefFrame::AltRef2, Projection::FromFuture)
        {
            stamp -= 1;
        }

        if follows(RefFrame::AltRef)
            && stamp >= 0
            && field.project(refs, RefFrame::AltRef, Projection::FromFuture)
        {
            stamp -= 1;
        }

        if stamp >= 0 {
            field.project(refs, RefFrame::Last2, Projection::FromPast);
        }

        field
    }

    /// Projects the saved motion vectors of the reference `start` onto the field. Returns false
    /// if the reference cannot be projected.
    fn project(&mut self, refs: &FrameRefs, start: RefFrame, dir: Projection) -> bool {
        let frame = match refs.get(start) {
            Some(frame) => frame,
            None => return false,
        };

        if frame.frame_type.is_intra_only() {
            return false;
        }

        if frame.mi_rows != self.mi_rows || frame.mi_cols != self.mi_cols {
            warn!(
                "not projecting {:?}: {}x{} units, frame is {}x{}",
                start, frame.mi_cols, frame.mi_rows, self.mi_cols, self.mi_rows
            );
            return false;
        }

        let order_hints = refs.order_hints();

        let mut ref_offset = [0; REF_FRAMES];

        for (rf, hint) in RefFrame::INTER.into_iter().zip(frame.ref_order_hints) {
            ref_offset[rf.index()] = order_hints.relative_dist(frame.order_hint, hint);
        }

        let mut start_to_cur = order_hints.relative_dist(frame.order_hint, refs.order_hint());

        if dir == Projection::FromPast {
            start_to_cur = -start_to_cur;
        }

        debug!("projecting {:?} ({:?}), distance {}", start, dir, start_to_cur);

        if start_to_cur.abs() > MAX_FRAME_DISTANCE {
            return true;
        }

        let rows = (self.mi_rows + 1) >> 1;
        let cols = (self.mi_cols + 1) >> 1;

        for blk_row in 0..rows {
            for blk_col in 0..cols {
                let saved = match frame.mvs.get(blk_row, blk_col) {
                    Some(saved) => saved,
                    None => continue,
                };

                let ref_frame_offset = ref_offset[saved.ref_frame.index()];

                if ref_frame_offset <= 0 || ref_frame_offset > MAX_FRAME_DISTANCE {
                    continue;
                }

                let projected = get_mv_projection(saved.mv, start_to_cur, ref_frame_offset);

                let pos = self.block_position(
                    blk_row as i32,
                    blk_col as i32,
                    projected,
                    dir == Projection::FromPast,
                );

                if let Some((row, col)) = pos {
                    self.entries[row * self.stride + col] =
                        Some(ProjectedMv { mv: saved.mv, ref_frame_offset });
                }
            }
        }

        true
    }

    /// Finds the 8x8 area a projected vector starting at `(blk_row, blk_col)` lands in. The
    /// landing area must lie in the frame, in the same 64 pixel row, and at most 64 pixels left
    /// or right of the 64x64 area of the start.
    fn block_position(
        &self,
        blk_row: i32,
        blk_col: i32,
        mv: Mv,
        reverse: bool,
    ) -> Option<(usize, usize)> {
        let base_row = (blk_row >> 3) << 3;
        let base_col = (blk_col >> 3) << 3;

        let offset = |v: i16| {
            let v = i32::from(v);
            if v >= 0 {
                v >> (4 + MI_SIZE_LOG2)
            }
            else {
                -((-v) >> (4 + MI_SIZE_LOG2))
            }
        };

        let (row, col) = if reverse {
            (blk_row - offset(mv.row), blk_col - offset(mv.col))
        }
        else {
            (blk_row + offset(mv.row), blk_col + offset(mv.col))
        };

        if row < 0
            || row >= (self.mi_rows >> 1) as i32
            || col < 0
            || col >= (self.mi_cols >> 1) as i32
        {
            return None;
        }

        if row < base_row - (MAX_OFFSET_HEIGHT >> 3)
            || row >= base_row + 8 + (MAX_OFFSET_HEIGHT >> 3)
            || col < base_col - (MAX_OFFSET_WIDTH >> 3)
            || col >= base_col + 8 + (MAX_OFFSET_WIDTH >> 3)
        {
            return None;
        }

        Some((row as usize, col as usize))
    }

    /// Gets the projected motion vector of the 8x8 area at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<ProjectedMv> {
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
