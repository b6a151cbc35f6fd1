// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sample collection for local warped motion.
//!
//! A block predicted with local warped motion fits its warp model to the centres of the adjacent
//! blocks that predict from the same reference frame, and to where their motion vectors place
//! those centres in the reference frame.

use log::trace;
use smallvec::SmallVec;

use crate::common::{BlockSize, Mv, RefFrame, MI_SIZE};
use crate::grid::BlockInfo;

use super::FrameMvContext;

/// The maximum number of samples collected for one block.
pub const LEAST_SQUARES_SAMPLES_MAX: usize = 8;

/// A neighbour's centre relative to the top-left pixel of the block, and the same point displaced
/// by the neighbour's motion vector. Both are `(x, y)` pairs in 1/8 pel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WarpSample {
    pub pt: (i32, i32),
    pub pt_in_ref: (i32, i32),
}

pub type WarpSamples = SmallVec<[WarpSample; LEAST_SQUARES_SAMPLES_MAX]>;

impl WarpSample {
    fn new(cand: &BlockInfo, row_offset: i32, sign_r: i32, col_offset: i32, sign_c: i32) -> Self {
        let unit = MI_SIZE as i32;
        let bw = (cand.size.width() as i32).max(unit);
        let bh = (cand.size.height() as i32).max(unit);

        let x = 8 * (col_offset * unit + sign_c * bw / 2 - 1);
        let y = 8 * (row_offset * unit + sign_r * bh / 2 - 1);

        let mv = cand.mv[0];

        WarpSample { pt: (x, y), pt_in_ref: (x + i32::from(mv.col), y + i32::from(mv.row)) }
    }

    /// The distance, in 1/8 pel, between the neighbour's displacement and `mv`.
    fn mv_difference(&self, mv: Mv) -> i32 {
        let dx = self.pt_in_ref.0 - self.pt.0 - i32::from(mv.col);
        let dy = self.pt_in_ref.1 - self.pt.1 - i32::from(mv.row);
        dx.abs() + dy.abs()
    }
}

/// Appends a sample and returns true once no more samples may be added.
fn record(
    samples: &mut WarpSamples,
    cand: &BlockInfo,
    row_offset: i32,
    sign_r: i32,
    col_offset: i32,
    sign_c: i32,
) -> bool {
    samples.push(WarpSample::new(cand, row_offset, sign_r, col_offset, sign_c));
    samples.len() >= LEAST_SQUARES_SAMPLES_MAX
}

impl FrameMvContext<'_> {
    /// Collects the warped motion samples of the block of size `bsize` at `(mi_row, mi_col)`
    /// predicting from `ref_frame`.
    ///
    /// The row above is visited first, then the column to the left, the block above-left, and
    /// finally the block above-right. Only single reference neighbours predicting from
    /// `ref_frame` contribute, and at most [`LEAST_SQUARES_SAMPLES_MAX`] samples are returned.
    pub fn find_warp_samples(
        &self,
        mi_row: usize,
        mi_col: usize,
        bsize: BlockSize,
        ref_frame: RefFrame,
    ) -> WarpSamples {
        let mut samples = WarpSamples::new();

        self.collect_warp_samples(&mut samples, mi_row, mi_col, bsize, ref_frame);

        trace!(
            "warp samples at ({}, {}) {:?} {:?}: {}",
            mi_row,
            mi_col,
            bsize,
            ref_frame,
            samples.len()
        );

        samples
    }

    fn collect_warp_samples(
        &self,
        samples: &mut WarpSamples,
        mi_row: usize,
        mi_col: usize,
        bsize: BlockSize,
        ref_frame: RefFrame,
    ) {
        let grid = self.grid;
        let tile = self.tile;

        let (row, col) = (mi_row as i32, mi_col as i32);
        let n4_w = bsize.width_mi() as i32;
        let n4_h = bsize.height_mi() as i32;

        let up_available = mi_row > tile.mi_row_start;
        let left_available = mi_col > tile.mi_col_start;

        let matches = |cand: &BlockInfo| !cand.compound && cand.ref_frame[0] == ref_frame;

        let mut do_tl = true;
        let mut do_tr = true;

        if up_available {
            if let Some(id) = grid.id_at(mi_row - 1, mi_col) {
                let above = grid.block(id);
                let above_w = above.size.width_mi() as i32;

                if n4_w <= above_w {
                    let col_offset = grid.origin(id).1 as i32 - col;

                    if col_offset < 0 {
                        do_tl = false;
                    }
                    if col_offset + above_w > n4_w {
                        do_tr = false;
                    }

                    if matches(above) && record(samples, above, 0, -1, col_offset, 1) {
                        return;
                    }
                }
                else {
                    let end = n4_w.min(grid.mi_cols() as i32 - col);
                    let mut i = 0;

                    while i < end {
                        let cand = match grid.get_signed(row - 1, col + i) {
                            Some(cand) => cand,
                            None => break,
                        };

                        if matches(cand) && record(samples, cand, 0, -1, i, 1) {
                            return;
                        }

                        i += n4_w.min(cand.size.width_mi() as i32);
                    }
                }
            }
        }

        if left_available {
            if let Some(id) = grid.id_at(mi_row, mi_col - 1) {
                let left = grid.block(id);
                let left_h = left.size.height_mi() as i32;

                if n4_h <= left_h {
                    let row_offset = grid.origin(id).0 as i32 - row;

                    if row_offset < 0 {
                        do_tl = false;
                    }

                    if matches(left) && record(samples, left, row_offset, 1, 0, -1) {
                        return;
                    }
                }
                else {
                    let end = n4_h.min(grid.mi_rows() as i32 - row);
                    let mut i = 0;

                    while i < end {
                        let cand = match grid.get_signed(row + i, col - 1) {
                            Some(cand) => cand,
                            None => break,
                        };

                        if matches(cand) && record(samples, cand, i, 1, 0, -1) {
                            return;
                        }

                        i += n4_h.min(cand.size.height_mi() as i32);
                    }
                }
            }
        }

        if do_tl && left_available && up_available {
            if let Some(cand) = grid.get_signed(row - 1, col - 1) {
                if matches(cand) && record(samples, cand, 0, -1, 0, -1) {
                    return;
                }
            }
        }

        if do_tr && self.has_top_right(row, col, n4_w, n4_h) && tile.is_inside(row, col, -1, n4_w)
        {
            if let Some(cand) = grid.get_signed(row - 1, col + n4_w) {
                if matches(cand) {
                    record(samples, cand, 0, -1, n4_w, 1);
                }
            }
        }
    }
}

/// Discards the samples of `samples` whose displacement differs from `mv` by more than a
/// threshold derived from `bsize`, and returns the number of samples kept.
///
/// Kept samples from the end of the list fill the slots of discarded ones, so the order of the
/// survivors is not preserved. If every sample is discarded, only the first is kept.
pub fn select_warp_samples(samples: &mut WarpSamples, mv: Mv, bsize: BlockSize) -> usize {
    let thresh = bsize.width().max(bsize.height()).clamp(16, 112) as i32;

    let mut keep: SmallVec<[bool; LEAST_SQUARES_SAMPLES_MAX]> =
        samples.iter().map(|sample| sample.mv_difference(mv) <= thresh).collect();

    let kept = keep.iter().filter(|&&k| k).count();

    if kept == 0 {
        samples.truncate(1);
        return samples.len();
    }

    let len = samples.len();
    let mut i = 0;
    let mut j = len - 1;

    for _ in 0..len - kept {
        while keep[i] {
            i += 1;
        }
        while !keep[j] {
            j -= 1;
        }
        if i > j {
            break;
        }

        samples[i] = samples[j];
        keep[i] = true;

        i += 1;
        j -= 1;
    }

    samples.truncate(kept);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PredictionMode;
    use crate::grid::{ModeInfoGrid, TileInfo};
    use crate::mvref::{FrameRefs, MvRefOptions};

    fn grid_with(blocks: &[(usize, usize, BlockInfo)]) -> ModeInfoGrid {
        let mut grid = ModeInfoGrid::new(16, 16).unwrap();
        for (row, col, info) in blocks {
            grid.insert(*row, *col, info.clone()).unwrap();
        }
        grid
    }

    fn inter(bsize: BlockSize, rf: RefFrame, mv: Mv) -> BlockInfo {
        BlockInfo::inter(bsize, PredictionMode::NearestMv, rf, mv)
    }

    fn sample(pt: (i32, i32), pt_in_ref: (i32, i32)) -> WarpSample {
        WarpSample { pt, pt_in_ref }
    }

    #[test]
    fn verify_samples_from_all_neighbours() {
        let last = RefFrame::Last;
        let grid = grid_with(&[
            (0, 0, inter(BlockSize::B16x16, last, Mv::new(0, 0))),
            (0, 4, inter(BlockSize::B16x16, last, Mv::new(8, -4))),
            (0, 8, inter(BlockSize::B16x16, last, Mv::new(-16, 2))),
            (4, 0, inter(BlockSize::B16x16, last, Mv::new(1, 1))),
        ]);
        let refs = FrameRefs::default();
        let ctx = FrameMvContext::new(&grid, &refs, MvRefOptions::default());

        let samples = ctx.find_warp_samples(4, 4, BlockSize::B16x16, last);

        let expected = [
            sample((56, -72), (52, -64)),
            sample((-72, 56), (-71, 57)),
            sample((-72, -72), (-72, -72)),
            sample((184, -72), (186, -88)),
        ];

        assert_eq!(samples.as_slice(), &expected);
    }

    #[test]
    fn verify_wide_above_neighbour_skips_corners() {
        let last = RefFrame::Last;
        let grid = grid_with(&[
            (0, 0, inter(BlockSize::B32x8, last, Mv::new(4, 4))),
            (2, 0, inter(BlockSize::B8x8, last, Mv::new(0, -8))),
        ]);
        let refs = FrameRefs::default();
        let ctx = FrameMvContext::new(&grid, &refs, MvRefOptions::default());

        // The above neighbour also covers the above-left and above-right units.
        let samples = ctx.find_warp_samples(2, 2, BlockSize::B8x8, last);

        let expected = [sample((56, -40), (60, -36)), sample((-40, 24), (-48, 24))];

        assert_eq!(samples.as_slice(), &expected);
    }

    #[test]
    fn verify_sample_count_is_capped() {
        let last = RefFrame::Last;
        let mut blocks = Vec::new();
        for i in 0..8 {
            blocks.push((7, 8 + i, inter(BlockSize::B4x4, last, Mv::new(0, i as i16))));
            blocks.push((8 + i, 7, inter(BlockSize::B4x4, last, Mv::ZERO)));
        }
        let grid = grid_with(&blocks);
        let refs = FrameRefs::default();
        let ctx = FrameMvContext::new(&grid, &refs, MvRefOptions::default());

        let samples = ctx.find_warp_samples(8, 8, BlockSize::B32x32, last);

        assert_eq!(samples.len(), LEAST_SQUARES_SAMPLES_MAX);

        // Every sample comes from the row above.
        for (i, found) in samples.iter().enumerate() {
            let x = 8 * (4 * i as i32 + 1);
            assert_eq!(*found, sample((x, -24), (x + i as i32, -24)));
        }
    }

    #[test]
    fn verify_samples_require_matching_single_reference() {
        let (last, golden) = (RefFrame::Last, RefFrame::Golden);
        let grid = grid_with(&[
            (0, 0, BlockInfo::intra(BlockSize::B16x16, PredictionMode::DcPred)),
            (0, 4, inter(BlockSize::B16x16, golden, Mv::new(8, 8))),
            (0, 8, inter(BlockSize::B16x16, last, Mv::new(8, 8))),
            (
                4,
                0,
                BlockInfo::compound(
                    BlockSize::B16x16,
                    PredictionMode::NearestMv,
                    [last, golden],
                    [Mv::ZERO; 2],
                ),
            ),
        ]);
        let refs = FrameRefs::default();
        let ctx = FrameMvContext::new(&grid, &refs, MvRefOptions::default());

        let samples = ctx.find_warp_samples(4, 4, BlockSize::B16x16, last);

        assert_eq!(samples.as_slice(), &[sample((184, -72), (192, -64))]);

        // The above-right block lies in another tile.
        let tile = TileInfo { mi_row_start: 0, mi_row_end: 16, mi_col_start: 0, mi_col_end: 8 };
        let ctx = ctx.with_tile(tile);

        assert!(ctx.find_warp_samples(4, 4, BlockSize::B16x16, last).is_empty());
    }

    #[test]
    fn verify_select_prunes_by_mv_difference() {
        let mv = Mv::new(8, -8);

        // Differences from `mv` of 48, 4, 16, and 17.
        let mut samples: WarpSamples = [
            sample((0, 0), (32, 0)),
            sample((8, 8), (4, 16)),
            sample((-8, 8), (-16, 32)),
            sample((0, -8), (-25, 0)),
        ]
        .into_iter()
        .collect();

        let kept = select_warp_samples(&mut samples, mv, BlockSize::B16x16);

        assert_eq!(kept, 2);
        assert_eq!(samples.as_slice(), &[sample((-8, 8), (-16, 32)), sample((8, 8), (4, 16))]);
    }

    #[test]
    fn verify_select_threshold_follows_block_size() {
        let mv = Mv::ZERO;
        let far = [sample((0, 0), (40, 24)), sample((0, 0), (200, 0))];

        // A 16x16 block keeps differences up to 16.
        let mut samples: WarpSamples = far.into_iter().collect();
        assert_eq!(select_warp_samples(&mut samples, mv, BlockSize::B16x16), 1);
        assert_eq!(samples.as_slice(), &far[..1]);

        // A 64x16 block keeps differences up to 64.
        let mut samples: WarpSamples = far.into_iter().collect();
        assert_eq!(select_warp_samples(&mut samples, mv, BlockSize::B64x16), 1);
        assert_eq!(samples.as_slice(), &far[..1]);

        // The threshold never exceeds 112.
        let mut samples: WarpSamples = [sample((0, 0), (113, 0))].into_iter().collect();
        assert_eq!(select_warp_samples(&mut samples, mv, BlockSize::B128x128), 1);
    }

    #[test]
    fn verify_select_keeps_first_sample() {
        let far = [sample((0, 0), (64, 0)), sample((8, 0), (8, 64))];
        let mut samples: WarpSamples = far.into_iter().collect();

        assert_eq!(select_warp_samples(&mut samples, Mv::ZERO, BlockSize::B8x8), 1);
        assert_eq!(samples.as_slice(), &far[..1]);
    }
}
