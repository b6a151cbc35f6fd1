// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The deblocking loop filter.
//!
//! Filtering a frame is split in three stages:
//!
//! 1. [`LoopFilterInfo`] resolves the filter level of every block and the thresholds of every
//!    filter level.
//! 2. [`MaskBuilder`] walks the blocks and transform units of each 64x64 area and records which
//!    4x4 unit edges are filtered, and with which filter length, in a [`LoopFilterMask`].
//! 3. [`LoopFilterApplier`] visits the masked edges in filtering order and hands each one to an
//!    [`EdgeFilter`] which performs the pixel arithmetic.
//!
//! [`LoopFilterFrame`] drives all three stages over a range of superblock rows.

use std::ops::Range;

use log::trace;

use vireo_core::errors::Result;

use crate::common::{Plane, SuperblockSize};

mod apply;
mod level;
mod mask;

pub use apply::{ApplierOptions, EdgeFilter, FilterEdge, FilterLength, LoopFilterApplier};
pub use level::{
    LoopFilterInfo, LoopFilterParams, LoopFilterThresh, SegFeatures, SegmentationParams,
    DEFAULT_REF_DELTAS, MAX_LOOP_FILTER,
};
pub use mask::{
    ChromaFormat, LoopFilterMask, MaskBuilder, MaskError, MaskOptions, TileLayout, TxClass,
    UnitBits,
};

/// The direction of the edges filtered by a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EdgeDir {
    /// Vertical edges, lying on the left side of a 4x4 unit.
    Vertical,
    /// Horizontal edges, lying on the top side of a 4x4 unit.
    Horizontal,
}

impl EdgeDir {
    pub const ALL: [EdgeDir; 2] = [EdgeDir::Vertical, EdgeDir::Horizontal];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// `LoopFilterFrame` filters whole superblock rows of a frame.
pub struct LoopFilterFrame<'a> {
    builder: MaskBuilder<'a>,
    applier: LoopFilterApplier<'a>,
    sb_size: SuperblockSize,
}

impl<'a> LoopFilterFrame<'a> {
    pub fn new(
        builder: MaskBuilder<'a>,
        applier: LoopFilterApplier<'a>,
        sb_size: SuperblockSize,
    ) -> Self {
        LoopFilterFrame { builder, applier, sb_size }
    }

    /// The number of superblock rows of the frame.
    pub fn sb_rows(&self) -> usize {
        let sb = self.sb_size.mi_size();
        (self.builder.grid().mi_rows() + sb - 1) / sb
    }

    /// The number of superblock columns of the frame.
    pub fn sb_cols(&self) -> usize {
        let sb = self.sb_size.mi_size();
        (self.builder.grid().mi_cols() + sb - 1) / sb
    }

    /// Filters every superblock row of the frame.
    pub fn filter_frame<F: EdgeFilter + ?Sized>(&self, filter: &mut F) -> Result<()> {
        self.filter_rows(0..self.sb_rows(), filter)
    }

    /// Filters the superblock rows in `sb_rows`. For every plane, all vertical edges of the rows
    /// are filtered before any horizontal edge.
    pub fn filter_rows<F: EdgeFilter + ?Sized>(
        &self,
        sb_rows: Range<usize>,
        filter: &mut F,
    ) -> Result<()> {
        let params = self.builder.params();

        if !params.plane_enabled(Plane::Y) {
            return Ok(());
        }

        let sb = self.sb_size.mi_size();
        let sb_rows = sb_rows.start..sb_rows.end.min(self.sb_rows());

        let mut masks = Vec::new();

        for sb_row in sb_rows.clone() {
            for sb_col in 0..self.sb_cols() {
                let sb_masks =
                    self.builder.build_superblock_masks(sb_row * sb, sb_col * sb, self.sb_size)?;
                masks.extend(sb_masks);
            }
        }

        trace!("loop filter rows {:?}: {} masks", sb_rows, masks.len());

        for plane in Plane::ALL {
            if !params.plane_enabled(plane) || !self.builder.has_plane(plane) {
                continue;
            }

            for mask in &masks {
                self.applier.filter_vertical(mask, plane, filter);
            }
            for mask in &masks {
                self.applier.filter_horizontal(mask, plane, filter);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{BlockSize, PredictionMode};
    use crate::grid::{BlockInfo, ModeInfoGrid};

    #[derive(Default)]
    struct Recorder {
        edges: Vec<FilterEdge>,
    }

    impl EdgeFilter for Recorder {
        fn filter(&mut self, edge: &FilterEdge) {
            self.edges.push(*edge);
        }
    }

    fn intra_frame(mi_rows: usize, mi_cols: usize, bsize: BlockSize) -> ModeInfoGrid {
        let mut grid = ModeInfoGrid::new(mi_rows, mi_cols).unwrap();

        for row in (0..mi_rows).step_by(bsize.height_mi()) {
            for col in (0..mi_cols).step_by(bsize.width_mi()) {
                grid.insert(row, col, BlockInfo::intra(bsize, PredictionMode::DcPred)).unwrap();
            }
        }

        grid
    }

    #[test]
    fn verify_disabled_filter_skips_frame() {
        let grid = intra_frame(16, 16, BlockSize::B16x16);

        let params = LoopFilterParams::default();
        let seg = SegmentationParams::default();
        let info = LoopFilterInfo::new(&params);
        let tiles = TileLayout::default();

        let builder =
            MaskBuilder::new(&grid, &info, &params, &seg, &tiles, MaskOptions::default());
        let applier = LoopFilterApplier::new(&info, ApplierOptions::default());
        let frame = LoopFilterFrame::new(builder, applier, SuperblockSize::Sb64);

        let mut rec = Recorder::default();
        frame.filter_frame(&mut rec).unwrap();

        assert!(rec.edges.is_empty());
    }

    #[test]
    fn verify_vertical_before_horizontal() {
        // Two superblocks of 16x16 blocks, luma only.
        let grid = intra_frame(16, 32, BlockSize::B16x16);

        let params = LoopFilterParams { filter_level: [10, 10], ..Default::default() };
        let seg = SegmentationParams::default();
        let mut info = LoopFilterInfo::new(&params);
        info.frame_init(&params, &seg);
        let tiles = TileLayout::default();

        let builder =
            MaskBuilder::new(&grid, &info, &params, &seg, &tiles, MaskOptions::default());
        let applier = LoopFilterApplier::new(&info, ApplierOptions::default());
        let frame = LoopFilterFrame::new(builder, applier, SuperblockSize::Sb64);

        assert_eq!(frame.sb_rows(), 1);
        assert_eq!(frame.sb_cols(), 2);

        let mut rec = Recorder::default();
        frame.filter_frame(&mut rec).unwrap();

        let first_horizontal =
            rec.edges.iter().position(|e| e.dir == EdgeDir::Horizontal).unwrap();

        assert!(rec.edges[..first_horizontal].iter().all(|e| e.dir == EdgeDir::Vertical));
        assert!(rec.edges[first_horizontal..].iter().all(|e| e.dir == EdgeDir::Horizontal));
        assert!(rec.edges.iter().all(|e| e.plane == Plane::Y));

        // The vertical edges of the second superblock include the seam at x = 64.
        assert!(rec.edges.iter().any(|e| e.dir == EdgeDir::Vertical && e.x == 64));
        // The picture edge is never filtered.
        assert!(!rec.edges.iter().any(|e| e.dir == EdgeDir::Vertical && e.x == 0));
        assert!(!rec.edges.iter().any(|e| e.dir == EdgeDir::Horizontal && e.y == 0));
    }

    #[test]
    fn verify_row_range_split() {
        let grid = intra_frame(32, 16, BlockSize::B32x32);

        let params = LoopFilterParams {
            filter_level: [10, 10],
            filter_level_u: 4,
            filter_level_v: 4,
            ..Default::default()
        };
        let seg = SegmentationParams::default();
        let mut info = LoopFilterInfo::new(&params);
        info.frame_init(&params, &seg);
        let tiles = TileLayout::default();

        let builder =
            MaskBuilder::new(&grid, &info, &params, &seg, &tiles, MaskOptions::default());
        let applier = LoopFilterApplier::new(&info, ApplierOptions::default());
        let frame = LoopFilterFrame::new(builder, applier, SuperblockSize::Sb64);

        let mut whole = Recorder::default();
        frame.filter_frame(&mut whole).unwrap();

        let mut top = Recorder::default();
        let mut bottom = Recorder::default();
        frame.filter_rows(0..1, &mut top).unwrap();
        frame.filter_rows(1..2, &mut bottom).unwrap();

        assert_eq!(whole.edges.len(), top.edges.len() + bottom.edges.len());
        assert!(top.edges.iter().all(|e| e.y < if e.plane == Plane::Y { 64 } else { 32 }));
        assert!(bottom.edges.iter().all(|e| e.y >= if e.plane == Plane::Y { 64 } else { 32 }));
    }
}
