// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The mode-info grid records the decoded blocks of a frame at 4x4 luma granularity.

use vireo_core::errors::{limit_error, logic_error, Result};

use crate::common::{BlockSize, Mv, PredictionMode, RefFrame, TxSize};

/// The largest frame dimension, in mode-info units, a grid may be created for (65536 pixels).
const MAX_MI_DIM: usize = 1 << 14;

/// Per-block mode information produced by the mode decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub size: BlockSize,
    pub mode: PredictionMode,
    /// The reference frames. The first is `Intra` for intra blocks, the second is only set for
    /// compound prediction.
    pub ref_frame: [RefFrame; 2],
    pub compound: bool,
    pub mv: [Mv; 2],
    /// True if the block has no residual.
    pub skip: bool,
    pub segment_id: u8,
    /// The uniform luma transform size of the block. Variable transform partitions are recorded
    /// on the grid with [`ModeInfoGrid::set_tx_size`].
    pub tx_size: TxSize,
    pub delta_lf_from_base: i8,
    pub delta_lf: [i8; 4],
}

impl BlockInfo {
    /// Instantiate an intra block using the largest transform for its size.
    pub fn intra(size: BlockSize, mode: PredictionMode) -> Self {
        BlockInfo {
            size,
            mode,
            ref_frame: [RefFrame::Intra, RefFrame::Intra],
            compound: false,
            mv: [Mv::ZERO; 2],
            skip: false,
            segment_id: 0,
            tx_size: TxSize::max_rect_luma(size),
            delta_lf_from_base: 0,
            delta_lf: [0; 4],
        }
    }

    /// Instantiate a single reference inter block.
    pub fn inter(size: BlockSize, mode: PredictionMode, ref_frame: RefFrame, mv: Mv) -> Self {
        BlockInfo {
            ref_frame: [ref_frame, RefFrame::Intra],
            mv: [mv, Mv::ZERO],
            ..BlockInfo::intra(size, mode)
        }
    }

    /// Instantiate a compound inter block.
    pub fn compound(
        size: BlockSize,
        mode: PredictionMode,
        ref_frames: [RefFrame; 2],
        mvs: [Mv; 2],
    ) -> Self {
        BlockInfo { ref_frame: ref_frames, compound: true, mv: mvs, ..BlockInfo::intra(size, mode) }
    }

    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_segment(mut self, segment_id: u8) -> Self {
        self.segment_id = segment_id;
        self
    }

    pub fn with_tx_size(mut self, tx_size: TxSize) -> Self {
        self.tx_size = tx_size;
        self
    }

    #[inline(always)]
    pub fn is_inter(&self) -> bool {
        self.ref_frame[0].is_inter()
    }

    /// Gets the reference frame in slot `idx`, or `None` if the slot is unused.
    #[inline(always)]
    pub fn ref_frame(&self, idx: usize) -> Option<RefFrame> {
        match idx {
            0 => Some(self.ref_frame[0]),
            1 if self.compound => Some(self.ref_frame[1]),
            _ => None,
        }
    }
}

/// A handle to a block stored in a [`ModeInfoGrid`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

#[derive(Clone, Debug)]
struct PlacedBlock {
    info: BlockInfo,
    mi_row: usize,
    mi_col: usize,
}

/// `ModeInfoGrid` maps every mode-info unit of a frame to the block covering it.
///
/// A unit is empty until the block covering it has been inserted, so the grid doubles as the map
/// of already decoded units.
#[derive(Clone, Debug)]
pub struct ModeInfoGrid {
    mi_rows: usize,
    mi_cols: usize,
    cells: Vec<Option<BlockId>>,
    tx_sizes: Vec<TxSize>,
    blocks: Vec<PlacedBlock>,
}

impl ModeInfoGrid {
    /// Instantiate an empty grid of `mi_rows` by `mi_cols` mode-info units.
    pub fn new(mi_rows: usize, mi_cols: usize) -> Result<Self> {
        if mi_rows == 0 || mi_cols == 0 {
            return logic_error("mode-info grid must not be empty");
        }
        if mi_rows > MAX_MI_DIM || mi_cols > MAX_MI_DIM {
            return limit_error("frame dimensions exceed the mode-info grid limit");
        }

        let units = mi_rows * mi_cols;

        Ok(ModeInfoGrid {
            mi_rows,
            mi_cols,
            cells: vec![None; units],
            tx_sizes: vec![TxSize::Tx4x4; units],
            blocks: Vec::new(),
        })
    }

    #[inline(always)]
    pub fn mi_rows(&self) -> usize {
        self.mi_rows
    }

    #[inline(always)]
    pub fn mi_cols(&self) -> usize {
        self.mi_cols
    }

    /// Removes all blocks from the grid and resets every transform size to 4x4.
    pub fn clear(&mut self) {
        self.cells.fill(None);
        self.tx_sizes.fill(TxSize::Tx4x4);
        self.blocks.clear();
    }

    /// Inserts a decoded block with its top-left unit at `(mi_row, mi_col)`. The parts of the block
    /// beyond the frame are not recorded. The transform size of every covered unit is set to the
    /// block's transform size.
    pub fn insert(&mut self, mi_row: usize, mi_col: usize, info: BlockInfo) -> Result<BlockId> {
        if mi_row >= self.mi_rows || mi_col >= self.mi_cols {
            return logic_error("block origin is outside the frame");
        }
        if mi_row % info.size.height_mi().min(16) != 0 || mi_col % info.size.width_mi().min(16) != 0
        {
            return logic_error("block origin is not aligned to the block size");
        }

        let id = BlockId(self.blocks.len() as u32);

        let row_end = (mi_row + info.size.height_mi()).min(self.mi_rows);
        let col_end = (mi_col + info.size.width_mi()).min(self.mi_cols);

        for row in mi_row..row_end {
            let base = row * self.mi_cols;
            self.cells[base + mi_col..base + col_end].fill(Some(id));
            self.tx_sizes[base + mi_col..base + col_end].fill(info.tx_size);
        }

        self.blocks.push(PlacedBlock { info, mi_row, mi_col });

        Ok(id)
    }

    /// Records a transform unit of size `tx_size` with its top-left unit at `(mi_row, mi_col)`.
    /// Units beyond the frame are not recorded.
    pub fn set_tx_size(&mut self, mi_row: usize, mi_col: usize, tx_size: TxSize) -> Result<()> {
        if mi_row >= self.mi_rows || mi_col >= self.mi_cols {
            return logic_error("transform origin is outside the frame");
        }

        let row_end = (mi_row + tx_size.height_units()).min(self.mi_rows);
        let col_end = (mi_col + tx_size.width_units()).min(self.mi_cols);

        for row in mi_row..row_end {
            let base = row * self.mi_cols;
            self.tx_sizes[base + mi_col..base + col_end].fill(tx_size);
        }

        Ok(())
    }

    /// Gets the block information of a block handle.
    #[inline(always)]
    pub fn block(&self, id: BlockId) -> &BlockInfo {
        &self.blocks[id.0 as usize].info
    }

    /// Gets the top-left unit of a block handle.
    #[inline(always)]
    pub fn origin(&self, id: BlockId) -> (usize, usize) {
        let placed = &self.blocks[id.0 as usize];
        (placed.mi_row, placed.mi_col)
    }

    /// Iterates over the inserted blocks and their top-left units in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, usize, &BlockInfo)> + '_ {
        self.blocks.iter().map(|placed| (placed.mi_row, placed.mi_col, &placed.info))
    }

    /// Gets the handle of the block covering the unit `(mi_row, mi_col)`, if any.
    #[inline(always)]
    pub fn id_at(&self, mi_row: usize, mi_col: usize) -> Option<BlockId> {
        if mi_row < self.mi_rows && mi_col < self.mi_cols {
            self.cells[mi_row * self.mi_cols + mi_col]
        }
        else {
            None
        }
    }

    /// Gets the block covering the unit `(mi_row, mi_col)`, if any.
    #[inline(always)]
    pub fn get(&self, mi_row: usize, mi_col: usize) -> Option<&BlockInfo> {
        self.id_at(mi_row, mi_col).map(|id| self.block(id))
    }

    /// Gets the block covering a unit given by signed coordinates. Coordinates outside the frame
    /// yield `None`.
    #[inline(always)]
    pub fn get_signed(&self, mi_row: i32, mi_col: i32) -> Option<&BlockInfo> {
        if mi_row < 0 || mi_col < 0 {
            return None;
        }
        self.get(mi_row as usize, mi_col as usize)
    }

    /// Returns true if the unit `(mi_row, mi_col)` has been decoded.
    #[inline(always)]
    pub fn is_decoded(&self, mi_row: i32, mi_col: i32) -> bool {
        self.get_signed(mi_row, mi_col).is_some()
    }

    /// Gets the transform size recorded for the unit `(mi_row, mi_col)`.
    #[inline(always)]
    pub fn tx_size_at(&self, mi_row: usize, mi_col: usize) -> Option<TxSize> {
        if mi_row < self.mi_rows && mi_col < self.mi_cols {
            Some(self.tx_sizes[mi_row * self.mi_cols + mi_col])
        }
        else {
            None
        }
    }
}

/// The bounds of a tile in mode-info units. The end bounds are exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileInfo {
    pub mi_row_start: usize,
    pub mi_row_end: usize,
    pub mi_col_start: usize,
    pub mi_col_end: usize,
}

impl TileInfo {
    /// A single tile spanning the whole grid.
    pub fn whole_frame(grid: &ModeInfoGrid) -> Self {
        TileInfo {
            mi_row_start: 0,
            mi_row_end: grid.mi_rows(),
            mi_col_start: 0,
            mi_col_end: grid.mi_cols(),
        }
    }

    /// Returns true if the unit at `(mi_row + row_offset, mi_col + col_offset)` lies in the tile.
    #[inline(always)]
    pub fn is_inside(&self, mi_row: i32, mi_col: i32, row_offset: i32, col_offset: i32) -> bool {
        let row = mi_row + row_offset;
        let col = mi_col + col_offset;

        !(row < self.mi_row_start as i32
            || col < self.mi_col_start as i32
            || row >= self.mi_row_end as i32
            || col >= self.mi_col_end as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_core::errors::Error;

    #[test]
    fn verify_insert_covers_block() {
        let mut grid = ModeInfoGrid::new(8, 8).unwrap();

        let id = grid
            .insert(
                4,
                4,
                BlockInfo::intra(BlockSize::B16x16, PredictionMode::DcPred).with_segment(3),
            )
            .unwrap();

        assert_eq!(grid.origin(id), (4, 4));
        assert_eq!(grid.id_at(7, 7), Some(id));
        assert_eq!(grid.id_at(3, 4), None);
        assert_eq!(grid.get(5, 6).map(|b| b.segment_id), Some(3));
        assert_eq!(grid.tx_size_at(6, 6), Some(TxSize::Tx16x16));
        assert!(grid.is_decoded(4, 4));
        assert!(!grid.is_decoded(-1, 4));
        assert!(!grid.is_decoded(4, 8));
    }

    #[test]
    fn verify_insert_clips_to_frame() {
        let mut grid = ModeInfoGrid::new(6, 6).unwrap();

        let id = grid.insert(0, 0, BlockInfo::intra(BlockSize::B32x32, PredictionMode::VPred));

        assert!(id.is_ok());
        assert!(grid.get(5, 5).is_some());
        assert_eq!(grid.tx_size_at(6, 0), None);
    }

    #[test]
    fn verify_insert_rejects_misplaced_blocks() {
        let mut grid = ModeInfoGrid::new(8, 8).unwrap();

        let info = BlockInfo::intra(BlockSize::B8x8, PredictionMode::DcPred);

        assert!(matches!(grid.insert(8, 0, info.clone()), Err(Error::LogicError(_))));
        assert!(matches!(grid.insert(1, 0, info), Err(Error::LogicError(_))));
    }

    #[test]
    fn verify_grid_limits() {
        assert!(matches!(ModeInfoGrid::new(0, 4), Err(Error::LogicError(_))));
        assert!(matches!(ModeInfoGrid::new(4, MAX_MI_DIM + 1), Err(Error::LimitError(_))));
    }

    #[test]
    fn verify_set_tx_size() {
        let mut grid = ModeInfoGrid::new(16, 16).unwrap();

        grid.insert(0, 0, BlockInfo::intra(BlockSize::B64x64, PredictionMode::DcPred)).unwrap();
        grid.set_tx_size(8, 8, TxSize::Tx16x8).unwrap();

        assert_eq!(grid.tx_size_at(8, 8), Some(TxSize::Tx16x8));
        assert_eq!(grid.tx_size_at(9, 11), Some(TxSize::Tx16x8));
        assert_eq!(grid.tx_size_at(10, 8), Some(TxSize::Tx64x64));
    }

    #[test]
    fn verify_clear_resets_tx_sizes() {
        let mut grid = ModeInfoGrid::new(16, 16).unwrap();

        grid.insert(0, 0, BlockInfo::intra(BlockSize::B64x64, PredictionMode::DcPred)).unwrap();
        grid.clear();

        assert_eq!(grid.blocks().count(), 0);
        assert!(!grid.is_decoded(3, 3));
        assert_eq!(grid.tx_size_at(3, 3), Some(TxSize::Tx4x4));
        assert_eq!(grid.tx_size_at(15, 15), Some(TxSize::Tx4x4));
    }

    #[test]
    fn verify_tile_is_inside() {
        let tile = TileInfo { mi_row_start: 16, mi_row_end: 32, mi_col_start: 0, mi_col_end: 16 };

        assert!(tile.is_inside(16, 0, 0, 0));
        assert!(!tile.is_inside(16, 0, -1, 0));
        assert!(!tile.is_inside(16, 15, 0, 1));
        assert!(tile.is_inside(20, 8, 11, 7));
    }
}
