// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::{BitAnd, BitAndAssign, BitOrAssign, Not, Range};

use lazy_static::lazy_static;
use log::{trace, warn};
use smallvec::SmallVec;
use thiserror::Error;

use vireo_core::errors::{logic_error, Error, Result};

use crate::common::{BlockSize, Plane, SuperblockSize, TxSize, MI_SIZE_64X64};
use crate::grid::{BlockInfo, ModeInfoGrid};

use super::level::{LoopFilterInfo, LoopFilterParams, SegmentationParams};
use super::EdgeDir;

/// Everything but column 0 of every row.
const LEFT_EDGE_CLEAR: u64 = 0xfffe_fffe_fffe_fffe;
/// Everything but row 0 of the first word.
const ABOVE_EDGE_CLEAR: u64 = 0xffff_ffff_ffff_0000;

/// The size class of an edge, given by the transform length across the edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TxClass {
    Tx4 = 0,
    Tx8 = 1,
    Tx16 = 2,
    Tx32 = 3,
}

impl TxClass {
    pub const ALL: [TxClass; 4] = [TxClass::Tx4, TxClass::Tx8, TxClass::Tx16, TxClass::Tx32];

    /// The class of a transform `len` pixels long across the edge.
    #[inline(always)]
    pub fn from_len(len: usize) -> TxClass {
        match len {
            0..=4 => TxClass::Tx4,
            5..=8 => TxClass::Tx8,
            9..=16 => TxClass::Tx16,
            _ => TxClass::Tx32,
        }
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A bitmap of the 16x16 4x4 units of a plane's part of a 64x64 luma area. Subsampled chroma
/// planes occupy the top rows or left columns only.
///
/// The unit at `(row, col)` is bit `(row % 4) * 16 + col` of word `row / 4`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitBits(pub [u64; 4]);

impl UnitBits {
    pub const EMPTY: UnitBits = UnitBits([0; 4]);

    /// A bitmap with the units of `rows` by `cols` set.
    pub fn rect(rows: Range<usize>, cols: Range<usize>) -> UnitBits {
        let mut bits = UnitBits::EMPTY;
        for row in rows.start..rows.end.min(16) {
            for col in cols.start..cols.end.min(16) {
                bits.set(row, col);
            }
        }
        bits
    }

    #[inline(always)]
    pub fn set(&mut self, row: usize, col: usize) {
        self.0[row >> 2] |= 1 << (((row & 3) << 4) + col);
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> bool {
        (self.0[row >> 2] >> (((row & 3) << 4) + col)) & 1 != 0
    }

    /// Gets the 16 units of `row` with column 0 in the lowest bit.
    #[inline(always)]
    pub fn row(&self, row: usize) -> u16 {
        (self.0[row >> 2] >> ((row & 3) << 4)) as u16
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    /// Moves every unit `n` positions forward in raster order. Units moved past the end are
    /// discarded.
    pub fn shifted(&self, n: usize) -> UnitBits {
        let words = n >> 6;
        let bits = (n & 63) as u32;

        let mut out = UnitBits::EMPTY;

        for i in words..4 {
            let src = i - words;

            out.0[i] = self.0[src] << bits;

            if bits > 0 && src > 0 {
                out.0[i] |= self.0[src - 1] >> (64 - bits);
            }
        }

        out
    }
}

impl BitAnd for UnitBits {
    type Output = UnitBits;

    fn bitand(self, rhs: UnitBits) -> UnitBits {
        let mut out = self;
        for (word, rhs) in out.0.iter_mut().zip(rhs.0) {
            *word &= rhs;
        }
        out
    }
}

impl BitAndAssign for UnitBits {
    fn bitand_assign(&mut self, rhs: UnitBits) {
        *self = *self & rhs;
    }
}

impl BitOrAssign for UnitBits {
    fn bitor_assign(&mut self, rhs: UnitBits) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a |= b;
        }
    }
}

impl Not for UnitBits {
    type Output = UnitBits;

    fn not(self) -> UnitBits {
        UnitBits(self.0.map(|w| !w))
    }
}

/// The luma area whose chroma is carried by a block. Along a subsampled axis, blocks shorter than
/// 8 pixels share chroma with their neighbours.
fn chroma_area(bsize: BlockSize, ss_x: usize, ss_y: usize) -> BlockSize {
    let bsize = bsize.clip_to_64();
    let width = bsize.width().max(4 << ss_x);
    let height = bsize.height().max(4 << ss_y);
    BlockSize::from_dims(width, height).unwrap_or(bsize)
}

/// Every `step`-th column of every row.
fn grid_columns(step: usize) -> UnitBits {
    let mut bits = UnitBits::EMPTY;
    for row in 0..16 {
        for col in (0..16).step_by(step) {
            bits.set(row, col);
        }
    }
    bits
}

/// Every `step`-th row.
fn grid_rows(step: usize) -> UnitBits {
    let mut bits = UnitBits::EMPTY;
    for row in (0..16).step_by(step) {
        for col in 0..16 {
            bits.set(row, col);
        }
    }
    bits
}

lazy_static! {
    /// The left edges of a transform placed at the top-left unit.
    static ref LEFT_TX_MASK: [UnitBits; 19] =
        TxSize::ALL.map(|tx| UnitBits::rect(0..tx.height_units(), 0..1));

    /// The above edges of a transform placed at the top-left unit.
    static ref ABOVE_TX_MASK: [UnitBits; 19] =
        TxSize::ALL.map(|tx| UnitBits::rect(0..1, 0..tx.width_units()));

    /// The units covered by a block placed at the top-left unit.
    static ref BLOCK_COVERAGE_Y: [UnitBits; 22] =
        BlockSize::ALL.map(|b| UnitBits::rect(0..b.height_mi(), 0..b.width_mi()));

    /// The left edges lying on the 32x32 luma pixel grid, by horizontal subsampling.
    static ref LEFT_BORDER: [UnitBits; 2] = [grid_columns(8), grid_columns(4)];

    /// The above edges lying on the 32x32 luma pixel grid, by vertical subsampling.
    static ref ABOVE_BORDER: [UnitBits; 2] = [grid_rows(8), grid_rows(4)];
}

/// Errors detected while building a loop filter mask.
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("{plane} {dir:?} edge classes {a:?} and {b:?} overlap")]
    Overlap { plane: &'static str, dir: EdgeDir, a: TxClass, b: TxClass },
    #[error("a {width}x{height} transform region has no transform size")]
    TxPartition { width: usize, height: usize },
}

impl From<MaskError> for Error {
    fn from(err: MaskError) -> Self {
        warn!("loop filter mask: {}", err);

        match err {
            MaskError::Overlap { .. } => Error::LogicError("loop filter edge classes overlap"),
            MaskError::TxPartition { .. } => {
                Error::LogicError("transform partition does not tile the block")
            }
        }
    }
}

/// Returns the first pair of classes that share a unit.
fn first_overlap(classes: &[UnitBits; 4]) -> Option<(TxClass, TxClass)> {
    for a in 0..4 {
        for b in a + 1..4 {
            if !(classes[a] & classes[b]).is_empty() {
                return Some((TxClass::ALL[a], TxClass::ALL[b]));
            }
        }
    }
    None
}

/// The edge masks and filter levels of a 64x64 area.
///
/// Each direction holds one bitmap per [`TxClass`]. A set bit marks the left (vertical) or top
/// (horizontal) edge of a 4x4 unit for filtering with the class' filter. A single bitmap is shared
/// by both chroma planes, laid out in chroma units.
#[derive(Clone, Debug)]
pub struct LoopFilterMask {
    /// Top-left unit of the area.
    pub mi_row: usize,
    pub mi_col: usize,
    /// Luma units of the area inside the frame.
    pub rows: usize,
    pub cols: usize,
    /// Chroma subsampling shifts.
    pub ss_x: usize,
    pub ss_y: usize,
    pub left_y: [UnitBits; 4],
    pub above_y: [UnitBits; 4],
    pub left_uv: [UnitBits; 4],
    pub above_uv: [UnitBits; 4],
    /// Luma filter levels by edge direction, row, and column.
    pub lfl_y: [[[u8; 16]; 16]; 2],
    /// U and V filter levels by chroma row and column.
    pub lfl_uv: [[[u8; 16]; 16]; 2],
}

impl LoopFilterMask {
    fn new(mi_row: usize, mi_col: usize, rows: usize, cols: usize, ss: (usize, usize)) -> Self {
        LoopFilterMask {
            mi_row,
            mi_col,
            rows,
            cols,
            ss_x: ss.0,
            ss_y: ss.1,
            left_y: [UnitBits::EMPTY; 4],
            above_y: [UnitBits::EMPTY; 4],
            left_uv: [UnitBits::EMPTY; 4],
            above_uv: [UnitBits::EMPTY; 4],
            lfl_y: [[[0; 16]; 16]; 2],
            lfl_uv: [[[0; 16]; 16]; 2],
        }
    }

    /// Chroma units of the area inside the frame.
    #[inline(always)]
    pub fn uv_rows(&self) -> usize {
        (self.rows + self.ss_y) >> self.ss_y
    }

    #[inline(always)]
    pub fn uv_cols(&self) -> usize {
        (self.cols + self.ss_x) >> self.ss_x
    }

    /// Verifies that no unit edge is marked in more than one class.
    pub fn check_exclusive(&self) -> Result<()> {
        self.exclusivity().map_err(Error::from)
    }

    fn exclusivity(&self) -> std::result::Result<(), MaskError> {
        let planes = [
            ("luma", EdgeDir::Vertical, &self.left_y),
            ("luma", EdgeDir::Horizontal, &self.above_y),
            ("chroma", EdgeDir::Vertical, &self.left_uv),
            ("chroma", EdgeDir::Horizontal, &self.above_uv),
        ];

        for (plane, dir, classes) in planes {
            if let Some((a, b)) = first_overlap(classes) {
                return Err(MaskError::Overlap { plane, dir, a, b });
            }
        }

        Ok(())
    }

    /// Merges the 32x32 class into the 16x16 class and widens 4x4 edges on the 32x32 grid.
    fn merge_classes(&mut self) {
        let (c4, c8, c16, c32) = (0, 1, 2, 3);
        let (ss_x, ss_y) = (self.ss_x, self.ss_y);

        let edges = [
            (&mut self.left_y, LEFT_BORDER[0]),
            (&mut self.above_y, ABOVE_BORDER[0]),
            (&mut self.left_uv, LEFT_BORDER[ss_x]),
            (&mut self.above_uv, ABOVE_BORDER[ss_y]),
        ];

        for (classes, border) in edges {
            let c32_bits = classes[c32];
            classes[c16] |= c32_bits;
            classes[c32] = UnitBits::EMPTY;

            let widened = classes[c4] & border;
            classes[c8] |= widened;
            classes[c4] &= !border;
        }
    }

    /// Removes the edges along the left column of the area.
    fn clear_left_edge(&mut self) {
        for class in self.left_y.iter_mut().chain(self.left_uv.iter_mut()) {
            *class &= UnitBits([LEFT_EDGE_CLEAR; 4]);
        }
    }

    /// Removes the edges along the top row of the area.
    fn clear_above_edge(&mut self) {
        for class in self.above_y.iter_mut().chain(self.above_uv.iter_mut()) {
            class.0[0] &= ABOVE_EDGE_CLEAR;
        }
    }
}

/// The chroma format of a frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ChromaFormat {
    Monochrome,
    #[default]
    Yuv420,
    Yuv422,
    Yuv444,
}

impl ChromaFormat {
    /// The horizontal and vertical subsampling shifts of the chroma planes, or `None` if the
    /// frame has no chroma.
    pub fn subsampling(self) -> Option<(usize, usize)> {
        match self {
            ChromaFormat::Monochrome => None,
            ChromaFormat::Yuv420 => Some((1, 1)),
            ChromaFormat::Yuv422 => Some((1, 0)),
            ChromaFormat::Yuv444 => Some((0, 0)),
        }
    }
}

/// Options of the mask builder.
#[derive(Copy, Clone, Debug)]
pub struct MaskOptions {
    /// Filter the edges lying on tile boundaries.
    pub filter_across_tiles: bool,
    pub chroma: ChromaFormat,
}

impl Default for MaskOptions {
    fn default() -> Self {
        MaskOptions { filter_across_tiles: true, chroma: ChromaFormat::Yuv420 }
    }
}
/// The tile boundaries of a frame, as sorted lists of the first row and column of each tile in
/// mode-info units.
#[derive(Clone, Debug)]
pub struct TileLayout {
    row_starts: Vec<usize>,
    col_starts: Vec<usize>,
}

impl Default for TileLayout {
    fn default() -> Self {
        TileLayout { row_starts: vec![0], col_starts: vec![0] }
    }
}

impl TileLayout {
    pub fn new(mut row_starts: Vec<usize>, mut col_starts: Vec<usize>) -> Self {
        row_starts.sort_unstable();
        col_starts.sort_unstable();
        TileLayout { row_starts, col_starts }
    }

    #[inline(always)]
    pub fn is_row_start(&self, mi_row: usize) -> bool {
        self.row_starts.binary_search(&mi_row).is_ok()
    }

    #[inline(always)]
    pub fn is_col_start(&self, mi_col: usize) -> bool {
        self.col_starts.binary_search(&mi_col).is_ok()
    }
}

/// `MaskBuilder` builds the [`LoopFilterMask`] of 64x64 areas of a frame.
pub struct MaskBuilder<'a> {
    grid: &'a ModeInfoGrid,
    info: &'a LoopFilterInfo,
    params: &'a LoopFilterParams,
    seg: &'a SegmentationParams,
    tiles: &'a TileLayout,
    options: MaskOptions,
}

impl<'a> MaskBuilder<'a> {
    pub fn new(
        grid: &'a ModeInfoGrid,
        info: &'a LoopFilterInfo,
        params: &'a LoopFilterParams,
        seg: &'a SegmentationParams,
        tiles: &'a TileLayout,
        options: MaskOptions,
    ) -> Self {
        MaskBuilder { grid, info, params, seg, tiles, options }
    }

    pub fn grid(&self) -> &'a ModeInfoGrid {
        self.grid
    }

    pub fn params(&self) -> &'a LoopFilterParams {
        self.params
    }

    /// Returns true if the frame has the plane.
    pub fn has_plane(&self, plane: Plane) -> bool {
        plane == Plane::Y || self.options.chroma.subsampling().is_some()
    }

    /// Builds the masks of every 64x64 area of the superblock at `(mi_row, mi_col)` that lies in
    /// the frame, in raster order.
    pub fn build_superblock_masks(
        &self,
        mi_row: usize,
        mi_col: usize,
        sb_size: SuperblockSize,
    ) -> Result<SmallVec<[LoopFilterMask; 4]>> {
        let sb = sb_size.mi_size();

        if mi_row % sb != 0 || mi_col % sb != 0 {
            return logic_error("superblock origin is not aligned");
        }

        let mut masks = SmallVec::new();

        for row in (mi_row..mi_row + sb).step_by(MI_SIZE_64X64) {
            for col in (mi_col..mi_col + sb).step_by(MI_SIZE_64X64) {
                if row < self.grid.mi_rows() && col < self.grid.mi_cols() {
                    masks.push(self.build_mask(row, col)?);
                }
            }
        }

        Ok(masks)
    }

    /// Builds the mask of the 64x64 area at `(mi_row, mi_col)`.
    pub fn build_mask(&self, mi_row: usize, mi_col: usize) -> Result<LoopFilterMask> {
        if mi_row % MI_SIZE_64X64 != 0 || mi_col % MI_SIZE_64X64 != 0 {
            return logic_error("loop filter area is not aligned to 64x64");
        }
        if mi_row >= self.grid.mi_rows() || mi_col >= self.grid.mi_cols() {
            return logic_error("loop filter area is outside the frame");
        }

        let rows = (self.grid.mi_rows() - mi_row).min(MI_SIZE_64X64);
        let cols = (self.grid.mi_cols() - mi_col).min(MI_SIZE_64X64);

        let ss = self.options.chroma.subsampling().unwrap_or((1, 1));

        let mut mask = LoopFilterMask::new(mi_row, mi_col, rows, cols, ss);

        self.walk_partition(&mut mask, 0, 0, MI_SIZE_64X64)?;

        mask.merge_classes();

        let across = self.options.filter_across_tiles;

        if mi_col == 0 || (!across && self.tiles.is_col_start(mi_col)) {
            mask.clear_left_edge();
        }
        if mi_row == 0 || (!across && self.tiles.is_row_start(mi_row)) {
            mask.clear_above_edge();
        }

        if let Err(err) = mask.exclusivity() {
            warn!("rejecting loop filter area at ({}, {})", mi_row, mi_col);
            return Err(err.into());
        }

        trace!("loop filter mask at ({}, {}), {}x{} units", mi_row, mi_col, rows, cols);

        Ok(mask)
    }

    /// Visits the square region of `size` units at `(row, col)` of the area, building each block
    /// when its first region in the area is reached.
    fn walk_partition(
        &self,
        mask: &mut LoopFilterMask,
        row: usize,
        col: usize,
        size: usize,
    ) -> std::result::Result<(), MaskError> {
        if row >= mask.rows || col >= mask.cols {
            return Ok(());
        }

        let id = match self.grid.id_at(mask.mi_row + row, mask.mi_col + col) {
            Some(id) => id,
            None => return Ok(()),
        };

        let block = self.grid.block(id);
        let bsize = block.size.clip_to_64();

        if size > 1 && (bsize.width_mi() < size || bsize.height_mi() < size) {
            let half = size / 2;

            for (dr, dc) in [(0, 0), (0, half), (half, 0), (half, half)] {
                self.walk_partition(mask, row + dr, col + dc, half)?;
            }

            return Ok(());
        }

        let (block_row, block_col) = self.grid.origin(id);

        let first_row = block_row.max(mask.mi_row) - mask.mi_row;
        let first_col = block_col.max(mask.mi_col) - mask.mi_col;

        if (first_row, first_col) == (row, col) {
            self.build_block(mask, block, row, col)?;

            if let Some((ss_x, ss_y)) = self.options.chroma.subsampling() {
                if is_chroma_reference(block.size, block_row, block_col, ss_x, ss_y) {
                    self.build_block_uv(mask, block, block_row, block_col);
                }
            }
        }

        Ok(())
    }

    /// Marks the luma edges of a block whose top-left unit in the area is `(row, col)`.
    fn build_block(
        &self,
        mask: &mut LoopFilterMask,
        block: &BlockInfo,
        row: usize,
        col: usize,
    ) -> std::result::Result<(), MaskError> {
        let bsize = block.size.clip_to_64();

        let levels = [
            self.info.filter_level(self.params, self.seg, block, Plane::Y, EdgeDir::Vertical),
            self.info.filter_level(self.params, self.seg, block, Plane::Y, EdgeDir::Horizontal),
        ];

        let row_end = (row + bsize.height_mi()).min(mask.rows);
        let col_end = (col + bsize.width_mi()).min(mask.cols);

        for (dir, &level) in levels.iter().enumerate() {
            for lfl_row in &mut mask.lfl_y[dir][row..row_end] {
                lfl_row[col..col_end].fill(level);
            }
        }

        if levels == [0, 0] {
            return Ok(());
        }

        let coverage = BLOCK_COVERAGE_Y[bsize as usize].shifted(row * 16 + col)
            & UnitBits::rect(0..mask.rows, 0..mask.cols);

        let luma = EdgeTarget { coverage, dirs: levels.map(|level| level != 0) };

        if block.is_inter() && block.skip {
            // No residual, so only the block boundary is an edge.
            luma.mark(&mut mask.left_y, &mut mask.above_y, TxSize::max_rect_luma(bsize), row, col);
            Ok(())
        }
        else {
            self.walk_tx(mask, &luma, row, col, bsize.width_mi(), bsize.height_mi())
        }
    }

    /// Descends the transform partition of the `width` by `height` unit region at `(row, col)`,
    /// marking the edges of every transform unit.
    fn walk_tx(
        &self,
        mask: &mut LoopFilterMask,
        luma: &EdgeTarget,
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    ) -> std::result::Result<(), MaskError> {
        if row >= mask.rows || col >= mask.cols {
            return Ok(());
        }

        let tx = match self.grid.tx_size_at(mask.mi_row + row, mask.mi_col + col) {
            Some(tx) => tx,
            None => return Ok(()),
        };

        let (tx_w, tx_h) = (tx.width_units(), tx.height_units());

        if tx_w >= width && tx_h >= height {
            let unit = TxSize::from_dims(width * 4, height * 4)
                .ok_or(MaskError::TxPartition { width: width * 4, height: height * 4 })?;

            luma.mark(&mut mask.left_y, &mut mask.above_y, unit, row, col);
            return Ok(());
        }

        let sub_w = if tx_w < width { width / 2 } else { width };
        let sub_h = if tx_h < height { height / 2 } else { height };

        for dr in (0..height).step_by(sub_h) {
            for dc in (0..width).step_by(sub_w) {
                self.walk_tx(mask, luma, row + dr, col + dc, sub_w, sub_h)?;
            }
        }

        Ok(())
    }

    /// Marks the chroma edges of a chroma reference block with origin `(block_row, block_col)`.
    fn build_block_uv(
        &self,
        mask: &mut LoopFilterMask,
        block: &BlockInfo,
        block_row: usize,
        block_col: usize,
    ) {
        let (ss_x, ss_y) = (mask.ss_x, mask.ss_y);

        let area = chroma_area(block.size, ss_x, ss_y);

        // Along a subsampled axis, the chroma of a 4 pixel block starts at the 8x8 boundary.
        let shared_row = ss_y == 1 && block.size.height_mi() == 1;
        let shared_col = ss_x == 1 && block.size.width_mi() == 1;

        let area_row = if shared_row { block_row & !1 } else { block_row };
        let area_col = if shared_col { block_col & !1 } else { block_col };

        let row = (area_row.max(mask.mi_row) - mask.mi_row) >> ss_y;
        let col = (area_col.max(mask.mi_col) - mask.mi_col) >> ss_x;

        let (height, width) = (area.height_mi() >> ss_y, area.width_mi() >> ss_x);

        // A chroma plane has a single filter level for both edge directions.
        let levels = [
            self.info.filter_level(self.params, self.seg, block, Plane::U, EdgeDir::Vertical),
            self.info.filter_level(self.params, self.seg, block, Plane::V, EdgeDir::Vertical),
        ];

        let row_end = (row + height).min(mask.uv_rows());
        let col_end = (col + width).min(mask.uv_cols());

        for (plane, &level) in levels.iter().enumerate() {
            for lfl_row in &mut mask.lfl_uv[plane][row..row_end] {
                lfl_row[col..col_end].fill(level);
            }
        }

        if levels == [0, 0] {
            return;
        }

        let coverage = UnitBits::rect(row..row_end, col..col_end);
        let chroma = EdgeTarget { coverage, dirs: [true; 2] };

        let tx = TxSize::max_rect(width * 4, height * 4, 32);

        for dr in (0..height).step_by(tx.height_units()) {
            for dc in (0..width).step_by(tx.width_units()) {
                if row + dr >= 16 || col + dc >= 16 {
                    continue;
                }

                chroma.mark(&mut mask.left_uv, &mut mask.above_uv, tx, row + dr, col + dc);
            }
        }
    }
}

/// Returns true if the block carries the chroma of its area. Of the blocks 4 pixels long along a
/// subsampled axis, only the bottom or right one does.
#[inline(always)]
fn is_chroma_reference(
    bsize: BlockSize,
    mi_row: usize,
    mi_col: usize,
    ss_x: usize,
    ss_y: usize,
) -> bool {
    let row_ok = ss_y == 0 || mi_row & 1 == 1 || bsize.height_mi() & 1 == 0;
    let col_ok = ss_x == 0 || mi_col & 1 == 1 || bsize.width_mi() & 1 == 0;
    row_ok && col_ok
}

/// The coverage of the block being marked and the edge directions it is filtered in.
struct EdgeTarget {
    coverage: UnitBits,
    /// Vertical, then horizontal.
    dirs: [bool; 2],
}

impl EdgeTarget {
    /// Marks the left and top edges of a transform unit at `(row, col)`. Left edges are classed by
    /// the transform width, top edges by the transform height.
    fn mark(
        &self,
        left: &mut [UnitBits; 4],
        above: &mut [UnitBits; 4],
        tx: TxSize,
        row: usize,
        col: usize,
    ) {
        let shift = row * 16 + col;

        if self.dirs[0] {
            left[TxClass::from_len(tx.width()).index()] |=
                LEFT_TX_MASK[tx as usize].shifted(shift) & self.coverage;
        }
        if self.dirs[1] {
            above[TxClass::from_len(tx.height()).index()] |=
                ABOVE_TX_MASK[tx as usize].shifted(shift) & self.coverage;
        }
    }
}
