// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::common::Plane;

use super::level::{LoopFilterInfo, LoopFilterThresh};
use super::mask::{LoopFilterMask, TxClass};
use super::EdgeDir;

/// The number of pixels on each side of an edge read by a filter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterLength {
    Taps4,
    Taps6,
    Taps8,
    Taps16,
}

impl FilterLength {
    pub fn taps(self) -> usize {
        match self {
            FilterLength::Taps4 => 4,
            FilterLength::Taps6 => 6,
            FilterLength::Taps8 => 8,
            FilterLength::Taps16 => 16,
        }
    }
}

/// A 4 pixel long edge segment to filter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FilterEdge {
    pub plane: Plane,
    pub dir: EdgeDir,
    /// Plane position of the first pixel right of, or below, the edge.
    pub x: usize,
    pub y: usize,
    pub length: FilterLength,
    pub thresh: LoopFilterThresh,
    /// The thresholds of the next 4 pixel segment along the edge, if it is filtered by the same
    /// call. The next segment is below a vertical edge, or right of a horizontal edge.
    pub dual: Option<LoopFilterThresh>,
}

/// `EdgeFilter` performs the pixel arithmetic of the deblocking filter.
pub trait EdgeFilter {
    fn filter(&mut self, edge: &FilterEdge);
}

impl<F: FnMut(&FilterEdge)> EdgeFilter for F {
    fn filter(&mut self, edge: &FilterEdge) {
        self(edge)
    }
}

/// Options of the applier.
#[derive(Copy, Clone, Debug)]
pub struct ApplierOptions {
    /// Use the 6-tap filter for 8 and 16 pixel chroma edges.
    pub chroma_6tap: bool,
    /// Filter two adjacent segments of equal length in one call.
    pub combine_dual: bool,
}

impl Default for ApplierOptions {
    fn default() -> Self {
        ApplierOptions { chroma_6tap: true, combine_dual: true }
    }
}

/// The classes of a line of units, one bit per unit.
#[derive(Copy, Clone, Default)]
struct LineClasses {
    c16: u32,
    c8: u32,
    c4: u32,
}

impl LineClasses {
    #[inline(always)]
    fn any(&self) -> u32 {
        self.c16 | self.c8 | self.c4
    }

    #[inline(always)]
    fn class_at(&self, pos: u32) -> Option<TxClass> {
        let bit = 1 << pos;

        if self.c16 & bit != 0 {
            Some(TxClass::Tx16)
        }
        else if self.c8 & bit != 0 {
            Some(TxClass::Tx8)
        }
        else if self.c4 & bit != 0 {
            Some(TxClass::Tx4)
        }
        else {
            None
        }
    }
}

/// `LoopFilterApplier` visits the edges of a [`LoopFilterMask`] in filtering order.
pub struct LoopFilterApplier<'a> {
    info: &'a LoopFilterInfo,
    options: ApplierOptions,
}

impl<'a> LoopFilterApplier<'a> {
    pub fn new(info: &'a LoopFilterInfo, options: ApplierOptions) -> Self {
        LoopFilterApplier { info, options }
    }

    /// Filters all edges of the mask for a plane: the vertical edges, then the horizontal edges.
    pub fn filter_mask<F: EdgeFilter + ?Sized>(
        &self,
        mask: &LoopFilterMask,
        plane: Plane,
        filter: &mut F,
    ) {
        self.filter_vertical(mask, plane, filter);
        self.filter_horizontal(mask, plane, filter);
    }

    fn length(&self, plane: Plane, class: TxClass) -> FilterLength {
        match (plane, class) {
            (_, TxClass::Tx4) => FilterLength::Taps4,
            (Plane::Y, TxClass::Tx8) => FilterLength::Taps8,
            (Plane::Y, _) => FilterLength::Taps16,
            (_, _) if self.options.chroma_6tap => FilterLength::Taps6,
            (_, TxClass::Tx8) => FilterLength::Taps8,
            (_, _) => FilterLength::Taps16,
        }
    }

    /// Gets the rows, columns, and unit origin of a plane of the mask.
    fn plane_dims(mask: &LoopFilterMask, plane: Plane) -> (usize, usize, usize, usize) {
        match plane {
            Plane::Y => (mask.rows, mask.cols, mask.mi_row, mask.mi_col),
            _ => {
                let (unit_row, unit_col) = (mask.mi_row >> mask.ss_y, mask.mi_col >> mask.ss_x);
                (mask.uv_rows(), mask.uv_cols(), unit_row, unit_col)
            }
        }
    }

    fn line(mask: &LoopFilterMask, plane: Plane, dir: EdgeDir, row: usize) -> LineClasses {
        let classes = match (plane, dir) {
            (Plane::Y, EdgeDir::Vertical) => &mask.left_y,
            (Plane::Y, EdgeDir::Horizontal) => &mask.above_y,
            (_, EdgeDir::Vertical) => &mask.left_uv,
            (_, EdgeDir::Horizontal) => &mask.above_uv,
        };

        LineClasses {
            c16: u32::from(classes[TxClass::Tx16.index()].row(row)),
            c8: u32::from(classes[TxClass::Tx8.index()].row(row)),
            c4: u32::from(classes[TxClass::Tx4.index()].row(row)),
        }
    }

    fn level(mask: &LoopFilterMask, plane: Plane, dir: EdgeDir, row: usize, col: usize) -> u8 {
        match plane {
            Plane::Y => mask.lfl_y[dir.index()][row][col],
            Plane::U => mask.lfl_uv[0][row][col],
            Plane::V => mask.lfl_uv[1][row][col],
        }
    }

    /// Filters the vertical edges of a plane, two rows of units at a time.
    pub fn filter_vertical<F: EdgeFilter + ?Sized>(
        &self,
        mask: &LoopFilterMask,
        plane: Plane,
        filter: &mut F,
    ) {
        let dir = EdgeDir::Vertical;
        let (rows, _, unit_row, unit_col) = Self::plane_dims(mask, plane);

        for row in (0..rows).step_by(2) {
            let first = Self::line(mask, plane, dir, row);
            let second = if row + 1 < rows {
                Self::line(mask, plane, dir, row + 1)
            }
            else {
                LineClasses::default()
            };

            let mut bits = first.any() | second.any();

            while bits != 0 {
                let col = bits.trailing_zeros();
                bits &= bits - 1;

                let c = col as usize;

                let edge = |r: usize, class: Option<TxClass>| {
                    let level = Self::level(mask, plane, dir, r, c);
                    class.filter(|_| level != 0).map(|class| FilterEdge {
                        plane,
                        dir,
                        x: (unit_col + c) * 4,
                        y: (unit_row + r) * 4,
                        length: self.length(plane, class),
                        thresh: *self.info.thresholds(level),
                        dual: None,
                    })
                };

                let top = edge(row, first.class_at(col));
                let bottom =
                    if row + 1 < rows { edge(row + 1, second.class_at(col)) } else { None };

                match (top, bottom) {
                    (Some(top), Some(bottom))
                        if self.options.combine_dual && top.length == bottom.length =>
                    {
                        filter.filter(&FilterEdge { dual: Some(bottom.thresh), ..top });
                    }
                    (top, bottom) => {
                        if let Some(top) = top {
                            filter.filter(&top);
                        }
                        if let Some(bottom) = bottom {
                            filter.filter(&bottom);
                        }
                    }
                }
            }
        }
    }

    /// Filters the horizontal edges of a plane, one row of units at a time.
    pub fn filter_horizontal<F: EdgeFilter + ?Sized>(
        &self,
        mask: &LoopFilterMask,
        plane: Plane,
        filter: &mut F,
    ) {
        let dir = EdgeDir::Horizontal;
        let (rows, _, unit_row, unit_col) = Self::plane_dims(mask, plane);

        for row in 0..rows {
            let line = Self::line(mask, plane, dir, row);

            let mut bits = line.any();

            while bits != 0 {
                let col = bits.trailing_zeros();
                bits &= bits - 1;

                let c = col as usize;

                let level = Self::level(mask, plane, dir, row, c);

                let class = match line.class_at(col) {
                    Some(class) if level != 0 => class,
                    _ => continue,
                };

                let mut edge = FilterEdge {
                    plane,
                    dir,
                    x: (unit_col + c) * 4,
                    y: (unit_row + row) * 4,
                    length: self.length(plane, class),
                    thresh: *self.info.thresholds(level),
                    dual: None,
                };

                // Pair with the next unit when it carries the same class.
                if self.options.combine_dual && bits & (1 << (col + 1)) != 0 {
                    let next_level = Self::level(mask, plane, dir, row, c + 1);

                    if next_level != 0 && line.class_at(col + 1) == Some(class) {
                        edge.dual = Some(*self.info.thresholds(next_level));
                        bits &= !(1 << (col + 1));
                    }
                }

                filter.filter(&edge);
            }
        }
    }
}
