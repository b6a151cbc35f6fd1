// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Block, transform, prediction mode, and reference frame vocabulary shared by the loop filter
//! and the motion vector reference search.

/// Size of a mode-info unit in luma pixels.
pub const MI_SIZE: usize = 4;
pub const MI_SIZE_LOG2: u32 = 2;

/// Number of mode-info units along one side of a 64x64 block.
pub const MI_SIZE_64X64: usize = 16;

/// Number of reference frame slots, including the intra "reference".
pub const REF_FRAMES: usize = 8;

/// Number of inter reference frames.
pub const INTER_REFS_PER_FRAME: usize = 7;

/// Maximum number of segments.
pub const MAX_SEGMENTS: usize = 8;

/// The block sizes, in luma pixels (width by height).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockSize {
    B4x4,
    B4x8,
    B8x4,
    B8x8,
    B8x16,
    B16x8,
    B16x16,
    B16x32,
    B32x16,
    B32x32,
    B32x64,
    B64x32,
    B64x64,
    B64x128,
    B128x64,
    B128x128,
    B4x16,
    B16x4,
    B8x32,
    B32x8,
    B16x64,
    B64x16,
}

impl BlockSize {
    pub const ALL: [BlockSize; 22] = [
        BlockSize::B4x4,
        BlockSize::B4x8,
        BlockSize::B8x4,
        BlockSize::B8x8,
        BlockSize::B8x16,
        BlockSize::B16x8,
        BlockSize::B16x16,
        BlockSize::B16x32,
        BlockSize::B32x16,
        BlockSize::B32x32,
        BlockSize::B32x64,
        BlockSize::B64x32,
        BlockSize::B64x64,
        BlockSize::B64x128,
        BlockSize::B128x64,
        BlockSize::B128x128,
        BlockSize::B4x16,
        BlockSize::B16x4,
        BlockSize::B8x32,
        BlockSize::B32x8,
        BlockSize::B16x64,
        BlockSize::B64x16,
    ];

    /// Returns the base-2 logarithm of the width and height in mode-info units.
    #[rustfmt::skip]
    fn dims_log2(self) -> (u32, u32) {
        match self {
            BlockSize::B4x4     => (0, 0),
            BlockSize::B4x8     => (0, 1),
            BlockSize::B8x4     => (1, 0),
            BlockSize::B8x8     => (1, 1),
            BlockSize::B8x16    => (1, 2),
            BlockSize::B16x8    => (2, 1),
            BlockSize::B16x16   => (2, 2),
            BlockSize::B16x32   => (2, 3),
            BlockSize::B32x16   => (3, 2),
            BlockSize::B32x32   => (3, 3),
            BlockSize::B32x64   => (3, 4),
            BlockSize::B64x32   => (4, 3),
            BlockSize::B64x64   => (4, 4),
            BlockSize::B64x128  => (4, 5),
            BlockSize::B128x64  => (5, 4),
            BlockSize::B128x128 => (5, 5),
            BlockSize::B4x16    => (0, 2),
            BlockSize::B16x4    => (2, 0),
            BlockSize::B8x32    => (1, 3),
            BlockSize::B32x8    => (3, 1),
            BlockSize::B16x64   => (2, 4),
            BlockSize::B64x16   => (4, 2),
        }
    }

    /// Width in mode-info units.
    #[inline(always)]
    pub fn width_mi(self) -> usize {
        1 << self.dims_log2().0
    }

    /// Height in mode-info units.
    #[inline(always)]
    pub fn height_mi(self) -> usize {
        1 << self.dims_log2().1
    }

    /// Width in luma pixels.
    #[inline(always)]
    pub fn width(self) -> usize {
        self.width_mi() * MI_SIZE
    }

    /// Height in luma pixels.
    #[inline(always)]
    pub fn height(self) -> usize {
        self.height_mi() * MI_SIZE
    }

    /// Gets the block size with the given dimensions in luma pixels, if one exists.
    pub fn from_dims(width: usize, height: usize) -> Option<BlockSize> {
        BlockSize::ALL.iter().copied().find(|b| b.width() == width && b.height() == height)
    }

    /// Clips the block to at most 64x64 luma pixels.
    pub fn clip_to_64(self) -> BlockSize {
        let w = self.width().min(64);
        let h = self.height().min(64);
        // Every block size clipped to 64 in each dimension is itself a block size.
        BlockSize::from_dims(w, h).unwrap_or(BlockSize::B64x64)
    }
}

/// The transform sizes, in pixels (width by height).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TxSize {
    Tx4x4,
    Tx8x8,
    Tx16x16,
    Tx32x32,
    Tx64x64,
    Tx4x8,
    Tx8x4,
    Tx8x16,
    Tx16x8,
    Tx16x32,
    Tx32x16,
    Tx32x64,
    Tx64x32,
    Tx4x16,
    Tx16x4,
    Tx8x32,
    Tx32x8,
    Tx16x64,
    Tx64x16,
}

impl TxSize {
    pub const ALL: [TxSize; 19] = [
        TxSize::Tx4x4,
        TxSize::Tx8x8,
        TxSize::Tx16x16,
        TxSize::Tx32x32,
        TxSize::Tx64x64,
        TxSize::Tx4x8,
        TxSize::Tx8x4,
        TxSize::Tx8x16,
        TxSize::Tx16x8,
        TxSize::Tx16x32,
        TxSize::Tx32x16,
        TxSize::Tx32x64,
        TxSize::Tx64x32,
        TxSize::Tx4x16,
        TxSize::Tx16x4,
        TxSize::Tx8x32,
        TxSize::Tx32x8,
        TxSize::Tx16x64,
        TxSize::Tx64x16,
    ];

    #[rustfmt::skip]
    fn dims_log2(self) -> (u32, u32) {
        match self {
            TxSize::Tx4x4   => (0, 0),
            TxSize::Tx8x8   => (1, 1),
            TxSize::Tx16x16 => (2, 2),
            TxSize::Tx32x32 => (3, 3),
            TxSize::Tx64x64 => (4, 4),
            TxSize::Tx4x8   => (0, 1),
            TxSize::Tx8x4   => (1, 0),
            TxSize::Tx8x16  => (1, 2),
            TxSize::Tx16x8  => (2, 1),
            TxSize::Tx16x32 => (2, 3),
            TxSize::Tx32x16 => (3, 2),
            TxSize::Tx32x64 => (3, 4),
            TxSize::Tx64x32 => (4, 3),
            TxSize::Tx4x16  => (0, 2),
            TxSize::Tx16x4  => (2, 0),
            TxSize::Tx8x32  => (1, 3),
            TxSize::Tx32x8  => (3, 1),
            TxSize::Tx16x64 => (2, 4),
            TxSize::Tx64x16 => (4, 2),
        }
    }

    /// Width in 4x4 units.
    #[inline(always)]
    pub fn width_units(self) -> usize {
        1 << self.dims_log2().0
    }

    /// Height in 4x4 units.
    #[inline(always)]
    pub fn height_units(self) -> usize {
        1 << self.dims_log2().1
    }

    #[inline(always)]
    pub fn width(self) -> usize {
        self.width_units() * 4
    }

    #[inline(always)]
    pub fn height(self) -> usize {
        self.height_units() * 4
    }

    /// Gets the transform size with the given dimensions in pixels, if one exists.
    pub fn from_dims(width: usize, height: usize) -> Option<TxSize> {
        TxSize::ALL.iter().copied().find(|t| t.width() == width && t.height() == height)
    }

    /// The largest rectangular transform that fits a luma block.
    pub fn max_rect_luma(bsize: BlockSize) -> TxSize {
        TxSize::max_rect(bsize.width(), bsize.height(), 64)
    }

    /// The largest rectangular transform that fits a `width` by `height` block with no side
    /// exceeding `cap` pixels.
    pub fn max_rect(width: usize, height: usize, cap: usize) -> TxSize {
        let w = width.min(cap);
        let h = height.min(cap);

        // Block aspect ratios never exceed 4:1, so a matching transform always exists, except when
        // the cap squashes a 4:1 block into a taller ratio.
        match TxSize::from_dims(w, h) {
            Some(tx) => tx,
            None => TxSize::from_dims(w.min(h * 4), h.min(w * 4)).unwrap_or(TxSize::Tx4x4),
        }
    }
}

/// The prediction modes. Intra modes come first, then single reference inter modes, then compound
/// inter modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PredictionMode {
    DcPred,
    VPred,
    HPred,
    D45Pred,
    D135Pred,
    D113Pred,
    D157Pred,
    D203Pred,
    D67Pred,
    SmoothPred,
    SmoothVPred,
    SmoothHPred,
    PaethPred,
    NearestMv,
    NearMv,
    GlobalMv,
    NewMv,
    NearestNearestMv,
    NearNearMv,
    NearestNewMv,
    NewNearestMv,
    NearNewMv,
    NewNearMv,
    GlobalGlobalMv,
    NewNewMv,
}

impl PredictionMode {
    /// Returns true for the inter prediction modes.
    #[inline(always)]
    pub fn is_inter(self) -> bool {
        self as u8 >= PredictionMode::NearestMv as u8
    }

    /// Returns true if at least one motion vector of the mode is explicitly coded.
    pub fn has_newmv(self) -> bool {
        matches!(
            self,
            PredictionMode::NewMv
                | PredictionMode::NewNewMv
                | PredictionMode::NearestNewMv
                | PredictionMode::NewNearestMv
                | PredictionMode::NearNewMv
                | PredictionMode::NewNearMv
        )
    }

    /// Returns true if the mode predicts from the global motion model.
    pub fn is_global(self) -> bool {
        matches!(self, PredictionMode::GlobalMv | PredictionMode::GlobalGlobalMv)
    }

    /// The mode delta index of the loop filter: 1 for inter modes other than the global motion
    /// modes, 0 otherwise.
    #[inline(always)]
    pub fn lf_mode_index(self) -> usize {
        if self.is_inter() && !self.is_global() {
            1
        }
        else {
            0
        }
    }
}

/// The reference frames. `Intra` is the pseudo-reference of intra blocks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RefFrame {
    Intra = 0,
    Last = 1,
    Last2 = 2,
    Last3 = 3,
    Golden = 4,
    BwdRef = 5,
    AltRef2 = 6,
    AltRef = 7,
}

impl RefFrame {
    /// The inter reference frames in slot order.
    pub const INTER: [RefFrame; INTER_REFS_PER_FRAME] = [
        RefFrame::Last,
        RefFrame::Last2,
        RefFrame::Last3,
        RefFrame::Golden,
        RefFrame::BwdRef,
        RefFrame::AltRef2,
        RefFrame::AltRef,
    ];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns true for the inter reference frames.
    #[inline(always)]
    pub fn is_inter(self) -> bool {
        self != RefFrame::Intra
    }

    /// Gets the inter reference frame stored in slot `idx` (0 is `Last`).
    pub fn from_inter_index(idx: usize) -> Option<RefFrame> {
        RefFrame::INTER.get(idx).copied()
    }
}

/// A motion vector in 1/8th luma pixel units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mv {
    pub row: i16,
    pub col: i16,
}

impl Mv {
    pub const ZERO: Mv = Mv { row: 0, col: 0 };

    pub const fn new(row: i16, col: i16) -> Self {
        Mv { row, col }
    }

    /// Negates both components.
    pub fn negate(self) -> Mv {
        Mv { row: self.row.wrapping_neg(), col: self.col.wrapping_neg() }
    }
}

/// The motion vector precision of a frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MvPrecision {
    /// Whole pixel motion vectors.
    Integer,
    /// Quarter pixel motion vectors.
    #[default]
    Quarter,
    /// Eighth pixel motion vectors.
    Eighth,
}

impl MvPrecision {
    /// Rounds `mv` to this precision.
    pub fn lower(self, mv: Mv) -> Mv {
        match self {
            MvPrecision::Eighth => mv,
            MvPrecision::Quarter => {
                let lower = |v: i16| if v & 1 != 0 { v + if v > 0 { -1 } else { 1 } } else { v };
                Mv { row: lower(mv.row), col: lower(mv.col) }
            }
            MvPrecision::Integer => {
                let lower = |v: i16| {
                    let rem = v % 8;
                    if rem == 0 {
                        return v;
                    }
                    let mut v = v - rem;
                    if rem.abs() > 4 {
                        v += if rem > 0 { 8 } else { -8 };
                    }
                    v
                };
                Mv { row: lower(mv.row), col: lower(mv.col) }
            }
        }
    }
}

/// The type of a global motion model.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum GlobalMotionType {
    #[default]
    Identity,
    Translation,
    RotZoom,
    Affine,
}

/// The superblock size of a sequence.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SuperblockSize {
    #[default]
    Sb64,
    Sb128,
}

impl SuperblockSize {
    /// Size in mode-info units.
    pub fn mi_size(self) -> usize {
        match self {
            SuperblockSize::Sb64 => 16,
            SuperblockSize::Sb128 => 32,
        }
    }
}

/// The planes of a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Plane {
    Y,
    U,
    V,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Y, Plane::U, Plane::V];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}
