// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use vireo_core::util::bits::round_power_of_two_signed;

use crate::common::{BlockSize, GlobalMotionType, Mv, MvPrecision, MI_SIZE};
use crate::grid::BlockInfo;

/// Precision of the warp model parameters.
pub const WARPEDMODEL_PREC_BITS: u32 = 16;

const GM_TRANS_ONLY_PREC_DIFF: u32 = WARPEDMODEL_PREC_BITS - 3;

/// The global motion model of a reference frame.
///
/// `wmmat` holds the horizontal and vertical translation followed by the 2x2 affine matrix, all
/// with [`WARPEDMODEL_PREC_BITS`] fractional bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GlobalMotion {
    pub wmtype: GlobalMotionType,
    pub wmmat: [i32; 6],
}

impl Default for GlobalMotion {
    fn default() -> Self {
        GlobalMotion::IDENTITY
    }
}

impl GlobalMotion {
    pub const IDENTITY: GlobalMotion = GlobalMotion {
        wmtype: GlobalMotionType::Identity,
        wmmat: [0, 0, 1 << WARPEDMODEL_PREC_BITS, 0, 0, 1 << WARPEDMODEL_PREC_BITS],
    };

    /// A pure translation model. The offsets are in 1/8th pixel units.
    pub fn translation(row: i16, col: i16) -> Self {
        let mut wmmat = GlobalMotion::IDENTITY.wmmat;
        wmmat[0] = i32::from(row) << GM_TRANS_ONLY_PREC_DIFF;
        wmmat[1] = i32::from(col) << GM_TRANS_ONLY_PREC_DIFF;
        GlobalMotion { wmtype: GlobalMotionType::Translation, wmmat }
    }

    /// Gets the motion vector the model assigns to a block of size `bsize` at
    /// `(mi_row, mi_col)`, sampled at the block's centre.
    pub fn motion_vector(
        &self,
        precision: MvPrecision,
        bsize: BlockSize,
        mi_row: usize,
        mi_col: usize,
    ) -> Mv {
        let mv = match self.wmtype {
            GlobalMotionType::Identity => return Mv::ZERO,
            GlobalMotionType::Translation => Mv::new(
                (self.wmmat[0] >> GM_TRANS_ONLY_PREC_DIFF) as i16,
                (self.wmmat[1] >> GM_TRANS_ONLY_PREC_DIFF) as i16,
            ),
            _ => {
                let mat = self.wmmat.map(i64::from);

                let x = (mi_col * MI_SIZE + bsize.width() / 2) as i64 - 1;
                let y = (mi_row * MI_SIZE + bsize.height() / 2) as i64 - 1;

                let one = 1i64 << WARPEDMODEL_PREC_BITS;
                let xc = (mat[2] - one) * x + mat[3] * y + mat[0];
                let yc = mat[4] * x + (mat[5] - one) * y + mat[1];

                let allow_hp = precision == MvPrecision::Eighth;

                Mv::new(to_trans_prec(allow_hp, yc), to_trans_prec(allow_hp, xc))
            }
        };

        match precision {
            MvPrecision::Integer => precision.lower(mv),
            _ => mv,
        }
    }
}

fn to_trans_prec(allow_hp: bool, coord: i64) -> i16 {
    let v = if allow_hp {
        round_power_of_two_signed(coord, WARPEDMODEL_PREC_BITS - 3)
    }
    else {
        round_power_of_two_signed(coord, WARPEDMODEL_PREC_BITS - 2) * 2
    };
    v.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

/// Returns true if `block` was predicted from a non-translational global motion model of type
/// `wmtype`, in which case its stored vectors are replaced by the model's.
pub fn is_global_mv_block(block: &BlockInfo, wmtype: GlobalMotionType) -> bool {
    block.mode.is_global()
        && wmtype > GlobalMotionType::Translation
        && block.size.width().min(block.size.height()) >= 8
}
