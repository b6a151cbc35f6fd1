// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filter levels and filter thresholds.

use bitflags::bitflags;
use log::debug;

use vireo_core::util::clamp::clamp_i32;

use crate::common::{Plane, RefFrame, MAX_SEGMENTS, REF_FRAMES};
use crate::grid::BlockInfo;

use super::EdgeDir;

/// The largest filter level.
pub const MAX_LOOP_FILTER: u8 = 63;

/// The number of mode deltas.
pub const MAX_MODE_LF_DELTAS: usize = 2;

/// The number of segmentation features.
pub const SEG_LVL_MAX: usize = 8;

/// The default reference frame deltas, indexed by [`RefFrame`].
pub const DEFAULT_REF_DELTAS: [i8; REF_FRAMES] = [1, 0, 0, 0, -1, 0, -1, -1];

bitflags! {
    /// The segmentation features enabled for a segment.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct SegFeatures: u8 {
        /// Alternative quantizer.
        const ALT_Q       = 1 << 0;
        /// Alternative luma vertical edge filter level.
        const ALT_LF_Y_V  = 1 << 1;
        /// Alternative luma horizontal edge filter level.
        const ALT_LF_Y_H  = 1 << 2;
        /// Alternative U plane filter level.
        const ALT_LF_U    = 1 << 3;
        /// Alternative V plane filter level.
        const ALT_LF_V    = 1 << 4;
        /// Fixed reference frame.
        const REF_FRAME   = 1 << 5;
        /// Skip residual.
        const SKIP        = 1 << 6;
        /// Global motion.
        const GLOBALMV    = 1 << 7;
    }
}

impl SegFeatures {
    /// The segmentation feature adjusting the filter level of a plane and edge direction.
    fn filter_level_feature(plane: Plane, dir: EdgeDir) -> SegFeatures {
        match (plane, dir) {
            (Plane::Y, EdgeDir::Vertical) => SegFeatures::ALT_LF_Y_V,
            (Plane::Y, EdgeDir::Horizontal) => SegFeatures::ALT_LF_Y_H,
            (Plane::U, _) => SegFeatures::ALT_LF_U,
            (Plane::V, _) => SegFeatures::ALT_LF_V,
        }
    }
}

/// Segmentation parameters of a frame.
#[derive(Clone, Debug, Default)]
pub struct SegmentationParams {
    pub enabled: bool,
    pub(super) features: [SegFeatures; MAX_SEGMENTS],
    pub(super) data: [[i16; SEG_LVL_MAX]; MAX_SEGMENTS],
}

impl SegmentationParams {
    /// Enables a single `feature` of `segment_id` with the value `data`.
    pub fn set_feature(&mut self, segment_id: usize, feature: SegFeatures, data: i16) {
        debug_assert!(feature.bits().count_ones() == 1);

        self.features[segment_id] |= feature;
        self.data[segment_id][feature.bits().trailing_zeros() as usize] = data;
    }

    /// Returns true if segmentation is enabled and `feature` is enabled for `segment_id`.
    #[inline(always)]
    pub fn feature_active(&self, segment_id: usize, feature: SegFeatures) -> bool {
        self.enabled && self.features[segment_id].contains(feature)
    }

    #[inline(always)]
    pub fn feature_data(&self, segment_id: usize, feature: SegFeatures) -> i16 {
        self.data[segment_id][feature.bits().trailing_zeros() as usize]
    }

    /// Applies the filter level adjustment of a segment.
    fn adjust_level(&self, segment_id: usize, plane: Plane, dir: EdgeDir, level: i32) -> i32 {
        let feature = SegFeatures::filter_level_feature(plane, dir);

        if self.feature_active(segment_id, feature) {
            clamp_level(level + i32::from(self.feature_data(segment_id, feature)))
        }
        else {
            level
        }
    }
}

/// Loop filter parameters of a frame.
#[derive(Clone, Debug)]
pub struct LoopFilterParams {
    /// Luma filter levels for vertical and horizontal edges.
    pub filter_level: [u8; 2],
    pub filter_level_u: u8,
    pub filter_level_v: u8,
    pub sharpness: u8,
    pub mode_ref_delta_enabled: bool,
    pub ref_deltas: [i8; REF_FRAMES],
    pub mode_deltas: [i8; MAX_MODE_LF_DELTAS],
    /// Blocks carry filter level deltas.
    pub delta_lf_present: bool,
    /// Blocks carry a filter level delta per plane and direction rather than a single delta.
    pub delta_lf_multi: bool,
}

impl Default for LoopFilterParams {
    fn default() -> Self {
        LoopFilterParams {
            filter_level: [0; 2],
            filter_level_u: 0,
            filter_level_v: 0,
            sharpness: 0,
            mode_ref_delta_enabled: true,
            ref_deltas: DEFAULT_REF_DELTAS,
            mode_deltas: [0; MAX_MODE_LF_DELTAS],
            delta_lf_present: false,
            delta_lf_multi: false,
        }
    }
}

impl LoopFilterParams {
    /// The frame filter level of a plane and edge direction.
    pub fn base_level(&self, plane: Plane, dir: EdgeDir) -> u8 {
        match plane {
            Plane::Y => self.filter_level[dir.index()],
            Plane::U => self.filter_level_u,
            Plane::V => self.filter_level_v,
        }
    }

    /// Returns true if the plane is filtered at all. Chroma is never filtered when luma is not.
    pub fn plane_enabled(&self, plane: Plane) -> bool {
        let luma = self.filter_level[0] != 0 || self.filter_level[1] != 0;

        match plane {
            Plane::Y => luma,
            Plane::U => luma && self.filter_level_u != 0,
            Plane::V => luma && self.filter_level_v != 0,
        }
    }
}

/// The thresholds of one filter level.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopFilterThresh {
    /// Edge limit across a block boundary.
    pub mblim: u8,
    /// Limit of the differences within each side of the edge.
    pub lim: u8,
    /// High edge variance threshold.
    pub hev_thr: u8,
}

fn sharpness_thresholds(sharpness: u8) -> [LoopFilterThresh; MAX_LOOP_FILTER as usize + 1] {
    let mut thresh = [LoopFilterThresh::default(); MAX_LOOP_FILTER as usize + 1];

    let shift = u32::from(sharpness > 0) + u32::from(sharpness > 4);

    for (lvl, t) in thresh.iter_mut().enumerate() {
        let lvl = lvl as u32;

        let mut limit = lvl >> shift;

        if sharpness > 0 {
            limit = limit.min(9 - u32::from(sharpness));
        }

        let limit = limit.max(1);

        t.lim = limit as u8;
        t.mblim = (2 * (lvl + 2) + limit) as u8;
        t.hev_thr = (lvl >> 4) as u8;
    }

    thresh
}

#[inline(always)]
fn clamp_level(level: i32) -> i32 {
    clamp_i32(level, 0, i32::from(MAX_LOOP_FILTER))
}

/// Level table indexed by plane, segment, direction, reference frame, and mode delta index.
type LevelTable = [[[[[u8; MAX_MODE_LF_DELTAS]; REF_FRAMES]; 2]; MAX_SEGMENTS]; 3];

/// `LoopFilterInfo` holds the filter thresholds and the per-frame filter level lookup table.
pub struct LoopFilterInfo {
    sharpness: u8,
    thresh: [LoopFilterThresh; MAX_LOOP_FILTER as usize + 1],
    lvl: Box<LevelTable>,
}

impl LoopFilterInfo {
    pub fn new(params: &LoopFilterParams) -> Self {
        LoopFilterInfo {
            sharpness: params.sharpness,
            thresh: sharpness_thresholds(params.sharpness),
            lvl: Box::new([[[[[0; MAX_MODE_LF_DELTAS]; REF_FRAMES]; 2]; MAX_SEGMENTS]; 3]),
        }
    }

    /// Gets the thresholds of a filter level.
    #[inline(always)]
    pub fn thresholds(&self, level: u8) -> &LoopFilterThresh {
        &self.thresh[usize::from(level.min(MAX_LOOP_FILTER))]
    }

    /// Rebuilds the filter level table for a new frame. The thresholds are recomputed when the
    /// sharpness changed.
    pub fn frame_init(&mut self, params: &LoopFilterParams, seg: &SegmentationParams) {
        if params.sharpness != self.sharpness {
            debug!("loop filter sharpness changed from {} to {}", self.sharpness, params.sharpness);

            self.sharpness = params.sharpness;
            self.thresh = sharpness_thresholds(params.sharpness);
        }

        for plane in Plane::ALL {
            let table = &mut self.lvl[plane.index()];

            if !params.plane_enabled(plane) {
                *table = [[[[0; MAX_MODE_LF_DELTAS]; REF_FRAMES]; 2]; MAX_SEGMENTS];
                continue;
            }

            for (segment_id, seg_table) in table.iter_mut().enumerate() {
                for dir in EdgeDir::ALL {
                    let base = i32::from(params.base_level(plane, dir));
                    let lvl_seg = seg.adjust_level(segment_id, plane, dir, base);

                    let dir_table = &mut seg_table[dir.index()];

                    if !params.mode_ref_delta_enabled {
                        *dir_table = [[lvl_seg as u8; MAX_MODE_LF_DELTAS]; REF_FRAMES];
                        continue;
                    }

                    let scale = 1 << (lvl_seg >> 5);

                    let intra = lvl_seg + i32::from(params.ref_deltas[0]) * scale;
                    dir_table[RefFrame::Intra.index()][0] = clamp_level(intra) as u8;

                    for rf in RefFrame::INTER {
                        for (mode, &mode_delta) in params.mode_deltas.iter().enumerate() {
                            let inter = lvl_seg
                                + i32::from(params.ref_deltas[rf.index()]) * scale
                                + i32::from(mode_delta) * scale;

                            dir_table[rf.index()][mode] = clamp_level(inter) as u8;
                        }
                    }
                }
            }
        }

        debug!(
            "loop filter levels: y=[{}, {}] u={} v={}",
            params.filter_level[0],
            params.filter_level[1],
            params.filter_level_u,
            params.filter_level_v
        );
    }

    /// Gets the filter level of a block for a plane and edge direction.
    pub fn filter_level(
        &self,
        params: &LoopFilterParams,
        seg: &SegmentationParams,
        block: &BlockInfo,
        plane: Plane,
        dir: EdgeDir,
    ) -> u8 {
        if !params.plane_enabled(plane) {
            return 0;
        }

        let segment_id = usize::from(block.segment_id) % MAX_SEGMENTS;
        let rf = block.ref_frame[0];
        let mode = block.mode.lf_mode_index();

        if !params.delta_lf_present {
            return self.lvl[plane.index()][segment_id][dir.index()][rf.index()][mode];
        }

        let delta = if params.delta_lf_multi {
            block.delta_lf[delta_lf_index(plane, dir)]
        }
        else {
            block.delta_lf_from_base
        };

        let base = i32::from(params.base_level(plane, dir));
        let mut lvl_seg = clamp_level(i32::from(delta) + base);

        lvl_seg = seg.adjust_level(segment_id, plane, dir, lvl_seg);

        if params.mode_ref_delta_enabled {
            let scale = 1 << (lvl_seg >> 5);

            lvl_seg += i32::from(params.ref_deltas[rf.index()]) * scale;

            if rf.is_inter() {
                lvl_seg += i32::from(params.mode_deltas[mode]) * scale;
            }

            lvl_seg = clamp_level(lvl_seg);
        }

        lvl_seg as u8
    }
}

/// The index of the per-block filter level delta of a plane and edge direction.
#[inline(always)]
fn delta_lf_index(plane: Plane, dir: EdgeDir) -> usize {
    match plane {
        Plane::Y => dir.index(),
        Plane::U => 2,
        Plane::V => 3,
    }
}
