// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! AV1 block-level reconstruction helpers for Project Vireo.
//!
//! This crate builds the deblocking loop filter edge masks of a frame, drives an external edge
//! filter over them, and assembles the ranked motion vector reference candidates of inter blocks.
//! Both operate on a [`grid::ModeInfoGrid`] filled in by the mode decoder.

pub mod common;
pub mod grid;
pub mod loopfilter;
pub mod mvref;
