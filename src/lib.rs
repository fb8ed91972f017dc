// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Library entry exposing the OpenTag3D image builder.

pub mod cli;
pub mod core;
pub mod encoder;
pub mod output;
