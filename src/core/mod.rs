// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Tag layout, field catalog, value model and codecs.

pub mod catalog;
pub mod codec;
pub mod error;
pub mod tag;
pub mod value;
