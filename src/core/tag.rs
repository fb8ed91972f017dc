// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Tag types and the fixed OpenTag3D memory layout constants.

use std::fmt;
use std::str::FromStr;

/// First byte address written by the image builder.
pub const IMAGE_START: u32 = 0x10;
/// Last byte of the core region (inclusive).
pub const CORE_END: u32 = 0x9F;
/// First byte of the extended region.
pub const EXT_START: u32 = 0xA0;
/// Last byte of the extended region (inclusive).
pub const EXT_END: u32 = 0x1FF;
/// Core bytes not assigned to any field (inclusive).
pub const RESERVED_START: u32 = 0x5A;
pub const RESERVED_END: u32 = 0x6C;
/// Byte used for bytes with no known value.
pub const UNSET_BYTE: u8 = 0xFF;

/// Supported NTAG variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TagType {
    #[default]
    Ntag213,
    Ntag215,
    Ntag216,
}

impl TagType {
    pub const ALL: [TagType; 3] = [TagType::Ntag213, TagType::Ntag215, TagType::Ntag216];

    pub fn name(self) -> &'static str {
        match self {
            TagType::Ntag213 => "NTAG213",
            TagType::Ntag215 => "NTAG215",
            TagType::Ntag216 => "NTAG216",
        }
    }

    /// Usable bytes counted from `IMAGE_START`.
    pub fn capacity(self) -> u32 {
        match self {
            TagType::Ntag213 => 144,
            TagType::Ntag215 => 504,
            TagType::Ntag216 => 888,
        }
    }

    /// True for the smallest tag, which only carries the core region.
    pub fn is_minimal_tier(self) -> bool {
        let min = Self::ALL
            .iter()
            .map(|tag| tag.capacity())
            .min()
            .unwrap_or(0);
        self.capacity() == min
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTagType(pub String);

impl fmt::Display for UnknownTagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown tag type: {} (expected NTAG213, NTAG215 or NTAG216)",
            self.0
        )
    }
}

impl std::error::Error for UnknownTagType {}

impl FromStr for TagType {
    type Err = UnknownTagType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownTagType(s.to_string()))
    }
}

/// Format an address the way the maps and file names show it: `0x` plus at
/// least two uppercase hex digits.
pub fn format_addr(addr: u32) -> String {
    format!("0x{addr:02X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacities_match_ntag_datasheets() {
        assert_eq!(TagType::Ntag213.capacity(), 144);
        assert_eq!(TagType::Ntag215.capacity(), 504);
        assert_eq!(TagType::Ntag216.capacity(), 888);
    }

    #[test]
    fn only_ntag213_is_minimal() {
        assert!(TagType::Ntag213.is_minimal_tier());
        assert!(!TagType::Ntag215.is_minimal_tier());
        assert!(!TagType::Ntag216.is_minimal_tier());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("ntag215".parse::<TagType>(), Ok(TagType::Ntag215));
        assert_eq!(TagType::parse(" NTAG216 "), Some(TagType::Ntag216));
        assert!("NTAG214".parse::<TagType>().is_err());
    }

    #[test]
    fn format_addr_pads_to_two_digits() {
        assert_eq!(format_addr(0x0F), "0x0F");
        assert_eq!(format_addr(0xA0), "0xA0");
        assert_eq!(format_addr(0x1FF), "0x1FF");
    }

    #[test]
    fn ntag213_capacity_covers_core_region() {
        assert_eq!(CORE_END - IMAGE_START + 1, TagType::Ntag213.capacity());
    }
}
