// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The OpenTag3D field map.
//!
//! Every field has a fixed address and size. The table is ordered core first,
//! then extended, and within each region by address.

use std::collections::HashSet;
use std::fmt;

use serde_json::json;

use super::tag::{
    format_addr, CORE_END, EXT_END, EXT_START, IMAGE_START, RESERVED_END, RESERVED_START,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Core,
    Extended,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Core => "core",
            Region::Extended => "extended",
        }
    }
}

/// How a field's logical value is turned into bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text { ascii_only: bool },
    Integer,
    /// Stored value is `round(value * scale)`.
    ScaledInteger { scale: f64 },
    ColorRgba,
    DateYmd,
    TimeHms,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "string",
            FieldKind::Integer => "integer",
            FieldKind::ScaledInteger { .. } => "scaledInteger",
            FieldKind::ColorRgba => "colorRGBA",
            FieldKind::DateYmd => "dateYMD",
            FieldKind::TimeHms => "timeHMS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDef {
    pub key: &'static str,
    pub label: &'static str,
    pub address: u32,
    pub size: usize,
    pub region: Region,
    pub kind: FieldKind,
    pub note: Option<&'static str>,
}

impl FieldDef {
    /// Address one past the last byte.
    pub fn end(&self) -> u32 {
        self.address + self.size as u32
    }

    /// Last byte address (inclusive).
    pub fn last(&self) -> u32 {
        self.end().saturating_sub(1)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let scale = match self.kind {
            FieldKind::ScaledInteger { scale } => Some(scale),
            _ => None,
        };
        let ascii_only = matches!(self.kind, FieldKind::Text { ascii_only: true });
        json!({
            "key": self.key,
            "label": self.label,
            "address": format_addr(self.address),
            "size": self.size,
            "region": self.region.as_str(),
            "kind": self.kind.name(),
            "scale": scale,
            "asciiOnly": ascii_only,
            "note": self.note,
        })
    }
}

const fn core(
    key: &'static str,
    label: &'static str,
    address: u32,
    size: usize,
    kind: FieldKind,
    note: Option<&'static str>,
) -> FieldDef {
    FieldDef {
        key,
        label,
        address,
        size,
        region: Region::Core,
        kind,
        note,
    }
}

const fn ext(
    key: &'static str,
    label: &'static str,
    address: u32,
    size: usize,
    kind: FieldKind,
) -> FieldDef {
    FieldDef {
        key,
        label,
        address,
        size,
        region: Region::Extended,
        kind,
        note: None,
    }
}

const TEXT: FieldKind = FieldKind::Text { ascii_only: false };
const INT: FieldKind = FieldKind::Integer;

static FIELDS: [FieldDef; 32] = [
    core("tagFormat", "Tag Format", 0x10, 2, TEXT, Some("Always \"OT\"")),
    core(
        "tagVersion",
        "Tag Version (e.g. 1.000)",
        0x12,
        2,
        FieldKind::ScaledInteger { scale: 1000.0 },
        Some("Stored as integer ×1000"),
    ),
    core("manufacturer", "Filament Manufacturer", 0x14, 16, TEXT, None),
    core("baseMaterial", "Base Material Name", 0x24, 5, TEXT, None),
    core("materialMods", "Material Modifiers", 0x29, 5, TEXT, None),
    core("colorName", "Color Name", 0x2E, 32, TEXT, None),
    core(
        "colorRGBA",
        "Color Hex RGBA [R,G,B,A]",
        0x4E,
        4,
        FieldKind::ColorRgba,
        Some("sRGB; 4 separate bytes"),
    ),
    core(
        "diameter",
        "Diameter Target (mm)",
        0x52,
        2,
        FieldKind::ScaledInteger { scale: 1000.0 },
        Some("Stored in µm (×1000)"),
    ),
    core("weightNom", "Weight Nominal (g)", 0x54, 2, INT, None),
    core(
        "printTemp",
        "Print Temp (°C)",
        0x56,
        1,
        FieldKind::ScaledInteger { scale: 0.2 },
        Some("Stored as °C/5 (divide by 5)"),
    ),
    core(
        "bedTemp",
        "Bed Temp (°C)",
        0x57,
        1,
        FieldKind::ScaledInteger { scale: 0.2 },
        Some("Stored as °C/5 (divide by 5)"),
    ),
    core(
        "density",
        "Density (g/cm³)",
        0x58,
        2,
        FieldKind::ScaledInteger { scale: 1000.0 },
        None,
    ),
    core(
        "dataUrl",
        "Online Data URL (ASCII, no protocol)",
        0x6D,
        32,
        FieldKind::Text { ascii_only: true },
        Some("e.g. pfil.us?i=8078-RQSR"),
    ),
    ext("serial", "Serial / Batch ID", 0xA0, 16, TEXT),
    ext("mfgDate", "Manufacture Date (YYYY-MM-DD)", 0xB0, 4, FieldKind::DateYmd),
    ext("mfgTime", "Manufacture Time (HH:MM:SS UTC)", 0xB4, 3, FieldKind::TimeHms),
    ext("coreDia", "Spool Core Diameter (mm)", 0xB7, 1, INT),
    ext("mfiTemp", "MFI Temp (°C)", 0xB8, 1, INT),
    ext("mfiLoad", "MFI Load (×100 g)", 0xB9, 1, INT),
    ext("mfiValue", "MFI Value (×10 g/10min)", 0xBA, 1, INT),
    ext("tolerance", "Tolerance (µm, measured)", 0xBB, 1, INT),
    ext("spoolEmpty", "Empty Spool Weight (g)", 0xBC, 2, INT),
    ext("filWeight", "Filament Weight (measured, g)", 0xBE, 2, INT),
    ext("filLen", "Filament Length (m)", 0xC0, 2, INT),
    ext("td", "TD (Transmission Distance, µm)", 0xC2, 2, INT),
    ext("maxDryTemp", "Max Dry Temp (°C)", 0xC4, 1, INT),
    ext("dryTime", "Dry Time (hours)", 0xC5, 1, INT),
    ext("minPrintTemp", "Min Print Temp (°C)", 0xC6, 1, INT),
    ext("maxPrintTemp", "Max Print Temp (°C)", 0xC7, 1, INT),
    ext("vMin", "Vol. Speed Min (×10 mm³/s)", 0xC8, 1, INT),
    ext("vMax", "Vol. Speed Max (×10 mm³/s)", 0xC9, 1, INT),
    ext("vRec", "Vol. Speed Rec (×10 mm³/s)", 0xCA, 1, INT),
];

/// Core fields followed by extended fields, in definition order.
pub fn all_fields() -> &'static [FieldDef] {
    &FIELDS
}

/// Fields present on every tag type.
pub fn core_fields() -> Vec<FieldDef> {
    FIELDS
        .iter()
        .filter(|field| field.region == Region::Core)
        .copied()
        .collect()
}

/// Fields only present on the larger tags.
pub fn extended_fields() -> Vec<FieldDef> {
    FIELDS
        .iter()
        .filter(|field| field.region == Region::Extended)
        .copied()
        .collect()
}

pub fn field(key: &str) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|field| field.key == key)
}

/// A structural problem in a field table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogIssue {
    DuplicateKey(&'static str),
    EmptyField(&'static str),
    OutOfBounds { key: &'static str, address: u32 },
    WrongRegion { key: &'static str, region: Region },
    Reserved { key: &'static str, address: u32 },
    Overlap { key: &'static str, other: &'static str, address: u32 },
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogIssue::DuplicateKey(key) => write!(f, "Duplicate field key {key}"),
            CatalogIssue::EmptyField(key) => write!(f, "Field {key} has zero size"),
            CatalogIssue::OutOfBounds { key, address } => write!(
                f,
                "Field {key} reaches {} outside {}..{}",
                format_addr(*address),
                format_addr(IMAGE_START),
                format_addr(EXT_END)
            ),
            CatalogIssue::WrongRegion { key, region } => {
                write!(f, "Field {key} lies outside the {} region", region.as_str())
            }
            CatalogIssue::Reserved { key, address } => write!(
                f,
                "Field {key} uses reserved byte {}",
                format_addr(*address)
            ),
            CatalogIssue::Overlap {
                key,
                other,
                address,
            } => write!(f, "Field {key} overlaps {other} at {}", format_addr(*address)),
        }
    }
}

/// Check a field table for layout mistakes. The built-in table must come back
/// clean.
pub fn validate_catalog(fields: &[FieldDef]) -> Vec<CatalogIssue> {
    let mut issues = Vec::new();
    let mut keys = HashSet::new();
    let mut owners: Vec<(u32, &'static str)> = Vec::new();

    for field in fields {
        if !keys.insert(field.key) {
            issues.push(CatalogIssue::DuplicateKey(field.key));
        }
        if field.size == 0 {
            issues.push(CatalogIssue::EmptyField(field.key));
            continue;
        }
        if field.address < IMAGE_START {
            issues.push(CatalogIssue::OutOfBounds {
                key: field.key,
                address: field.address,
            });
        } else if field.last() > EXT_END {
            issues.push(CatalogIssue::OutOfBounds {
                key: field.key,
                address: field.last(),
            });
        }
        let in_region = match field.region {
            Region::Core => field.last() <= CORE_END,
            Region::Extended => field.address >= EXT_START,
        };
        if !in_region {
            issues.push(CatalogIssue::WrongRegion {
                key: field.key,
                region: field.region,
            });
        }
        if let Some(address) =
            (field.address..field.end()).find(|a| (RESERVED_START..=RESERVED_END).contains(a))
        {
            issues.push(CatalogIssue::Reserved {
                key: field.key,
                address,
            });
        }
        for address in field.address..field.end() {
            if let Some((_, other)) = owners.iter().find(|(owned, _)| *owned == address) {
                issues.push(CatalogIssue::Overlap {
                    key: field.key,
                    other: *other,
                    address,
                });
                break;
            }
        }
        owners.extend((field.address..field.end()).map(|a| (a, field.key)));
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_clean() {
        assert_eq!(validate_catalog(all_fields()), Vec::new());
    }

    #[test]
    fn core_comes_before_extended() {
        let core = core_fields();
        let ext = extended_fields();
        assert_eq!(core.len(), 13);
        assert_eq!(ext.len(), 19);
        let joined: Vec<FieldDef> = core.iter().chain(ext.iter()).copied().collect();
        assert_eq!(joined.as_slice(), all_fields());
    }

    #[test]
    fn definition_order_is_address_order() {
        let addrs: Vec<u32> = all_fields().iter().map(|f| f.address).collect();
        let mut sorted = addrs.clone();
        sorted.sort_unstable();
        assert_eq!(addrs, sorted);
    }

    #[test]
    fn url_field_matches_layout() {
        let url = field("dataUrl").expect("dataUrl");
        assert_eq!(url.address, 0x6D);
        assert_eq!(url.size, 32);
        assert_eq!(url.last(), 0x8C);
        assert_eq!(url.kind, FieldKind::Text { ascii_only: true });
    }

    #[test]
    fn last_extended_field_is_vrec() {
        let last = all_fields().last().expect("non-empty");
        assert_eq!(last.key, "vRec");
        assert_eq!(last.address, 0xCA);
    }

    #[test]
    fn validate_reports_overlap_and_reserved_bytes() {
        let fields = [
            core("a", "A", 0x58, 4, INT, None),
            core("b", "B", 0x5B, 1, INT, None),
        ];
        let issues = validate_catalog(&fields);
        assert!(issues.contains(&CatalogIssue::Reserved {
            key: "a",
            address: 0x5A
        }));
        assert!(issues.contains(&CatalogIssue::Overlap {
            key: "b",
            other: "a",
            address: 0x5B
        }));
    }

    #[test]
    fn validate_reports_region_and_bounds() {
        let fields = [
            core("a", "A", 0x9E, 4, INT, None),
            ext("b", "B", 0x90, 1, INT),
            ext("c", "C", 0x1FE, 4, INT),
            ext("c", "C again", 0x1F0, 0, INT),
        ];
        let issues = validate_catalog(&fields);
        assert!(issues.contains(&CatalogIssue::WrongRegion {
            key: "a",
            region: Region::Core
        }));
        assert!(issues.contains(&CatalogIssue::WrongRegion {
            key: "b",
            region: Region::Extended
        }));
        assert!(issues.contains(&CatalogIssue::OutOfBounds {
            key: "c",
            address: 0x201
        }));
        assert!(issues.contains(&CatalogIssue::DuplicateKey("c")));
        assert!(issues.contains(&CatalogIssue::EmptyField("c")));
    }

    #[test]
    fn catalog_json_includes_scale_only_for_scaled_fields() {
        let diameter = field("diameter").expect("diameter").to_json();
        assert_eq!(diameter["scale"], 1000.0);
        assert_eq!(diameter["address"], "0x52");
        let weight = field("weightNom").expect("weightNom").to_json();
        assert!(weight["scale"].is_null());
        assert_eq!(weight["kind"], "integer");
    }
}
