// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Tag image layout.
//!
//! Runs every active field through its codec, tracks which field owns each
//! byte, and assembles the contiguous image that starts at `IMAGE_START`.

pub mod capacity;
pub mod decode;
pub mod report;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use crate::core::catalog::{self, FieldDef};
use crate::core::codec::encode_field;
use crate::core::error::{Diagnostic, DiagnosticKind, Severity};
use crate::core::tag::{format_addr, TagType, EXT_START, IMAGE_START, UNSET_BYTE};
use crate::core::value::ValueMap;

/// Bytes resolved for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub address: u32,
    pub bytes: Vec<u8>,
    pub field: FieldDef,
}

impl Write {
    /// Last address covered (inclusive).
    pub fn last(&self) -> u32 {
        (self.address + self.bytes.len() as u32).saturating_sub(1)
    }
}

/// Contiguous memory from `IMAGE_START` to `highest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
    highest: u32,
}

impl Image {
    fn empty() -> Self {
        Self {
            bytes: Vec::new(),
            highest: IMAGE_START - 1,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn start(&self) -> u32 {
        IMAGE_START
    }

    /// Highest address written, or `IMAGE_START - 1` for an empty image.
    pub fn highest(&self) -> u32 {
        self.highest
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte at an absolute tag address, if it is inside the image.
    pub fn byte_at(&self, address: u32) -> Option<u8> {
        let offset = address.checked_sub(IMAGE_START)?;
        self.bytes.get(offset as usize).copied()
    }

    /// `len` bytes starting at an absolute tag address.
    pub fn slice_at(&self, address: u32, len: usize) -> Option<&[u8]> {
        let offset = address.checked_sub(IMAGE_START)? as usize;
        self.bytes.get(offset..offset.checked_add(len)?)
    }
}

/// Everything one encode produces.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeResult {
    pub tag_type: TagType,
    pub image: Image,
    /// In catalog order.
    pub writes: Vec<Write>,
    pub diagnostics: Vec<Diagnostic>,
}

impl EncodeResult {
    pub fn span(&self) -> u32 {
        self.image.highest() + 1 - IMAGE_START
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity() == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity() == Severity::Warning)
    }

    /// Diagnostic messages in the order they were raised.
    pub fn issues(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }
}

/// Fields written for a tag type: core only on the smallest tag, everything
/// otherwise.
pub fn active_fields(tag_type: TagType) -> Vec<FieldDef> {
    if tag_type.is_minimal_tier() {
        catalog::core_fields()
    } else {
        catalog::all_fields().to_vec()
    }
}

/// Encode a value map for the given tag type.
pub fn encode(values: &ValueMap, tag_type: TagType) -> EncodeResult {
    encode_fields(&active_fields(tag_type), values, tag_type)
}

/// Encode an explicit field list. Fields are processed in slice order and a
/// later field wins any byte it shares with an earlier one.
pub fn encode_fields(fields: &[FieldDef], values: &ValueMap, tag_type: TagType) -> EncodeResult {
    let mut diagnostics = Vec::new();
    let mut writes: Vec<Write> = Vec::new();
    let mut owners: BTreeMap<u32, &'static str> = BTreeMap::new();
    let mut highest: Option<u32> = None;

    for field in fields {
        let encoded = encode_field(field, values.get(field.key));
        if let Some(diag) = encoded.diagnostic {
            diagnostics.push(diag);
        }
        let Some(bytes) = encoded.bytes else {
            continue;
        };
        if bytes.is_empty() {
            continue;
        }
        for address in field.address..field.address + bytes.len() as u32 {
            if let Some(owner) = owners.insert(address, field.key) {
                if owner != field.key {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::Overlap,
                            format!(
                                "{} overlaps {owner} at {} (size {})",
                                field.label,
                                format_addr(address),
                                field.size
                            ),
                        )
                        .with_field(field.key)
                        .with_address(address),
                    );
                }
            }
        }
        let write = Write {
            address: field.address,
            bytes,
            field: *field,
        };
        highest = Some(highest.map_or(write.last(), |h| h.max(write.last())));
        writes.push(write);
    }

    let image = match highest {
        Some(highest) if highest >= IMAGE_START => build_image(&writes, highest),
        _ => Image::empty(),
    };
    let mut result = EncodeResult {
        tag_type,
        image,
        writes,
        diagnostics,
    };
    if let Some(diag) = capacity::check(&result.image, tag_type) {
        result.diagnostics.push(diag);
    }
    result
}

fn build_image(writes: &[Write], highest: u32) -> Image {
    let len = (highest - IMAGE_START + 1) as usize;
    let mut bytes = vec![0u8; len];
    let fill_from = (EXT_START - IMAGE_START) as usize;
    if fill_from < len {
        bytes[fill_from..].fill(UNSET_BYTE);
    }
    for write in writes {
        // Catalog addresses never sit below IMAGE_START.
        let Some(offset) = write.address.checked_sub(IMAGE_START) else {
            continue;
        };
        let offset = offset as usize;
        let end = (offset + write.bytes.len()).min(len);
        bytes[offset..end].copy_from_slice(&write.bytes[..end - offset]);
    }
    Image { bytes, highest }
}
