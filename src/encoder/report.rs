// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Address maps (JSON/CSV), hex preview and artifact naming.

use serde::Serialize;

use crate::core::error::{TagError, TagErrorKind};
use crate::core::tag::{format_addr, TagType, IMAGE_START};

use super::{EncodeResult, Image};

pub const CSV_HEADER: &str = "address,key,label,size,dataHex";
const PREVIEW_ROW: usize = 16;

/// One written field, as shown in the maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntry {
    pub address: String,
    pub key: String,
    pub label: String,
    pub size: usize,
    pub data_hex: String,
}

/// The JSON map document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressMap {
    pub from: String,
    pub to: String,
    pub tag_type: String,
    pub entries: Vec<MapEntry>,
}

impl AddressMap {
    pub fn to_json(&self) -> Result<String, TagError> {
        serde_json::to_string_pretty(self).map_err(|err| {
            TagError::new(
                TagErrorKind::Io,
                "Error serializing address map",
                Some(&err.to_string()),
            )
        })
    }

    /// Header plus one row per entry. Key and label are quoted as JSON
    /// strings; rows are separated by `\n` with no trailing newline.
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.entries.len() + 1);
        lines.push(CSV_HEADER.to_string());
        for entry in &self.entries {
            lines.push(format!(
                "{},{},{},{},{}",
                entry.address,
                quote(&entry.key),
                quote(&entry.label),
                entry.size,
                entry.data_hex
            ));
        }
        lines.join("\n")
    }
}

fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Uppercase hex with no separators.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Build the address-sorted map for an encode result.
pub fn build_map(result: &EncodeResult) -> AddressMap {
    let mut writes: Vec<_> = result.writes.iter().collect();
    writes.sort_by_key(|write| write.address);
    AddressMap {
        from: format_addr(IMAGE_START),
        to: format_addr(result.image.highest()),
        tag_type: result.tag_type.name().to_string(),
        entries: writes
            .into_iter()
            .map(|write| MapEntry {
                address: format_addr(write.address),
                key: write.field.key.to_string(),
                label: write.field.label.to_string(),
                size: write.bytes.len(),
                data_hex: to_hex(&write.bytes),
            })
            .collect(),
    }
}

pub fn bin_file_name(result: &EncodeResult) -> String {
    format!(
        "opentag3d_{}_{}-{}.bin",
        result.tag_type,
        format_addr(IMAGE_START),
        format_addr(result.image.highest())
    )
}

pub fn json_file_name(tag_type: TagType) -> String {
    format!("opentag3d_{tag_type}_map.json")
}

pub fn csv_file_name(tag_type: TagType) -> String {
    format!("opentag3d_{tag_type}_map.csv")
}

pub fn span_summary(image: &Image) -> String {
    format!(
        "Image span: {}–{} ({} bytes)",
        format_addr(IMAGE_START),
        format_addr(image.highest()),
        image.len()
    )
}

/// 16 bytes per row, each row prefixed with its absolute address.
pub fn hex_preview(image: &Image) -> Vec<String> {
    image
        .bytes()
        .chunks(PREVIEW_ROW)
        .enumerate()
        .map(|(ix, row)| {
            let addr = IMAGE_START + (ix * PREVIEW_ROW) as u32;
            let bytes: Vec<String> = row.iter().map(|b| format!("{b:02X}")).collect();
            format!("{addr:04X}  {}", bytes.join(" "))
        })
        .collect()
}
