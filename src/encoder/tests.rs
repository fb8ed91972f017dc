// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;
use crate::core::catalog::{field, FieldKind, Region};
use crate::core::error::DiagnosticKind;
use crate::core::tag::CORE_END;
use crate::core::value::LogicalValue;
use proptest::prelude::*;

fn values(pairs: &[(&str, &str)]) -> ValueMap {
    let mut map = ValueMap::new();
    for (key, value) in pairs {
        map.set(*key, *value);
    }
    map
}

fn def(key: &str) -> FieldDef {
    *field(key).expect("catalog field")
}

fn custom(key: &'static str, address: u32, size: usize) -> FieldDef {
    FieldDef {
        key,
        label: key,
        address,
        size,
        region: Region::Core,
        kind: FieldKind::Integer,
        note: None,
    }
}

#[test]
fn tag_format_and_version_scenario() {
    let result = encode(
        &values(&[("tagFormat", "OT"), ("tagVersion", "1.000")]),
        TagType::Ntag213,
    );
    assert_eq!(result.image.slice_at(0x10, 2), Some(&[0x4F, 0x54][..]));
    assert_eq!(result.image.slice_at(0x12, 2), Some(&[0x03, 0xE8][..]));
}

#[test]
fn diameter_scenario() {
    let mut map = ValueMap::new();
    map.set("diameter", 1.75);
    let result = encode(&map, TagType::Ntag213);
    let bytes = result.image.slice_at(0x52, 2).expect("diameter bytes");
    assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 1750);
}

#[test]
fn color_scenario() {
    let result = encode(&values(&[("colorRGBA", "255,166,77,255")]), TagType::Ntag213);
    assert_eq!(
        result.image.slice_at(0x4E, 4),
        Some(&[0xFF, 0xA6, 0x4D, 0xFF][..])
    );
}

#[test]
fn data_url_scenario() {
    let result = encode(
        &values(&[("dataUrl", "https://pfil.us?i=8078-RQSR")]),
        TagType::Ntag213,
    );
    let mut expected = b"pfil.us?i=8078-RQSR".to_vec();
    expected.resize(32, 0);
    assert_eq!(result.image.slice_at(0x6D, 32), Some(expected.as_slice()));
    assert!(result.diagnostics.is_empty());
}

#[test]
fn ntag213_core_only_scenario() {
    let mut map = ValueMap::sample();
    map.set("serial", "ABC123");
    let result = encode(&map, TagType::Ntag213);
    assert_eq!(result.image.highest(), 0x8C);
    assert_eq!(result.image.len(), 0x8C - 0x10 + 1);
    assert!(result.writes.iter().all(|w| w.field.region == Region::Core));
    assert!(result.diagnostics.is_empty());
    assert!(result.image.highest() <= CORE_END);
}

#[test]
fn sample_on_ntag215_spans_to_last_extended_field() {
    let result = encode(&ValueMap::sample(), TagType::Ntag215);
    assert_eq!(result.image.highest(), 0xCA);
    assert_eq!(result.span(), 187);
    assert_eq!(result.writes.len(), 32);
    assert!(result.diagnostics.is_empty());
    // Reserved core bytes and the gap after the URL stay zero.
    assert!(result
        .image
        .slice_at(0x5A, 0x6D - 0x5A)
        .expect("reserved")
        .iter()
        .all(|b| *b == 0));
    assert!(result
        .image
        .slice_at(0x8D, 0xA0 - 0x8D)
        .expect("gap")
        .iter()
        .all(|b| *b == 0));
}

#[test]
fn empty_input_gives_empty_image() {
    let result = encode_fields(
        &[def("weightNom"), def("diameter")],
        &ValueMap::new(),
        TagType::Ntag213,
    );
    assert!(result.image.is_empty());
    assert_eq!(result.image.highest(), 0x0F);
    assert_eq!(result.span(), 0);
    assert!(result.writes.is_empty());
    assert!(result.diagnostics.is_empty());
}

#[test]
fn absent_text_fields_still_write_zeroes() {
    let result = encode(&ValueMap::new(), TagType::Ntag213);
    let keys: Vec<&str> = result.writes.iter().map(|w| w.field.key).collect();
    assert_eq!(
        keys,
        vec![
            "tagFormat",
            "manufacturer",
            "baseMaterial",
            "materialMods",
            "colorName",
            "dataUrl"
        ]
    );
    assert!(result.image.bytes().iter().all(|b| *b == 0));
}

#[test]
fn extended_gap_is_prefilled_with_unset_byte() {
    let mut map = ValueMap::new();
    map.set("vRec", 7i64);
    let result = encode_fields(&[def("vRec")], &map, TagType::Ntag216);
    assert_eq!(result.image.highest(), 0xCA);
    assert_eq!(result.image.byte_at(0x9F), Some(0x00));
    assert_eq!(result.image.byte_at(0xA0), Some(0xFF));
    assert_eq!(result.image.byte_at(0xC9), Some(0xFF));
    assert_eq!(result.image.byte_at(0xCA), Some(0x07));
}

#[test]
fn explicit_writes_beat_extended_prefill() {
    let mut map = ValueMap::new();
    map.set("coreDia", 0i64).set("serial", "");
    let result = encode_fields(&[def("serial"), def("coreDia")], &map, TagType::Ntag215);
    assert!(result
        .image
        .slice_at(0xA0, 16)
        .expect("serial")
        .iter()
        .all(|b| *b == 0));
    assert_eq!(result.image.byte_at(0xB0), Some(0xFF));
    assert_eq!(result.image.byte_at(0xB7), Some(0x00));
}

#[test]
fn unset_sentinel_overrides_zero_background() {
    let mut map = ValueMap::new();
    map.unset("density").set("dataUrl", "x");
    let result = encode(&map, TagType::Ntag213);
    assert_eq!(result.image.slice_at(0x58, 2), Some(&[0xFF, 0xFF][..]));
    assert_eq!(result.image.byte_at(0x5A), Some(0x00));
}

#[test]
fn overlap_reports_each_shared_byte_and_later_field_wins() {
    let mut map = ValueMap::new();
    map.set("a", 0x0102_0304i64).set("b", 0xAABBi64);
    let fields = [custom("a", 0x20, 4), custom("b", 0x22, 2)];
    let result = encode_fields(&fields, &map, TagType::Ntag213);
    let overlaps: Vec<String> = result
        .diagnostics
        .iter()
        .filter(|d| d.kind() == DiagnosticKind::Overlap)
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        overlaps,
        vec![
            "b overlaps a at 0x22 (size 2)".to_string(),
            "b overlaps a at 0x23 (size 2)".to_string(),
        ]
    );
    assert_eq!(
        result.image.slice_at(0x20, 4),
        Some(&[0x01, 0x02, 0xAA, 0xBB][..])
    );
    assert_eq!(result.diagnostics[0].field(), Some("b"));
    assert_eq!(result.diagnostics[0].address(), Some(0x22));
}

#[test]
fn adjacent_fields_do_not_overlap() {
    let mut map = ValueMap::new();
    map.set("a", 1i64).set("b", 2i64);
    let fields = [custom("a", 0x20, 2), custom("b", 0x22, 2)];
    let result = encode_fields(&fields, &map, TagType::Ntag213);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn skipped_field_does_not_claim_bytes() {
    let mut map = ValueMap::new();
    map.set("b", 2i64);
    let fields = [custom("a", 0x20, 4), custom("b", 0x22, 2)];
    let result = encode_fields(&fields, &map, TagType::Ntag213);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.image.len(), 0x24 - 0x10);
}

#[test]
fn capacity_is_checked_against_selected_tag() {
    let result = encode_fields(&[def("vRec")], &values(&[("vRec", "1")]), TagType::Ntag213);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind(), DiagnosticKind::Capacity);
    assert_eq!(result.image.len(), 187);
    assert!(result.has_errors());
}

#[test]
fn codec_diagnostics_are_collected_in_catalog_order() {
    let mut map = ValueMap::new();
    map.set("colorRGBA", "1,2")
        .set("printTemp", 5000i64)
        .set("mfgDate", "yesterday")
        .set("mfgTime", "noon")
        .set("dataUrl", "ünïcode");
    let result = encode(&map, TagType::Ntag215);
    let kinds: Vec<DiagnosticKind> = result.diagnostics.iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::ColorTokenCount,
            DiagnosticKind::ScaledOutOfRange,
            DiagnosticKind::NonAscii,
            DiagnosticKind::MalformedDate,
            DiagnosticKind::MalformedTime,
        ]
    );
    assert!(result.has_warnings());
    assert!(result.writes.iter().all(|w| w.field.key != "dataUrl"));
    assert_eq!(result.image.byte_at(0x56), Some(0xFF));
    assert_eq!(result.issues().len(), 5);
}

#[test]
fn writes_keep_catalog_order() {
    let result = encode(&ValueMap::sample(), TagType::Ntag216);
    let addresses: Vec<u32> = result.writes.iter().map(|w| w.address).collect();
    let catalog: Vec<u32> = crate::core::catalog::all_fields()
        .iter()
        .map(|f| f.address)
        .collect();
    assert_eq!(addresses, catalog);
}

#[test]
fn active_fields_follow_tag_tier() {
    assert_eq!(active_fields(TagType::Ntag213).len(), 13);
    assert_eq!(active_fields(TagType::Ntag215).len(), 32);
    assert_eq!(active_fields(TagType::Ntag216).len(), 32);
}

fn tag_strategy() -> impl Strategy<Value = TagType> {
    prop_oneof![
        Just(TagType::Ntag213),
        Just(TagType::Ntag215),
        Just(TagType::Ntag216),
    ]
}

fn value_strategy() -> impl Strategy<Value = Option<LogicalValue>> {
    prop_oneof![
        Just(None),
        Just(Some(LogicalValue::Unset)),
        "[ -~]{0,40}".prop_map(|s| Some(LogicalValue::Text(s))),
        (-10.0f64..100_000.0).prop_map(|n| Some(LogicalValue::Number(n))),
    ]
}

fn map_strategy() -> impl Strategy<Value = ValueMap> {
    let count = crate::core::catalog::all_fields().len();
    proptest::collection::vec(value_strategy(), count).prop_map(|choices| {
        let mut map = ValueMap::new();
        for (field, choice) in crate::core::catalog::all_fields().iter().zip(choices) {
            if let Some(value) = choice {
                map.set(field.key, value);
            }
        }
        map
    })
}

proptest! {
    #[test]
    fn encoding_is_deterministic(map in map_strategy(), tag in tag_strategy()) {
        let first = encode(&map, tag);
        let second = encode(&map, tag);
        prop_assert_eq!(&first.image, &second.image);
        prop_assert_eq!(first.issues(), second.issues());
    }

    #[test]
    fn image_fits_tag_or_reports_capacity(map in map_strategy(), tag in tag_strategy()) {
        let result = encode(&map, tag);
        let reported = result
            .diagnostics
            .iter()
            .any(|d| d.kind() == DiagnosticKind::Capacity);
        prop_assert!(result.image.len() <= tag.capacity() as usize || reported);
    }

    #[test]
    fn builtin_catalog_never_overlaps(map in map_strategy(), tag in tag_strategy()) {
        let result = encode(&map, tag);
        prop_assert!(result.diagnostics.iter().all(|d| d.kind() != DiagnosticKind::Overlap));
    }

    #[test]
    fn unset_fields_read_back_as_ff(ix in 0usize..32, tag in tag_strategy()) {
        let field = crate::core::catalog::all_fields()[ix];
        let mut map = ValueMap::new();
        map.unset(field.key);
        let result = encode(&map, tag);
        if active_fields(tag).iter().any(|f| f.key == field.key) {
            let bytes = result.image.slice_at(field.address, field.size).expect("in image");
            prop_assert!(bytes.iter().all(|b| *b == 0xFF));
        }
    }
}

#[test]
fn assigned_serial_keeps_leading_zeros() {
    let mut map = ValueMap::new();
    map.parse_assignment("serial=007").expect("assign");
    let result = encode(&map, TagType::Ntag215);
    let bytes = result.image.slice_at(0xA0, 16).expect("serial");
    assert_eq!(&bytes[..4], &[0x30, 0x30, 0x37, 0x00]);
}
