// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Per-kind field codecs.
//!
//! Encoders never fail the whole image: each returns the bytes to write (or
//! nothing) plus at most one diagnostic. The decoders are the inverse where
//! the encoding is lossless enough to have one.

use super::catalog::{FieldDef, FieldKind};
use super::error::{Diagnostic, DiagnosticKind};
use super::tag::UNSET_BYTE;
use super::value::LogicalValue;

/// Result of running one field through its codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEncoding {
    /// Exactly `field.size` bytes, or `None` when the field is skipped.
    pub bytes: Option<Vec<u8>>,
    pub diagnostic: Option<Diagnostic>,
}

impl FieldEncoding {
    fn write(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            diagnostic: None,
        }
    }

    fn skip() -> Self {
        Self {
            bytes: None,
            diagnostic: None,
        }
    }

    fn reject(diagnostic: Diagnostic) -> Self {
        Self {
            bytes: None,
            diagnostic: Some(diagnostic),
        }
    }

    fn with_diagnostic(mut self, diagnostic: Option<Diagnostic>) -> Self {
        self.diagnostic = diagnostic;
        self
    }

    pub fn is_skip(&self) -> bool {
        self.bytes.is_none()
    }
}

/// Encode a field. `value` is `None` when the key was absent from the map.
pub fn encode_field(field: &FieldDef, value: Option<&LogicalValue>) -> FieldEncoding {
    if let Some(LogicalValue::Unset) = value {
        return FieldEncoding::write(vec![UNSET_BYTE; field.size]);
    }
    match field.kind {
        FieldKind::Text { ascii_only } => encode_text(field, value, ascii_only),
        FieldKind::Integer => encode_integer(field, value),
        FieldKind::ScaledInteger { scale } => encode_scaled(field, value, scale),
        FieldKind::ColorRgba => encode_rgba(field, value),
        FieldKind::DateYmd => encode_date(field, value),
        FieldKind::TimeHms => encode_time(field, value),
    }
}

fn field_diag(field: &FieldDef, kind: DiagnosticKind, message: String) -> Diagnostic {
    Diagnostic::new(kind, message)
        .with_field(field.key)
        .with_address(field.address)
}

/// Unsigned big-endian in `size` bytes. Bits above `size * 8` are dropped.
pub fn be_pack(value: u64, size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    let mut rest = value;
    for slot in out.iter_mut().rev() {
        *slot = (rest & 0xFF) as u8;
        rest >>= 8;
    }
    out
}

pub fn be_unpack(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Largest value representable in `size` bytes.
pub fn max_for_size(size: usize) -> u64 {
    if size >= 8 {
        u64::MAX
    } else {
        (1u64 << (size * 8)) - 1
    }
}

fn strip_protocol(text: &str) -> &str {
    for prefix in ["https://", "http://"] {
        if let Some(head) = text.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return &text[prefix.len()..];
            }
        }
    }
    text
}

fn pad_bytes(raw: &[u8], size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    let len = raw.len().min(size);
    out[..len].copy_from_slice(&raw[..len]);
    out
}

fn encode_text(field: &FieldDef, value: Option<&LogicalValue>, ascii_only: bool) -> FieldEncoding {
    let text = value.and_then(LogicalValue::to_text).unwrap_or_default();
    if ascii_only {
        let cleaned = strip_protocol(&text);
        if !cleaned.is_ascii() {
            return FieldEncoding::reject(field_diag(
                field,
                DiagnosticKind::NonAscii,
                format!(
                    "{}: Non-ASCII character detected in an ASCII-only field",
                    field.label
                ),
            ));
        }
        return FieldEncoding::write(pad_bytes(cleaned.as_bytes(), field.size));
    }
    FieldEncoding::write(pad_bytes(text.as_bytes(), field.size))
}

fn encode_integer(field: &FieldDef, value: Option<&LogicalValue>) -> FieldEncoding {
    let Some(n) = value
        .and_then(LogicalValue::to_number)
        .filter(|n| n.is_finite() && *n >= 0.0)
    else {
        return FieldEncoding::skip();
    };
    FieldEncoding::write(be_pack(n.floor() as u64, field.size))
}

/// Round half toward positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn encode_scaled(field: &FieldDef, value: Option<&LogicalValue>, scale: f64) -> FieldEncoding {
    let Some(raw) = value
        .and_then(LogicalValue::to_number)
        .filter(|n| n.is_finite())
    else {
        return FieldEncoding::skip();
    };
    let scaled = round_half_up(raw * scale);
    let max = max_for_size(field.size);
    let diagnostic = if scaled < 0.0 || scaled > max as f64 {
        Some(field_diag(
            field,
            DiagnosticKind::ScaledOutOfRange,
            format!(
                "{} scaled value {scaled} does not fit in {} byte(s)",
                field.label, field.size
            ),
        ))
    } else {
        None
    };
    let clamped = scaled.clamp(0.0, max as f64) as u64;
    FieldEncoding::write(be_pack(clamped, field.size)).with_diagnostic(diagnostic)
}

/// Leading integer of a token, `0` when there is none.
fn leading_int(token: &str) -> i64 {
    let (negative, digits) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10)
                .saturating_add(i64::from(digit - b'0'))
        });
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn trimmed_text(value: Option<&LogicalValue>) -> Option<String> {
    value
        .and_then(LogicalValue::to_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn encode_rgba(field: &FieldDef, value: Option<&LogicalValue>) -> FieldEncoding {
    let Some(text) = trimmed_text(value) else {
        return FieldEncoding::skip();
    };
    let parts: Vec<&str> = text
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() != 4 {
        return FieldEncoding::reject(field_diag(
            field,
            DiagnosticKind::ColorTokenCount,
            format!("{} must be 4 integers (e.g., 255,166,77,255)", field.label),
        ));
    }
    let bytes = parts
        .iter()
        .map(|part| leading_int(part).clamp(0, 255) as u8)
        .collect();
    FieldEncoding::write(bytes)
}

/// Split `text` into numeric groups of the given widths separated by `sep`.
/// Every group must be all ASCII digits.
fn split_fixed(text: &str, sep: u8, widths: &[usize]) -> Option<Vec<u32>> {
    let bytes = text.as_bytes();
    let expected = widths.iter().sum::<usize>() + widths.len() - 1;
    if bytes.len() != expected {
        return None;
    }
    let mut out = Vec::with_capacity(widths.len());
    let mut pos = 0;
    for (ix, width) in widths.iter().enumerate() {
        if ix > 0 {
            if bytes[pos] != sep {
                return None;
            }
            pos += 1;
        }
        let group = &bytes[pos..pos + width];
        if !group.iter().all(u8::is_ascii_digit) {
            return None;
        }
        out.push(
            group
                .iter()
                .fold(0u32, |acc, digit| acc * 10 + u32::from(digit - b'0')),
        );
        pos += width;
    }
    Some(out)
}

fn encode_date(field: &FieldDef, value: Option<&LogicalValue>) -> FieldEncoding {
    let Some(text) = trimmed_text(value) else {
        return FieldEncoding::skip();
    };
    let Some(parts) = split_fixed(&text, b'-', &[4, 2, 2]) else {
        return FieldEncoding::reject(field_diag(
            field,
            DiagnosticKind::MalformedDate,
            format!("{} must be YYYY-MM-DD", field.label),
        ));
    };
    let (year, month, day) = (parts[0], parts[1], parts[2]);
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return FieldEncoding::reject(field_diag(
            field,
            DiagnosticKind::InvalidDate,
            format!("{} has an invalid date", field.label),
        ));
    }
    let mut bytes = be_pack(u64::from(year), 2);
    bytes.push(month as u8);
    bytes.push(day as u8);
    FieldEncoding::write(pad_bytes(&bytes, field.size))
}

fn encode_time(field: &FieldDef, value: Option<&LogicalValue>) -> FieldEncoding {
    let Some(text) = trimmed_text(value) else {
        return FieldEncoding::skip();
    };
    let Some(parts) = split_fixed(&text, b':', &[2, 2, 2]) else {
        return FieldEncoding::reject(field_diag(
            field,
            DiagnosticKind::MalformedTime,
            format!("{} must be HH:MM:SS", field.label),
        ));
    };
    let bytes = vec![
        parts[0].min(23) as u8,
        parts[1].min(59) as u8,
        parts[2].min(59) as u8,
    ];
    FieldEncoding::write(pad_bytes(&bytes, field.size))
}

/// Read a field back out of its bytes.
///
/// A field whose bytes are all `0xFF` reads as `Unset`. Returns `None` when
/// `bytes` is shorter than the field.
pub fn decode_field(field: &FieldDef, bytes: &[u8]) -> Option<LogicalValue> {
    let bytes = bytes.get(..field.size)?;
    if !bytes.is_empty() && bytes.iter().all(|b| *b == UNSET_BYTE) {
        return Some(LogicalValue::Unset);
    }
    let value = match field.kind {
        FieldKind::Text { .. } => {
            let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
            LogicalValue::Text(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
        FieldKind::Integer => LogicalValue::Number(be_unpack(bytes) as f64),
        FieldKind::ScaledInteger { scale } => {
            LogicalValue::Number(be_unpack(bytes) as f64 / scale)
        }
        FieldKind::ColorRgba => LogicalValue::Text(
            bytes
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        FieldKind::DateYmd => {
            let year = be_unpack(bytes.get(..2)?);
            let month = *bytes.get(2)?;
            let day = *bytes.get(3)?;
            LogicalValue::Text(format!("{year:04}-{month:02}-{day:02}"))
        }
        FieldKind::TimeHms => {
            let hms = bytes.get(..3)?;
            LogicalValue::Text(format!("{:02}:{:02}:{:02}", hms[0], hms[1], hms[2]))
        }
    };
    Some(value)
}
