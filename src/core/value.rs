// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Logical (human-entered) field values.

use std::collections::BTreeMap;

use super::catalog::{self, FieldKind};
use super::error::{TagError, TagErrorKind};

/// A raw value for one field, before any codec sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalValue {
    /// Explicit "unknown"; the field is filled with the unset byte.
    Unset,
    Text(String),
    Number(f64),
}

impl LogicalValue {
    /// Text form of the value. Numbers render in their shortest decimal form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            LogicalValue::Unset => None,
            LogicalValue::Text(text) => Some(text.clone()),
            LogicalValue::Number(n) => Some(format_number(*n)),
        }
    }

    /// Numeric reading of the value. Blank or unparsable text yields `None`.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            LogicalValue::Unset => None,
            LogicalValue::Number(n) => Some(*n),
            LogicalValue::Text(text) => parse_number(text),
        }
    }

    fn from_json(key: &str, value: &serde_json::Value) -> Result<Self, TagError> {
        match value {
            serde_json::Value::Null => Ok(LogicalValue::Unset),
            serde_json::Value::String(text) => Ok(LogicalValue::Text(text.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(LogicalValue::Number).ok_or_else(|| {
                TagError::new(TagErrorKind::Input, "Number out of range for field", Some(key))
            }),
            _ => Err(TagError::new(
                TagErrorKind::Input,
                "Field values must be null, a string or a number",
                Some(key),
            )),
        }
    }
}

impl From<&str> for LogicalValue {
    fn from(value: &str) -> Self {
        LogicalValue::Text(value.to_string())
    }
}

impl From<String> for LogicalValue {
    fn from(value: String) -> Self {
        LogicalValue::Text(value)
    }
}

impl From<f64> for LogicalValue {
    fn from(value: f64) -> Self {
        LogicalValue::Number(value)
    }
}

impl From<i64> for LogicalValue {
    fn from(value: i64) -> Self {
        LogicalValue::Number(value as f64)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Lenient numeric parse: surrounding whitespace is ignored and a `0x` prefix
/// selects hexadecimal.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    // Blank text counts as no value, so numeric fields skip it instead of writing 0.
    if trimmed.is_empty() {
        return None;
    }
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"));
    if let Some(digits) = hex {
        return u64::from_str_radix(digits, 16).ok().map(|v| v as f64);
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Field key to logical value. Keys missing from the map are "absent".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    values: BTreeMap<String, LogicalValue>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<LogicalValue>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn unset(&mut self, key: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), LogicalValue::Unset);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<LogicalValue> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&LogicalValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Overlay every entry of `other` onto this map.
    pub fn merge(&mut self, other: ValueMap) {
        self.values.extend(other.values);
    }

    /// Keys that are not in the field catalog.
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.keys()
            .filter(|key| catalog::field(key).is_none())
            .collect()
    }

    /// Parse a JSON object of `key: null | string | number`.
    pub fn from_json_str(text: &str) -> Result<Self, TagError> {
        let doc: serde_json::Value = serde_json::from_str(text).map_err(|err| {
            TagError::new(
                TagErrorKind::Input,
                "Invalid JSON value map",
                Some(&err.to_string()),
            )
        })?;
        let serde_json::Value::Object(entries) = doc else {
            return Err(TagError::new(
                TagErrorKind::Input,
                "Value map must be a JSON object",
                None,
            ));
        };
        let mut map = ValueMap::new();
        for (key, value) in &entries {
            map.values
                .insert(key.clone(), LogicalValue::from_json(key, value)?);
        }
        Ok(map)
    }

    /// Parse a `key=value` assignment. Text fields keep the raw text as typed;
    /// for other fields, values that read as plain decimal numbers become
    /// numbers and anything else stays text.
    pub fn parse_assignment(&mut self, assignment: &str) -> Result<(), TagError> {
        let Some((key, raw)) = assignment.split_once('=') else {
            return Err(TagError::new(
                TagErrorKind::Cli,
                "Expected KEY=VALUE",
                Some(assignment),
            ));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(TagError::new(
                TagErrorKind::Cli,
                "Missing key in assignment",
                Some(assignment),
            ));
        }
        let is_text = catalog::field(key)
            .is_some_and(|def| matches!(def.kind, FieldKind::Text { .. }));
        let value = match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() && !is_text => LogicalValue::Number(n),
            _ => LogicalValue::Text(raw.to_string()),
        };
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// The defaults the tag builder starts from: a blue PLA spool with every
    /// extended field explicitly unknown.
    pub fn sample() -> Self {
        let mut map = ValueMap::new();
        map.set("tagFormat", "OT")
            .set("tagVersion", "1.000")
            .set("manufacturer", "Polar Filament")
            .set("baseMaterial", "PLA")
            .set("materialMods", "CF")
            .set("colorName", "Blue")
            .set("colorRGBA", "255,166,77,255")
            .set("diameter", 1.75)
            .set("weightNom", 1000i64)
            .set("printTemp", 210i64)
            .set("bedTemp", 60i64)
            .set("density", 1.24)
            .set("dataUrl", "pfil.us?i=8078-RQSR");
        for field in catalog::extended_fields() {
            map.unset(field.key);
        }
        map
    }
}
