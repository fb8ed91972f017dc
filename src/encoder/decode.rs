// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Reading an image back into field values.

use crate::core::catalog::FieldDef;
use crate::core::codec::decode_field;
use crate::core::tag::{TagType, IMAGE_START};
use crate::core::value::{LogicalValue, ValueMap};

use super::active_fields;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub field: FieldDef,
    pub value: LogicalValue,
}

/// Decode every active field fully covered by `bytes`, which must start at
/// `IMAGE_START`. Fields past the end of the image are left out.
pub fn decode_image(bytes: &[u8], tag_type: TagType) -> Vec<DecodedField> {
    active_fields(tag_type)
        .into_iter()
        .filter_map(|field| {
            let offset = field.address.checked_sub(IMAGE_START)? as usize;
            let value = decode_field(&field, bytes.get(offset..)?)?;
            Some(DecodedField { field, value })
        })
        .collect()
}

pub fn to_value_map(decoded: &[DecodedField]) -> ValueMap {
    let mut map = ValueMap::new();
    for entry in decoded {
        map.set(entry.field.key, entry.value.clone());
    }
    map
}

pub fn to_json(decoded: &[DecodedField]) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for entry in decoded {
        let value = match &entry.value {
            LogicalValue::Unset => serde_json::Value::Null,
            LogicalValue::Text(text) => serde_json::Value::String(text.clone()),
            LogicalValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        };
        object.insert(entry.field.key.to_string(), value);
    }
    serde_json::Value::Object(object)
}
