// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Value loading, artifact emission and the printable reports behind the CLI.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::cli::{ArtifactKind, ArtifactSpec, CliConfig, ValueSources};
use crate::core::catalog;
use crate::core::error::{TagError, TagErrorKind};
use crate::core::tag::format_addr;
use crate::core::value::ValueMap;
use crate::encoder::decode::{decode_image, DecodedField};
use crate::encoder::report::{build_map, bin_file_name, csv_file_name, json_file_name};
use crate::encoder::{encode, EncodeResult};

fn io_error(err: &std::io::Error, path: &Path) -> TagError {
    let path_text = path.to_string_lossy().to_string();
    TagError::new(TagErrorKind::Io, &err.to_string(), Some(&path_text))
}

/// Build the value map: sample defaults, then JSON files, then `KEY=VALUE`
/// assignments, then unset markers. Keys outside the catalog are rejected.
pub fn load_values(sources: &ValueSources) -> Result<ValueMap, TagError> {
    let mut values = if sources.sample {
        ValueMap::sample()
    } else {
        ValueMap::new()
    };
    for path in &sources.inputs {
        let text = fs::read_to_string(path).map_err(|err| io_error(&err, path))?;
        let parsed = ValueMap::from_json_str(&text).map_err(|err| {
            let path_text = path.to_string_lossy().to_string();
            TagError::new(TagErrorKind::Input, err.message(), Some(&path_text))
        })?;
        values.merge(parsed);
    }
    for assignment in &sources.assignments {
        values.parse_assignment(assignment)?;
    }
    for key in &sources.unset_keys {
        values.unset(key.trim());
    }

    let unknown = values.unknown_keys();
    if !unknown.is_empty() {
        return Err(TagError::new(
            TagErrorKind::Input,
            "Unknown field key",
            Some(&unknown.join(", ")),
        ));
    }
    Ok(values)
}

fn resolve_output_path(name: &str, out_dir: Option<&PathBuf>) -> PathBuf {
    let raw_path = PathBuf::from(name);
    if raw_path.is_absolute() {
        raw_path
    } else if let Some(dir) = out_dir {
        dir.join(raw_path)
    } else {
        raw_path
    }
}

fn artifact_payload(kind: ArtifactKind, result: &EncodeResult) -> Result<Vec<u8>, TagError> {
    match kind {
        ArtifactKind::Bin => Ok(result.image.bytes().to_vec()),
        ArtifactKind::JsonMap => Ok(build_map(result).to_json()?.into_bytes()),
        ArtifactKind::CsvMap => Ok(build_map(result).to_csv().into_bytes()),
    }
}

fn suggested_name(kind: ArtifactKind, result: &EncodeResult) -> String {
    match kind {
        ArtifactKind::Bin => bin_file_name(result),
        ArtifactKind::JsonMap => json_file_name(result.tag_type),
        ArtifactKind::CsvMap => csv_file_name(result.tag_type),
    }
}

/// Write each requested artifact and return the paths written, in order.
pub fn write_artifacts(
    result: &EncodeResult,
    artifacts: &[ArtifactSpec],
    out_dir: Option<&PathBuf>,
) -> Result<Vec<PathBuf>, TagError> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let name = match &artifact.name {
            Some(name) => name.clone(),
            None => suggested_name(artifact.kind, result),
        };
        let payload = artifact_payload(artifact.kind, result)?;
        let output_path = resolve_output_path(&name, out_dir);
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| io_error(&err, &output_path))?;
            }
        }
        let mut file = File::create(&output_path).map_err(|err| io_error(&err, &output_path))?;
        file.write_all(&payload)
            .map_err(|err| io_error(&err, &output_path))?;
        written.push(output_path);
    }
    Ok(written)
}

/// Outcome of an encode run driven by the CLI.
#[derive(Debug)]
pub struct RunReport {
    pub result: EncodeResult,
    pub written: Vec<PathBuf>,
}

/// Load values, encode and write the configured artifacts.
pub fn run_with_config(config: &CliConfig) -> Result<RunReport, TagError> {
    let values = load_values(&config.sources)?;
    let result = encode(&values, config.tag_type);
    let written = write_artifacts(&result, &config.artifacts, config.out_dir.as_ref())?;
    Ok(RunReport { result, written })
}

/// Read an image file and decode its fields for the configured tag type.
pub fn decode_file(path: &Path, config: &CliConfig) -> Result<Vec<DecodedField>, TagError> {
    let bytes = fs::read(path).map_err(|err| io_error(&err, path))?;
    Ok(decode_image(&bytes, config.tag_type))
}

pub fn decoded_report(decoded: &[DecodedField]) -> String {
    let width = decoded
        .iter()
        .map(|entry| entry.field.key.len())
        .max()
        .unwrap_or(0);
    decoded
        .iter()
        .map(|entry| {
            let value = entry
                .value
                .to_text()
                .unwrap_or_else(|| "(unset)".to_string());
            format!(
                "{}  {:<width$}  {value}",
                format_addr(entry.field.address),
                entry.field.key
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn catalog_report() -> String {
    let mut lines = vec!["Address  Size  Region    Kind       Key                Label".to_string()];
    for field in catalog::all_fields() {
        lines.push(format!(
            "{:<7}  {:>4}  {:<8}  {:<9}  {:<17}  {}",
            format_addr(field.address),
            field.size,
            field.region.as_str(),
            field.kind.name(),
            field.key,
            field.label
        ));
    }
    lines.join("\n")
}

pub fn catalog_report_json() -> String {
    let fields: Vec<serde_json::Value> = catalog::all_fields()
        .iter()
        .map(|field| field.to_json())
        .collect();
    json!({ "fields": fields }).to_string()
}
