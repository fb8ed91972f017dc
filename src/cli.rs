// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::env;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::core::error::{TagError, TagErrorKind};
use crate::core::tag::TagType;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LONG_ABOUT: &str = "Build OpenTag3D memory images for NTAG213/215/216 NFC tags.

Field values come from JSON files (-i), KEY=VALUE pairs (-s) and explicit
unset markers (-u), applied in that order. A JSON value of null marks a field
as unknown; its bytes are written as FF.

Outputs are opt-in: -b/--bin, -j/--json-map and -c/--csv-map. When none is
given, all three are written with their suggested names. Output files are
written even when diagnostics are reported; the exit status is non-zero if any
error diagnostic was raised.";

#[derive(Parser, Debug)]
#[command(
    name = "opentag3d",
    version = VERSION,
    about = "OpenTag3D NFC tag image builder (NTAG213/215/216)",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        short = 't',
        long = "tag",
        value_name = "TYPE",
        long_help = "Tag type: NTAG213, NTAG215 or NTAG216. NTAG213 only carries core fields. Defaults to NTAG213."
    )]
    pub tag: Option<String>,
    #[arg(
        short = 'i',
        long = "input",
        value_name = "FILE",
        action = ArgAction::Append,
        long_help = "Read field values from a JSON object (repeatable; later files override earlier ones)."
    )]
    pub inputs: Vec<PathBuf>,
    #[arg(
        short = 's',
        long = "set",
        value_name = "KEY=VALUE",
        action = ArgAction::Append,
        long_help = "Set one field value (repeatable). Plain decimal numbers are read as numbers."
    )]
    pub assignments: Vec<String>,
    #[arg(
        short = 'u',
        long = "unset",
        value_name = "KEY",
        action = ArgAction::Append,
        long_help = "Mark a field as unknown; its bytes are filled with FF (repeatable)."
    )]
    pub unset_keys: Vec<String>,
    #[arg(
        long = "sample",
        action = ArgAction::SetTrue,
        long_help = "Start from the sample spool values before applying inputs."
    )]
    pub sample: bool,
    #[arg(
        short = 'o',
        long = "out-dir",
        value_name = "DIR",
        long_help = "Directory for output files with relative or suggested names."
    )]
    pub out_dir: Option<PathBuf>,
    #[arg(
        short = 'b',
        long = "bin",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Write the binary image. FILE is optional; when omitted, opentag3d_<TYPE>_0x10-0x<HIGH>.bin is used."
    )]
    pub bin_name: Option<String>,
    #[arg(
        short = 'j',
        long = "json-map",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Write the JSON address map. FILE is optional; when omitted, opentag3d_<TYPE>_map.json is used."
    )]
    pub json_name: Option<String>,
    #[arg(
        short = 'c',
        long = "csv-map",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Write the CSV address map. FILE is optional; when omitted, opentag3d_<TYPE>_map.csv is used."
    )]
    pub csv_name: Option<String>,
    #[arg(
        long = "hexdump",
        action = ArgAction::SetTrue,
        long_help = "Print a hex preview of the image (16 bytes per row) to stdout."
    )]
    pub hexdump: bool,
    #[arg(
        long = "decode",
        value_name = "FILE",
        conflicts_with_all = ["inputs", "assignments", "unset_keys", "sample", "bin_name", "json_name", "csv_name"],
        long_help = "Decode an existing image (starting at 0x10) and print its field values."
    )]
    pub decode: Option<PathBuf>,
    #[arg(
        long = "print-catalog",
        action = ArgAction::SetTrue,
        long_help = "Print the field catalog and exit."
    )]
    pub print_catalog: bool,
    #[arg(
        long = "format",
        value_enum,
        default_value_t = OutputFormat::Text,
        long_help = "Select output format for diagnostics, --decode and --print-catalog."
    )]
    pub format: OutputFormat,
    #[arg(
        short = 'q',
        long = "quiet",
        action = ArgAction::SetTrue,
        long_help = "Suppress the summary line and diagnostics for clean runs."
    )]
    pub quiet: bool,
    #[arg(
        short = 'E',
        long = "error",
        value_name = "FILE",
        long_help = "Write diagnostics to FILE instead of stderr."
    )]
    pub error_file: Option<PathBuf>,
    #[arg(
        long = "error-append",
        action = ArgAction::SetTrue,
        requires = "error_file",
        long_help = "Append diagnostics to --error FILE instead of truncating it."
    )]
    pub error_append: bool,
    #[arg(
        long = "no-error",
        action = ArgAction::SetTrue,
        conflicts_with_all = ["error_file", "error_append"],
        long_help = "Disable all diagnostic output routing."
    )]
    pub no_error: bool,
    #[arg(
        short = 'w',
        long = "no-warn",
        action = ArgAction::SetTrue,
        conflicts_with = "warn_error",
        long_help = "Suppress warning diagnostics."
    )]
    pub no_warn: bool,
    #[arg(
        long = "Werror",
        action = ArgAction::SetTrue,
        long_help = "Treat warnings as errors (non-zero exit status)."
    )]
    pub warn_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Bin,
    JsonMap,
    CsvMap,
}

/// An output the run should write. `name` is `None` for the suggested name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub kind: ArtifactKind,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticsSinkConfig {
    Disabled,
    Stderr,
    File { path: PathBuf, append: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarningPolicy {
    pub emit_warnings: bool,
    pub warnings_as_errors: bool,
}

/// Where field values come from, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSources {
    pub sample: bool,
    pub inputs: Vec<PathBuf>,
    pub assignments: Vec<String>,
    pub unset_keys: Vec<String>,
}

/// Validated CLI configuration.
#[derive(Debug)]
pub struct CliConfig {
    pub tag_type: TagType,
    pub sources: ValueSources,
    pub out_dir: Option<PathBuf>,
    pub artifacts: Vec<ArtifactSpec>,
    pub hexdump: bool,
    pub decode_path: Option<PathBuf>,
    pub print_catalog: bool,
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub diagnostics_sink: DiagnosticsSinkConfig,
    pub warning_policy: WarningPolicy,
}

fn cli_error(message: String) -> TagError {
    TagError::new(TagErrorKind::Cli, &message, None)
}

fn parse_env_bool(var_name: &str) -> Result<Option<bool>, TagError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(None);
    };
    let value = raw.to_string_lossy().trim().to_ascii_lowercase();
    let parsed = match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        "" => None,
        _ => {
            return Err(cli_error(format!(
                "Invalid boolean value for {var_name}: {value}"
            )))
        }
    };
    Ok(parsed)
}

fn parse_env_path(var_name: &str) -> Result<Option<PathBuf>, TagError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(None);
    };
    let value = raw.to_string_lossy().trim().to_string();
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(PathBuf::from(value)))
}

fn parse_env_string(var_name: &str) -> Result<Option<String>, TagError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(None);
    };
    let value = raw.to_string_lossy().trim().to_string();
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(value))
}

fn parse_tag_type(raw: &str, source: &str) -> Result<TagType, TagError> {
    TagType::parse(raw).ok_or_else(|| {
        cli_error(format!(
            "Unknown tag type from {source}: {raw} (expected NTAG213, NTAG215 or NTAG216)"
        ))
    })
}

/// Validate CLI arguments and environment overrides. Explicit flags win over
/// the environment.
pub fn validate_cli(cli: &Cli) -> Result<CliConfig, TagError> {
    let env_tag = parse_env_string("OPENTAG3D_TAG_TYPE")?;
    let env_out_dir = parse_env_path("OPENTAG3D_OUT_DIR")?;
    let env_quiet = parse_env_bool("OPENTAG3D_QUIET")?;
    let env_no_warn = parse_env_bool("OPENTAG3D_NO_WARN")?;
    let env_warn_error = parse_env_bool("OPENTAG3D_WERROR")?;
    let env_error_file = parse_env_path("OPENTAG3D_ERROR_FILE")?;
    let env_error_append = parse_env_bool("OPENTAG3D_ERROR_APPEND")?;
    let env_no_error = parse_env_bool("OPENTAG3D_NO_ERROR")?;

    let tag_type = match (&cli.tag, &env_tag) {
        (Some(raw), _) => parse_tag_type(raw, "--tag")?,
        (None, Some(raw)) => parse_tag_type(raw, "OPENTAG3D_TAG_TYPE")?,
        (None, None) => TagType::default(),
    };

    let quiet = cli.quiet || env_quiet.unwrap_or(false);

    let warn_error = if cli.warn_error {
        true
    } else if cli.no_warn {
        false
    } else {
        env_warn_error.unwrap_or(false)
    };
    let no_warn = if cli.no_warn {
        true
    } else if warn_error {
        false
    } else {
        env_no_warn.unwrap_or(false)
    };

    let diagnostics_sink = if cli.no_error {
        DiagnosticsSinkConfig::Disabled
    } else if let Some(path) = &cli.error_file {
        DiagnosticsSinkConfig::File {
            path: path.clone(),
            append: cli.error_append,
        }
    } else if env_no_error.unwrap_or(false) {
        DiagnosticsSinkConfig::Disabled
    } else if let Some(path) = env_error_file {
        DiagnosticsSinkConfig::File {
            path,
            append: env_error_append.unwrap_or(false),
        }
    } else {
        DiagnosticsSinkConfig::Stderr
    };

    let mut artifacts = Vec::new();
    for (kind, name) in [
        (ArtifactKind::Bin, &cli.bin_name),
        (ArtifactKind::JsonMap, &cli.json_name),
        (ArtifactKind::CsvMap, &cli.csv_name),
    ] {
        if let Some(name) = name {
            let name = name.trim();
            artifacts.push(ArtifactSpec {
                kind,
                name: (!name.is_empty()).then(|| name.to_string()),
            });
        }
    }
    let only_inspecting = cli.hexdump || cli.decode.is_some() || cli.print_catalog;
    if artifacts.is_empty() && !only_inspecting {
        artifacts = [ArtifactKind::Bin, ArtifactKind::JsonMap, ArtifactKind::CsvMap]
            .into_iter()
            .map(|kind| ArtifactSpec { kind, name: None })
            .collect();
    }

    for assignment in &cli.assignments {
        if !assignment.contains('=') {
            return Err(cli_error(format!(
                "Invalid --set value (expected KEY=VALUE): {assignment}"
            )));
        }
    }

    Ok(CliConfig {
        tag_type,
        sources: ValueSources {
            sample: cli.sample,
            inputs: cli.inputs.clone(),
            assignments: cli.assignments.clone(),
            unset_keys: cli.unset_keys.clone(),
        },
        out_dir: cli.out_dir.clone().or(env_out_dir),
        artifacts,
        hexdump: cli.hexdump,
        decode_path: cli.decode.clone(),
        print_catalog: cli.print_catalog,
        output_format: cli.format,
        quiet,
        diagnostics_sink,
        warning_policy: WarningPolicy {
            emit_warnings: !no_warn,
            warnings_as_errors: warn_error,
        },
    })
}
