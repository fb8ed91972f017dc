// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for opentag3d.

use std::fs::OpenOptions;
use std::io::{self, Write};

use clap::Parser;
use serde_json::json;

use opentag3d::cli::{validate_cli, Cli, CliConfig, DiagnosticsSinkConfig, OutputFormat};
use opentag3d::core::catalog::{all_fields, validate_catalog};
use opentag3d::core::error::{Diagnostic, Severity};
use opentag3d::encoder::decode;
use opentag3d::encoder::report::{hex_preview, span_summary};
use opentag3d::output::{
    catalog_report, catalog_report_json, decode_file, decoded_report, run_with_config,
};

struct DiagnosticsSink {
    writer: Option<Box<dyn Write>>,
}

impl DiagnosticsSink {
    fn from_config(config: &DiagnosticsSinkConfig) -> io::Result<Self> {
        match config {
            DiagnosticsSinkConfig::Disabled => Ok(Self { writer: None }),
            DiagnosticsSinkConfig::Stderr => Ok(Self {
                writer: Some(Box::new(io::stderr())),
            }),
            DiagnosticsSinkConfig::File { path, append } => {
                let mut opts = OpenOptions::new();
                opts.create(true).write(true);
                if *append {
                    opts.append(true);
                } else {
                    opts.truncate(true);
                }
                let file = opts.open(path)?;
                Ok(Self {
                    writer: Some(Box::new(file)),
                })
            }
        }
    }

    fn emit_line(&mut self, line: &str) {
        if let Some(writer) = &mut self.writer {
            let _ = writeln!(writer, "{line}");
        }
    }

    fn emit_diagnostics(&mut self, diagnostics: &[&Diagnostic], format: OutputFormat) {
        for diag in diagnostics {
            self.emit_line(&format_diagnostic_line(diag, format));
        }
    }
}

fn format_diagnostic_line(diag: &Diagnostic, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        diag.to_json().to_string()
    } else {
        let sev = match diag.severity() {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        match diag.field() {
            Some(field) => format!("{sev} [{}] {field}: {}", diag.code(), diag.message()),
            None => format!("{sev} [{}] {}", diag.code(), diag.message()),
        }
    }
}

fn fail(sink: &mut DiagnosticsSink, format: OutputFormat, message: &str) -> ! {
    if format == OutputFormat::Json {
        sink.emit_line(&json!({ "severity": "error", "message": message }).to_string());
    } else {
        sink.emit_line(&format!("ERROR: {message}"));
    }
    std::process::exit(1);
}

fn run_decode(config: &CliConfig, sink: &mut DiagnosticsSink) {
    let Some(path) = config.decode_path.as_deref() else {
        return;
    };
    let decoded = match decode_file(path, config) {
        Ok(decoded) => decoded,
        Err(err) => fail(sink, config.output_format, err.message()),
    };
    if config.output_format == OutputFormat::Json {
        println!("{}", decode::to_json(&decoded));
    } else {
        println!("{}", decoded_report(&decoded));
    }
}

fn main() {
    let cli = Cli::parse();
    let issues = validate_catalog(all_fields());
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("catalog: {issue}");
        }
        std::process::exit(1);
    }
    if cli.print_catalog {
        if cli.format == OutputFormat::Json {
            println!("{}", catalog_report_json());
        } else {
            println!("{}", catalog_report());
        }
        return;
    }
    let cli_config = match validate_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let mut sink = match DiagnosticsSink::from_config(&cli_config.diagnostics_sink) {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!("Failed to open diagnostics sink: {err}");
            std::process::exit(1);
        }
    };

    if cli_config.decode_path.is_some() {
        run_decode(&cli_config, &mut sink);
        return;
    }

    let report = match run_with_config(&cli_config) {
        Ok(report) => report,
        Err(err) => fail(&mut sink, cli_config.output_format, err.message()),
    };
    let result = &report.result;

    if cli_config.hexdump {
        for row in hex_preview(&result.image) {
            println!("{row}");
        }
    }

    let policy = cli_config.warning_policy;
    let shown: Vec<&Diagnostic> = result
        .diagnostics
        .iter()
        .filter(|diag| policy.emit_warnings || diag.severity() != Severity::Warning)
        .collect();
    let failed = result.has_errors() || (policy.warnings_as_errors && result.has_warnings());

    if !cli_config.quiet || failed {
        sink.emit_diagnostics(&shown, cli_config.output_format);
    }
    if !cli_config.quiet && cli_config.output_format == OutputFormat::Text {
        sink.emit_line(&span_summary(&result.image));
        for path in &report.written {
            sink.emit_line(&format!("Wrote {}", path.display()));
        }
    }
    if failed {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentag3d::core::error::DiagnosticKind;

    #[test]
    fn format_diagnostic_line_json_has_expected_keys_with_nulls() {
        let diag = Diagnostic::new(DiagnosticKind::Capacity, "too big");
        let line = format_diagnostic_line(&diag, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(value["code"], "otg301");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["message"], "too big");
        assert!(value["field"].is_null());
        assert!(value["address"].is_null());
    }

    #[test]
    fn format_diagnostic_line_text_names_the_field() {
        let diag = Diagnostic::new(DiagnosticKind::ScaledOutOfRange, "Diameter clamped")
            .with_field("diameter");
        assert_eq!(
            format_diagnostic_line(&diag, OutputFormat::Text),
            "WARNING [otg102] diameter: Diameter clamped"
        );
    }
}
