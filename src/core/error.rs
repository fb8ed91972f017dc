// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types and encode diagnostics.

use std::fmt;

use serde_json::json;

use super::tag::format_addr;

/// Categories of hard errors raised outside the encoder itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagErrorKind {
    Catalog,
    Cli,
    Input,
    Io,
}

/// A hard error with a kind and message.
///
/// Encoding never produces one of these; they come from reading input,
/// validating arguments and writing artifacts.
#[derive(Debug, Clone)]
pub struct TagError {
    kind: TagErrorKind,
    message: String,
}

impl TagError {
    pub fn new(kind: TagErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> TagErrorKind {
        self.kind
    }
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TagError {}

fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(p) if !p.is_empty() => format!("{msg}: {p}"),
        _ => msg.to_string(),
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// What an encode diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    NonAscii,
    ScaledOutOfRange,
    ColorTokenCount,
    MalformedDate,
    InvalidDate,
    MalformedTime,
    Overlap,
    Capacity,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::NonAscii => "otg101",
            DiagnosticKind::ScaledOutOfRange => "otg102",
            DiagnosticKind::ColorTokenCount => "otg103",
            DiagnosticKind::MalformedDate => "otg104",
            DiagnosticKind::InvalidDate => "otg105",
            DiagnosticKind::MalformedTime => "otg106",
            DiagnosticKind::Overlap => "otg201",
            DiagnosticKind::Capacity => "otg301",
        }
    }

    /// Out-of-range scaled values are still written (clamped), so they only
    /// warn. Everything else means bytes were dropped or are wrong.
    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticKind::ScaledOutOfRange => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A non-fatal issue found while building an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    severity: Severity,
    message: String,
    field: Option<&'static str>,
    address: Option<u32>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            field: None,
            address: None,
        }
    }

    pub fn with_field(mut self, key: &'static str) -> Self {
        self.field = Some(key);
        self
    }

    pub fn with_address(mut self, address: u32) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    pub fn address(&self) -> Option<u32> {
        self.address
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "code": self.code(),
            "severity": self.severity.as_str(),
            "message": self.message,
            "field": self.field,
            "address": self.address.map(format_addr),
        })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
