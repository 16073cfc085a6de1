use chrono::{DateTime, Utc};
use clap::ValueEnum;
use console::style;
use serde::Serialize;

use crate::error::{CapError, Result, StructuredError};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable formatted output with colors (default)
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    #[must_use]
    pub fn from_args(json: bool, format: Option<Self>) -> Self {
        if json {
            Self::Json
        } else {
            format.unwrap_or_default()
        }
    }

    #[must_use]
    pub const fn is_machine_readable(&self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Envelope for every JSON payload written to stdout.
#[derive(Serialize)]
pub struct JsonResponse<T> {
    pub status: ResponseStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    Error(StructuredError),
    /// Some items succeeded, some failed.
    Partial { completed: usize, failed: usize },
}

impl<T> JsonResponse<T> {
    fn with_status(status: ResponseStatus, data: T) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            data,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

pub fn json_ok<T: Serialize>(data: T) -> JsonResponse<T> {
    JsonResponse::with_status(ResponseStatus::Ok, data)
}

/// `Ok` when nothing failed, `Partial` otherwise.
pub fn json_partial<T: Serialize>(data: T, completed: usize, failed: usize) -> JsonResponse<T> {
    let status = if failed == 0 {
        ResponseStatus::Ok
    } else {
        ResponseStatus::Partial { completed, failed }
    };
    JsonResponse::with_status(status, data)
}

pub fn json_error(err: &CapError) -> JsonResponse<serde_json::Value> {
    JsonResponse::with_status(
        ResponseStatus::Error(err.to_structured()),
        serde_json::Value::Null,
    )
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 18,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push("-".repeat(text.len().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        // Pad before styling so escape codes do not eat the width.
        let key = format!("{key:width$}", width = self.key_width);
        self.lines.push(format!("{} {value}", style(key).dim()));
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("- {text}"));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: HumanLayout) {
    println!("{}", layout.build());
}
