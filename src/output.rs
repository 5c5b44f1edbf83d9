//! Output formatting and persistence for GPA reports.
//!
//! Supports JSON and YAML, either as strings for display or written to a
//! file whose extension picks the format.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{GpaError, Result};

/// Structured text formats a report can be rendered as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    #[default]
    Yaml,
}

impl ReportFormat {
    /// Picks a format from a file extension: `.json`, `.yaml` or `.yml`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match ext {
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            other => Err(GpaError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn render<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            ReportFormat::Json => to_json(value),
            ReportFormat::Yaml => to_yaml(value),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            other => Err(format!("expected json or yaml, got {other:?}")),
        }
    }
}

/// Pretty-printed JSON with four-space indentation.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    // serde_json only ever emits UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

/// Writes `value` to `path`, choosing JSON or YAML from the extension.
///
/// Creates or truncates the file.
pub fn write_report<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let format = ReportFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "Writing GPA report");

    let rendered = format.render(value)?;
    let mut file = File::create(path)?;
    file.write_all(rendered.as_bytes())?;
    if !rendered.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    file.flush()?;

    info!(path = %path.display(), "GPA report created/updated");
    Ok(())
}
