use std::fmt::Display;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;
use toroid_core::errors::ErrorInfo;
use toroid_core::ToroidError;

/// Tab-separated results table with a header row.
pub struct TsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    columns: usize,
    rows: usize,
}

impl TsvSink {
    pub fn create(path: &Path, header: &[&str]) -> Result<Self, ToroidError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| sink_error(path, err))?;
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .map_err(|err| sink_error(path, err))?;
        writer
            .write_record(header)
            .map_err(|err| sink_error(path, err))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            columns: header.len(),
            rows: 0,
        })
    }

    pub fn write_row(&mut self, fields: &[String]) -> Result<(), ToroidError> {
        if fields.len() != self.columns {
            return Err(ToroidError::Io(
                ErrorInfo::new("sink-write", "row width does not match the header")
                    .with_context("path", self.path.display().to_string())
                    .with_context("expected", self.columns.to_string())
                    .with_context("found", fields.len().to_string()),
            ));
        }
        self.writer
            .write_record(fields)
            .map_err(|err| sink_error(&self.path, err))?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes the table and returns the number of data rows written.
    pub fn finish(mut self) -> Result<usize, ToroidError> {
        self.writer
            .flush()
            .map_err(|err| sink_error(&self.path, err))?;
        tracing::debug!(path = %self.path.display(), rows = self.rows, "table written");
        Ok(self.rows)
    }
}

/// Renders an optional value, `None` when absent.
pub fn optional<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_string(), |value| value.to_string())
}

/// Writes `value` as pretty JSON, creating parent directories.
pub fn write_summary<T: Serialize>(path: &Path, value: &T) -> Result<(), ToroidError> {
    let summary_error = |message: String| {
        ToroidError::Io(
            ErrorInfo::new("summary-write", message)
                .with_context("path", path.display().to_string()),
        )
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| summary_error(err.to_string()))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|err| summary_error(err.to_string()))?;
    fs::write(path, json).map_err(|err| summary_error(err.to_string()))
}

fn sink_error(path: &Path, err: impl Display) -> ToroidError {
    ToroidError::Io(
        ErrorInfo::new("sink-write", err.to_string())
            .with_context("path", path.display().to_string()),
    )
}
