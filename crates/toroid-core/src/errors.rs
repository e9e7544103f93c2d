//! Structured error types shared across toroid crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`ToroidError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (sizes, parameters, paths).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the toroid engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ToroidError {
    /// Lattice construction and initial-condition errors.
    #[error("lattice error: {0}")]
    Lattice(ErrorInfo),
    /// Update-rule failures raised while sweeping.
    #[error("dynamics error: {0}")]
    Dynamics(ErrorInfo),
    /// Sample accumulation and bootstrap errors.
    #[error("statistics error: {0}")]
    Statistics(ErrorInfo),
    /// Invalid run parameters or unreadable configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Filesystem and serialization errors raised by result sinks.
    #[error("io error: {0}")]
    Io(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        for (key, value) in &self.context {
            write!(f, "; {key}={value}")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl ToroidError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ToroidError::Lattice(info)
            | ToroidError::Dynamics(info)
            | ToroidError::Statistics(info)
            | ToroidError::Config(info)
            | ToroidError::Io(info) => info,
        }
    }

    /// Returns the stable machine readable code of the error.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Side length of zero.
    pub fn invalid_size(size: usize) -> Self {
        ToroidError::Lattice(
            ErrorInfo::new("invalid-size", "lattice side length must be positive")
                .with_context("size", size.to_string()),
        )
    }

    /// Row-major cell buffer that does not hold `size * size` cells.
    pub fn invalid_cells(size: usize, cells: usize) -> Self {
        ToroidError::Lattice(
            ErrorInfo::new("invalid-cells", "cell buffer length must equal size squared")
                .with_context("size", size.to_string())
                .with_context("cells", cells.to_string())
                .with_context("expected", (size * size).to_string()),
        )
    }
}
