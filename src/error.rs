//! Error taxonomy shared by every lifecycle operation, and the diagnostics
//! rendered to the operator.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid ID {id:?}, expected {expected}")]
    InvalidFormat { id: String, expected: String },

    #[error("{field} is not a valid UUID: {value:?}")]
    InvalidUuid {
        field: String,
        position: Option<usize>,
        value: String,
    },

    #[error("invalid time {value:?}, expected {expected}")]
    InvalidTimeFormat { value: String, expected: &'static str },

    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("remote API error: {0}")]
    RemoteApi(ClientError),

    #[error("resource not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ProviderError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            ProviderError::InvalidFormat { .. } => "INVALID_FORMAT",
            ProviderError::InvalidUuid { .. } => "INVALID_UUID",
            ProviderError::InvalidTimeFormat { .. } => "INVALID_TIME_FORMAT",
            ProviderError::UnknownTimezone(_) => "UNKNOWN_TIMEZONE",
            ProviderError::Validation { .. } => "VALIDATION_ERROR",
            ProviderError::RemoteApi(_) => "REMOTE_API_ERROR",
            ProviderError::NotFound(_) => "NOT_FOUND",
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            ProviderError::InvalidFormat { .. } => "Invalid import ID",
            ProviderError::InvalidUuid { .. } => "Invalid UUID",
            ProviderError::InvalidTimeFormat { .. } => "Invalid time",
            ProviderError::UnknownTimezone(_) => "Unknown timezone",
            ProviderError::Validation { .. } => "Invalid configuration",
            ProviderError::RemoteApi(_) => "Zenduty API request failed",
            ProviderError::NotFound(_) => "Resource not found",
        }
    }
}

/// 404s are recognised by status, or by the reason phrase when the transport
/// only hands back an opaque message.
impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        if err.is_not_found() {
            ProviderError::NotFound(err.to_string())
        } else {
            ProviderError::RemoteApi(err)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl From<&ProviderError> for Diagnostic {
    fn from(err: &ProviderError) -> Self {
        Diagnostic::error(err.summary(), err.to_string())
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        Diagnostic::from(&err)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}: {}", level, self.summary, self.detail)
    }
}

/// Ordered diagnostics returned by a lifecycle callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: impl Into<Diagnostic>) {
        self.0.push(diagnostic.into());
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl From<ProviderError> for Diagnostics {
    fn from(err: ProviderError) -> Self {
        Diagnostics(vec![err.into()])
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
