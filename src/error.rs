use crate::error_kind::ErrorKind;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path that caused the error (e.g., "data.mal_id", "batch.concurrency")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "catalog", "backend", "config")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the crate.
///
/// Per-item failures inside a batch run never surface as this type; they are
/// folded into `Failure` outcomes. `Error` is for whole-operation failures:
/// bad configuration, a list page that could not be fetched, a malformed file.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {message}{}", format_context(.context))]
    InvalidConfig {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Remote error: HTTP {status} ({kind}): {message}")]
    Remote {
        status: u16,
        kind: ErrorKind,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn invalid_config(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidConfig {
            message: msg.into(),
            context,
        }
    }

    pub fn validation(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn runtime(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Classify this error for per-item reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Remote { kind, .. } => *kind,
            Error::Transport(t) if t.is_timeout() => ErrorKind::Timeout,
            Error::Transport(_) | Error::Io(_) => ErrorKind::Network,
            Error::Validation { .. } | Error::Serialization(_) => ErrorKind::DetailUnavailable,
            Error::InvalidConfig { .. } | Error::Runtime { .. } | Error::Yaml(_) => {
                ErrorKind::Unknown
            }
        }
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::InvalidConfig { context, .. }
            | Error::Validation { context, .. }
            | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}
