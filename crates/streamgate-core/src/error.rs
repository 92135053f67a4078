//! Error types module
//!
//! Every failure the gateway can report is a variant of `AppError`. Each variant
//! self-describes its HTTP presentation through `ErrorMetadata`, so handlers never
//! pick status codes themselves and the response body always carries a stable,
//! machine-readable code.
//!
//! The `From<sqlx::Error>` conversion is gated behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for refused requests
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "INVALID_SEGMENT_PATH")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid video identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid segment path: {0}")]
    InvalidSegmentPath(String),

    #[error("Invalid quality: {0}")]
    InvalidQuality(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream integrity error: {0}")]
    UpstreamIntegrity(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn invalid_identifier(id: impl Into<String>) -> Self {
        AppError::InvalidIdentifier(id.into())
    }

    pub fn invalid_segment_path(reason: impl Into<String>) -> Self {
        AppError::InvalidSegmentPath(reason.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        AppError::Forbidden(reason.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn upstream_integrity(detail: impl Into<String>) -> Self {
        AppError::UpstreamIntegrity(detail.into())
    }

    pub fn upstream_unavailable(detail: impl Into<String>) -> Self {
        AppError::UpstreamUnavailable(detail.into())
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Catalog(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidIdentifier(_) => (
            400,
            "INVALID_IDENTIFIER",
            false,
            Some("Check the video identifier format"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidSegmentPath(_) => (
            400,
            "INVALID_SEGMENT_PATH",
            false,
            Some("Request segments by the names listed in the playlist"),
            false,
            LogLevel::Warn,
        ),
        AppError::InvalidQuality(_) => (
            400,
            "INVALID_QUALITY",
            false,
            Some("Request a quality listed in the master playlist"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            Some("Verify you have access to this video"),
            false,
            LogLevel::Warn,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the video and rendition exist"),
            false,
            LogLevel::Debug,
        ),
        AppError::UpstreamIntegrity(_) => (
            500,
            "UPSTREAM_INTEGRITY_ERROR",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        AppError::UpstreamUnavailable(_) => (
            502,
            "UPSTREAM_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Catalog(_) => (
            500,
            "CATALOG_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidIdentifier(_) => "InvalidIdentifier",
            AppError::InvalidSegmentPath(_) => "InvalidSegmentPath",
            AppError::InvalidQuality(_) => "InvalidQuality",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::UpstreamIntegrity(_) => "UpstreamIntegrity",
            AppError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            AppError::Catalog(_) => "Catalog",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidIdentifier(_) => "Invalid video identifier".to_string(),
            AppError::InvalidSegmentPath(_) => "Invalid segment path".to_string(),
            AppError::InvalidQuality(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Forbidden(_) => "Access to this video is not allowed".to_string(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::UpstreamIntegrity(_) => "Stored media is unreadable".to_string(),
            AppError::UpstreamUnavailable(_) => "Failed to access storage".to_string(),
            AppError::Catalog(_) => "Failed to access video catalog".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
