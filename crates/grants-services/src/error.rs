//! Error types for grants-ui services
//!
//! [`AppError`] is the error every layer hands upward. It carries:
//! - a [`ErrorKind`] that decides the HTTP status
//! - a stable machine `code`
//! - free-form `context` for logs
//! - an `already_logged` flag so an error is logged once however many
//!   layers rethrow it
//!
//! Backend clients raise [`BackendError`] internally and convert it.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Classification of application errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller is not authenticated or not allowed
    Auth,
    /// Identity provider configuration is unusable
    OidcConfig,
    /// Request payload failed validation
    PayloadValidation,
    /// Token missing, expired or malformed
    Token,
    /// Backend call failed
    Backend,
    /// Form, page or resource not found
    NotFound,
    /// Route exists but not for this method
    MethodNotAllowed,
    /// Configuration could not be loaded
    Config,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// HTTP status for this kind
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            Self::Auth | Self::Token => 401,
            Self::PayloadValidation => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::Backend => 502,
            Self::OidcConfig | Self::Config | Self::Internal => 500,
        }
    }

    /// Lower-case name used in logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::OidcConfig => "oidc_config",
            Self::PayloadValidation => "payload_validation",
            Self::Token => "token",
            Self::Backend => "backend",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

/// Application error with code, context and log-once tracking
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    code: String,
    message: String,
    context: BTreeMap<String, Value>,
    already_logged: AtomicBool,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create error of a kind
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            already_logged: AtomicBool::new(false),
            source: None,
        }
    }

    /// Authentication failure
    pub fn auth(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, code, message)
    }

    /// Identity provider configuration failure
    pub fn oidc_config(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OidcConfig, code, message)
    }

    /// Payload validation failure
    pub fn payload_validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadValidation, code, message)
    }

    /// Token failure
    pub fn token(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Token, code, message)
    }

    /// Backend failure
    pub fn backend(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Backend, code, message)
    }

    /// Missing resource
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, "NOT_FOUND", message)
    }

    /// Method not supported on a route
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, "METHOD_NOT_ALLOWED", message)
    }

    /// Configuration failure
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, "CONFIG_INVALID", message)
    }

    /// Unclassified failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, "INTERNAL_ERROR", message)
    }

    /// Add a context entry
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Error kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Machine-readable code
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Context entries
    #[inline]
    #[must_use]
    pub fn context(&self) -> &BTreeMap<String, Value> {
        &self.context
    }

    /// HTTP status this error maps to
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Whether the error has been logged
    #[inline]
    #[must_use]
    pub fn already_logged(&self) -> bool {
        self.already_logged.load(Ordering::Acquire)
    }

    /// Log the error unless it has been logged before
    ///
    /// Returns `true` when this call emitted the event.
    pub fn log_once(&self) -> bool {
        if self.already_logged.swap(true, Ordering::AcqRel) {
            return false;
        }

        let context = Value::Object(self.context.clone().into_iter().collect());
        let cause = self.source.as_ref().map(ToString::to_string);
        match self.kind {
            ErrorKind::NotFound
            | ErrorKind::MethodNotAllowed
            | ErrorKind::PayloadValidation
            | ErrorKind::Auth
            | ErrorKind::Token => {
                tracing::warn!(
                    kind = self.kind.as_str(),
                    code = %self.code,
                    context = %context,
                    cause = ?cause,
                    "{}",
                    self.message
                );
            }
            _ => {
                tracing::error!(
                    kind = self.kind.as_str(),
                    code = %self.code,
                    context = %context,
                    cause = ?cause,
                    "{}",
                    self.message
                );
            }
        }
        true
    }
}

/// Failures talking to a backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Request could not be sent or timed out
    #[error("request to {endpoint} failed: {source}")]
    Request {
        /// Endpoint URL
        endpoint: String,
        /// Transport error
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered with a non-success status
    #[error("{endpoint} responded with status {status}")]
    Status {
        /// Endpoint URL
        endpoint: String,
        /// HTTP status
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Response body could not be decoded
    #[error("invalid response from {endpoint}: {source}")]
    Decode {
        /// Endpoint URL
        endpoint: String,
        /// Transport error
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client could not be built
    #[error("http client error: {0}")]
    Client(#[source] reqwest::Error),

    /// Endpoint URL could not be built from the base URL
    #[error("cannot build url from {base_url}: {reason}")]
    Url {
        /// Configured base URL
        base_url: String,
        /// Parser message
        reason: String,
    },
}

impl BackendError {
    /// Machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Request { .. } => "BACKEND_REQUEST_FAILED",
            Self::Status { .. } => "BACKEND_ERROR_STATUS",
            Self::Decode { .. } => "BACKEND_INVALID_RESPONSE",
            Self::Client(_) => "BACKEND_CLIENT_ERROR",
            Self::Url { .. } => "BACKEND_INVALID_URL",
        }
    }

    /// Status returned by the backend, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        let mut app = AppError::backend(err.code(), err.to_string());
        match &err {
            BackendError::Request { endpoint, .. } | BackendError::Decode { endpoint, .. } => {
                app = app.with_context("endpoint", endpoint.clone());
            }
            BackendError::Status {
                endpoint,
                status,
                body,
            } => {
                app = app
                    .with_context("endpoint", endpoint.clone())
                    .with_context("status", *status)
                    .with_context("body", body.clone());
            }
            BackendError::Url { base_url, .. } => {
                app = app.with_context("baseUrl", base_url.clone());
            }
            BackendError::Client(_) => {}
        }
        app.with_source(err)
    }
}

impl From<grants_state::StateError> for AppError {
    fn from(err: grants_state::StateError) -> Self {
        AppError::payload_validation("INVALID_ANSWER", err.to_string()).with_source(err)
    }
}

impl From<grants_config::ConfigError> for AppError {
    fn from(err: grants_config::ConfigError) -> Self {
        AppError::config(err.to_string()).with_source(err)
    }
}

/// Result alias for service operations
pub type AppResult<T> = Result<T, AppError>;
