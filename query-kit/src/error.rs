//! Error types for accessor calls and router construction
//!
//! Two families of errors exist:
//!
//! - [`QueryError`] is what fetch functions, middleware and the query client
//!   return while a call is running. The kit passes these through untouched.
//! - [`ConfigError`] is raised while definitions and routers are built and is
//!   never produced once an accessor exists.
//!
//! # Error Codes
//!
//! [`QueryErrorCode`] serializes to SCREAMING_SNAKE_CASE strings.
//!
//! The kit itself only raises `BadRequest`, `SerializationError` and
//! `Cancelled`. The remaining codes and their constructors are vocabulary for
//! fetch functions, middleware and query clients, so errors from every layer
//! share one shape and one classification.
//!
//! # Example
//! ```rust,ignore
//! use query_kit::{QueryError, QueryErrorCode};
//!
//! let error = QueryError::new(QueryErrorCode::NotFound, "User not found");
//! let error = QueryError::not_found("User not found"); // Convenience method
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Type-safe error codes for query and mutation calls.
///
/// Codes fall into client errors (similar to HTTP 4xx), server errors
/// (similar to HTTP 5xx) and kit-specific errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum QueryErrorCode {
    // Client errors (4xx equivalent)
    /// The variables or options were malformed
    BadRequest,
    /// Authentication is required
    Unauthorized,
    /// The authenticated user lacks permission
    Forbidden,
    /// The requested resource was not found
    NotFound,
    /// Input validation failed
    ValidationError,
    /// The request conflicts with current state
    Conflict,

    // Server errors (5xx equivalent)
    /// An unexpected internal error occurred
    InternalError,
    /// The requested functionality is not implemented
    NotImplemented,
    /// The remote service is temporarily unavailable
    ServiceUnavailable,

    // Kit-specific errors
    /// The call was cancelled through its abort signal
    Cancelled,
    /// The fetch or mutate function failed
    FetchError,
    /// A middleware rejected or failed the call
    MiddlewareError,
    /// JSON serialization/deserialization failed
    SerializationError,
}

impl QueryErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::InternalError => "INTERNAL_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Cancelled => "CANCELLED",
            Self::FetchError => "FETCH_ERROR",
            Self::MiddlewareError => "MIDDLEWARE_ERROR",
            Self::SerializationError => "SERIALIZATION_ERROR",
        }
    }

    /// Returns true if this is a client error (4xx equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::BadRequest
                | Self::Unauthorized
                | Self::Forbidden
                | Self::NotFound
                | Self::ValidationError
                | Self::Conflict
        )
    }

    /// Returns true if this is a server error (5xx equivalent).
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::InternalError | Self::NotImplemented | Self::ServiceUnavailable
        )
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned by a running query or mutation call.
///
/// # Example
/// ```rust,ignore
/// use query_kit::{QueryError, QueryErrorCode};
///
/// let error = QueryError::new(QueryErrorCode::NotFound, "User not found")
///     .with_details(serde_json::json!({"user_id": 123}))
///     .with_cause("profile endpoint returned 404");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct QueryError {
    /// Type-safe error code
    pub code: QueryErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (JSON value)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Optional cause for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl QueryError {
    /// Create a new error with code and message.
    pub fn new(code: QueryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    /// Add details to the error.
    #[must_use]
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Add a cause string for debugging.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns true if the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.code == QueryErrorCode::Cancelled
    }

    // Convenience constructors

    /// Create a NOT_FOUND error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::NotFound, message)
    }

    /// Create a BAD_REQUEST error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::BadRequest, message)
    }

    /// Create a VALIDATION_ERROR error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::ValidationError, message)
    }

    /// Create an UNAUTHORIZED error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::Unauthorized, message)
    }

    /// Create a FORBIDDEN error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::Forbidden, message)
    }

    /// Create an INTERNAL_ERROR error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::InternalError, message)
    }

    /// Create a CONFLICT error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::Conflict, message)
    }

    /// Create a CANCELLED error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::Cancelled, message)
    }

    /// Create a FETCH_ERROR error.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::FetchError, message)
    }

    /// Create a MIDDLEWARE_ERROR error.
    pub fn middleware(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::MiddlewareError, message)
    }

    /// Create a SERIALIZATION_ERROR error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::SerializationError, message)
    }

    /// Create a SERVICE_UNAVAILABLE error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::ServiceUnavailable, message)
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

/// Result type alias for query and mutation calls.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors detected while definitions and routers are built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The router scope or a standalone primary key was empty
    #[error("primary key cannot be empty")]
    EmptyPrimaryKey,

    /// A namespace segment was empty
    #[error("empty segment name under '{parent}'")]
    EmptySegment {
        /// Dotted path of the enclosing namespace
        parent: String,
    },

    /// A namespace segment contained a character outside `[A-Za-z0-9_-]`
    #[error("segment '{segment}' contains invalid character '{invalid}'")]
    InvalidSegment {
        /// The rejected segment
        segment: String,
        /// First offending character
        invalid: char,
    },

    /// Two entries of one namespace share a name
    #[error("duplicate entry '{name}' under '{parent}'")]
    DuplicateEntry {
        /// Dotted path of the enclosing namespace
        parent: String,
        /// The repeated name
        name: String,
    },

    /// The tree nests deeper than the configured limit
    #[error("namespace '{path}' exceeds maximum depth {max_depth}")]
    TooDeep {
        /// Dotted path where the limit was hit
        path: String,
        /// Configured limit
        max_depth: usize,
    },

    /// An infinite query was declared without a next-page function
    #[error("infinite query '{path}' is missing get_next_page_param")]
    MissingNextPageParam {
        /// Dotted path (or primary key) of the definition
        path: String,
    },

    /// A definition option could not be serialized
    #[error("invalid option '{key}': {message}")]
    InvalidOption {
        /// Option name, e.g. `variables`
        key: String,
        /// Serializer message
        message: String,
    },

    /// The kit configuration failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for build-time operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
