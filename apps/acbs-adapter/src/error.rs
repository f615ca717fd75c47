//! ACBS error taxonomy.
//!
//! Every failed call into ACBS or its IdP ends as exactly one [`AcbsError`].
//! Business services match on [`AcbsError::kind`] to decide how the failure
//! surfaces at the API boundary.
//!
//! | Kind | Raised when | Boundary status |
//! |------|-------------|-----------------|
//! | `AuthenticationFailed` | Session or token handshake failed | 500 |
//! | `ResourceNotFound` | Body matched a "not found" known error | 404 |
//! | `BadRequest` | Write path, status 400, no known error matched | 400 |
//! | `Unexpected` | Write path, any non-400 failure | 500 |
//! | `Generic` | Read path, unclassified or transport failure | 500 |

use reqwest::StatusCode;
use serde_json::{Number, Value};
use thiserror::Error;

// =============================================================================
// Raw failures
// =============================================================================

/// Body of a non-2xx response, decoded the way the backend's JSON clients see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    /// Plain text, a JSON string literal, or an empty body.
    Text(String),
    /// Any other JSON value (object, array, number, boolean, null).
    Json(Value),
}

impl ErrorBody {
    /// Decode a raw response body.
    ///
    /// JSON string literals are unwrapped to their contents; anything that is
    /// not valid JSON is kept verbatim as text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::String(text)) => Self::Text(text),
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// The body as text, if it is a string body.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    /// Serialize the body for forwarding. Text is returned as-is, JSON is
    /// rendered compactly with its original key order, and whole-valued
    /// floats are written as integers (`1.0` becomes `1`).
    #[must_use]
    pub fn serialize(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => {
                let mut value = value.clone();
                normalize_numbers(&mut value);
                value.to_string()
            }
        }
    }
}

fn normalize_numbers(value: &mut Value) {
    match value {
        Value::Number(n) => {
            if let Some(i) = whole_float(n) {
                *n = Number::from(i);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_numbers),
        Value::Object(map) => map.values_mut().for_each(normalize_numbers),
        Value::Null | Value::Bool(_) | Value::String(_) => {}
    }
}

/// 2^63, the first float outside the `i64` range.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn whole_float(n: &Number) -> Option<i64> {
    let f = n.as_f64().filter(|_| n.is_f64())?;
    let whole = f.is_finite() && f.trunc() == f && (-I64_LIMIT..I64_LIMIT).contains(&f);
    whole.then_some(f as i64)
}

/// An unclassified failure from the HTTP layer.
#[derive(Debug, Clone, Error)]
pub enum RawError {
    /// The server answered with a non-2xx status.
    #[error("Request failed with status code {}", .status.as_u16())]
    Http {
        /// Response status.
        status: StatusCode,
        /// Decoded response body.
        body: ErrorBody,
    },

    /// No usable response: connection, TLS, timeout or body read failure.
    #[error("Request to ACBS failed: {message}")]
    Transport {
        /// Description of the underlying error.
        message: String,
        /// Whether the client's timeout elapsed.
        timeout: bool,
    },
}

impl RawError {
    /// Build an HTTP failure from a status and raw body text.
    #[must_use]
    pub fn http(status: StatusCode, raw_body: &str) -> Self {
        Self::Http {
            status,
            body: ErrorBody::parse(raw_body),
        }
    }

    /// Build a transport failure.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timeout: false,
        }
    }

    /// Status code of an HTTP failure.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }

    /// Body of an HTTP failure.
    #[must_use]
    pub const fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Http { body, .. } => Some(body),
            Self::Transport { .. } => None,
        }
    }

    /// Whether this is a transport timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { timeout: true, .. })
    }
}

impl From<reqwest::Error> for RawError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            timeout: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Classified failures
// =============================================================================

/// Discriminant of an [`AcbsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcbsErrorKind {
    /// Session or token handshake failure.
    AuthenticationFailed,
    /// A known "not found" error matched.
    ResourceNotFound,
    /// Unmatched 400 on a write path.
    BadRequest,
    /// Non-400 failure on a write path.
    Unexpected,
    /// Unclassified read-path or transport failure.
    Generic,
}

impl AcbsErrorKind {
    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::Unexpected => "UNEXPECTED",
            Self::Generic => "GENERIC",
        }
    }
}

impl std::fmt::Display for AcbsErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified ACBS failure.
#[derive(Debug, Clone, Error)]
pub enum AcbsError {
    /// The IdP handshake failed.
    #[error("{message}")]
    AuthenticationFailed {
        /// Human-readable message.
        message: String,
        /// Underlying transport error, absent for response-shape violations.
        #[source]
        inner: Option<RawError>,
    },

    /// The requested resource does not exist in ACBS.
    #[error("{message}")]
    ResourceNotFound {
        /// Human-readable message naming the resource and identifier.
        message: String,
        /// Underlying transport error.
        #[source]
        inner: Option<RawError>,
    },

    /// ACBS rejected the request with a 400.
    #[error("{message}")]
    BadRequest {
        /// Human-readable message.
        message: String,
        /// Underlying transport error.
        #[source]
        inner: Option<RawError>,
        /// Response body, serialized if it was not a string.
        error_body: String,
    },

    /// A write failed for a reason other than a 400.
    #[error("{message}")]
    Unexpected {
        /// Human-readable message.
        message: String,
        /// Underlying transport error.
        #[source]
        inner: Option<RawError>,
    },

    /// Any other failure.
    #[error("{message}")]
    Generic {
        /// Human-readable message.
        message: String,
        /// Underlying transport error.
        #[source]
        inner: Option<RawError>,
    },
}

impl AcbsError {
    /// Authentication failure without an underlying cause.
    #[must_use]
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
            inner: None,
        }
    }

    /// Authentication failure caused by a transport error.
    #[must_use]
    pub fn authentication_failed_with(message: impl Into<String>, inner: RawError) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
            inner: Some(inner),
        }
    }

    /// Resource-not-found failure.
    #[must_use]
    pub fn resource_not_found(message: impl Into<String>, inner: Option<RawError>) -> Self {
        Self::ResourceNotFound {
            message: message.into(),
            inner,
        }
    }

    /// Bad-request failure.
    #[must_use]
    pub fn bad_request(
        message: impl Into<String>,
        inner: Option<RawError>,
        error_body: impl Into<String>,
    ) -> Self {
        Self::BadRequest {
            message: message.into(),
            inner,
            error_body: error_body.into(),
        }
    }

    /// Unexpected write-path failure.
    #[must_use]
    pub fn unexpected(message: impl Into<String>, inner: Option<RawError>) -> Self {
        Self::Unexpected {
            message: message.into(),
            inner,
        }
    }

    /// Generic failure.
    #[must_use]
    pub fn generic(message: impl Into<String>, inner: Option<RawError>) -> Self {
        Self::Generic {
            message: message.into(),
            inner,
        }
    }

    /// The variant of this error.
    #[must_use]
    pub const fn kind(&self) -> AcbsErrorKind {
        match self {
            Self::AuthenticationFailed { .. } => AcbsErrorKind::AuthenticationFailed,
            Self::ResourceNotFound { .. } => AcbsErrorKind::ResourceNotFound,
            Self::BadRequest { .. } => AcbsErrorKind::BadRequest,
            Self::Unexpected { .. } => AcbsErrorKind::Unexpected,
            Self::Generic { .. } => AcbsErrorKind::Generic,
        }
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::AuthenticationFailed { message, .. }
            | Self::ResourceNotFound { message, .. }
            | Self::BadRequest { message, .. }
            | Self::Unexpected { message, .. }
            | Self::Generic { message, .. } => message,
        }
    }

    /// The original transport error, if any.
    #[must_use]
    pub const fn inner_error(&self) -> Option<&RawError> {
        match self {
            Self::AuthenticationFailed { inner, .. }
            | Self::ResourceNotFound { inner, .. }
            | Self::BadRequest { inner, .. }
            | Self::Unexpected { inner, .. }
            | Self::Generic { inner, .. } => inner.as_ref(),
        }
    }

    /// The forwarded response body of a `BadRequest`.
    #[must_use]
    pub fn error_body(&self) -> Option<&str> {
        match self {
            Self::BadRequest { error_body, .. } => Some(error_body),
            _ => None,
        }
    }

    /// Status an API boundary should answer with for this failure.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self.kind() {
            AcbsErrorKind::ResourceNotFound => StatusCode::NOT_FOUND,
            AcbsErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            AcbsErrorKind::AuthenticationFailed
            | AcbsErrorKind::Unexpected
            | AcbsErrorKind::Generic => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
