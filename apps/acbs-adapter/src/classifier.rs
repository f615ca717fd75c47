//! Classification of raw ACBS failures.
//!
//! Two policies exist:
//!
//! - **Read** (GET): a string body matching a known error produces that
//!   error; anything else, including transport failures, is `Generic`.
//! - **Write** (POST/PUT): only a 400 is inspected. A string body matching a
//!   known error produces that error; an unmatched 400 is `BadRequest` with
//!   the body attached; every other failure is `Unexpected`.
//!
//! Classification is a pure function of the raw error, the registry order and
//! the call-site message.

use reqwest::StatusCode;

use crate::error::{AcbsError, ErrorBody, RawError};
use crate::known_errors::{KnownError, KnownErrorRegistry};

/// Which classification policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierMode {
    /// Policy for GET requests.
    Read,
    /// Policy for POST and PUT requests.
    Write,
}

/// A call-site classifier: policy, fallback message and known errors.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    mode: ClassifierMode,
    message: String,
    known_errors: KnownErrorRegistry,
}

impl ErrorClassifier {
    /// Classifier for a GET call site.
    #[must_use]
    pub fn read(message: impl Into<String>, known_errors: KnownErrorRegistry) -> Self {
        Self {
            mode: ClassifierMode::Read,
            message: message.into(),
            known_errors,
        }
    }

    /// Classifier for a POST or PUT call site.
    #[must_use]
    pub fn write(message: impl Into<String>, known_errors: KnownErrorRegistry) -> Self {
        Self {
            mode: ClassifierMode::Write,
            message: message.into(),
            known_errors,
        }
    }

    /// The policy in use.
    #[must_use]
    pub const fn mode(&self) -> ClassifierMode {
        self.mode
    }

    /// The fallback message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Turn a raw failure into exactly one [`AcbsError`].
    #[must_use]
    pub fn classify(&self, raw: RawError) -> AcbsError {
        match self.mode {
            ClassifierMode::Read => classify_read_error(raw, &self.known_errors, &self.message),
            ClassifierMode::Write => classify_write_error(raw, &self.known_errors, &self.message),
        }
    }
}

/// Classify a failed GET.
#[must_use]
pub fn classify_read_error(
    raw: RawError,
    known_errors: &KnownErrorRegistry,
    message: &str,
) -> AcbsError {
    if let Some(entry) = match_known_error(&raw, known_errors) {
        return entry.raise(raw);
    }
    AcbsError::generic(message, Some(raw))
}

/// Classify a failed POST or PUT.
#[must_use]
pub fn classify_write_error(
    raw: RawError,
    known_errors: &KnownErrorRegistry,
    message: &str,
) -> AcbsError {
    if raw.status() != Some(StatusCode::BAD_REQUEST) {
        return AcbsError::unexpected(message, Some(raw));
    }

    if let Some(entry) = match_known_error(&raw, known_errors) {
        return entry.raise(raw);
    }

    let error_body = raw.body().map(ErrorBody::serialize).unwrap_or_default();
    AcbsError::bad_request(message, Some(raw), error_body)
}

/// First registry entry found in a string body. Non-string bodies and
/// transport failures never match.
fn match_known_error<'r>(
    raw: &RawError,
    known_errors: &'r KnownErrorRegistry,
) -> Option<&'r KnownError> {
    let text = raw.body()?.as_text()?;
    known_errors.find_match(text)
}
