//! Known ACBS errors.
//!
//! ACBS reports domain failures such as a missing facility as free text in a
//! 400 body, with inconsistent wording ("Facility not found", "The facility
//! not found ..."). A [`KnownErrorRegistry`] is an ordered table of
//! case-insensitive substrings that turn such bodies into a specific
//! [`AcbsError`]. Each call site builds its own registry, so the same backend
//! text can classify differently depending on the resource being targeted.

use crate::error::{AcbsError, ErrorBody, RawError};

/// The error a matching [`KnownError`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownErrorKind {
    /// Produce [`AcbsError::ResourceNotFound`].
    ResourceNotFound,
    /// Produce [`AcbsError::BadRequest`] carrying the serialized body.
    BadRequest,
}

/// A single registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownError {
    /// Lower-cased substring searched for in the lower-cased body.
    substring: String,
    kind: KnownErrorKind,
    message: String,
}

impl KnownError {
    /// Create an entry. The substring is lower-cased here so both sides of
    /// the comparison are case-insensitive.
    #[must_use]
    pub fn new(
        substring: impl AsRef<str>,
        kind: KnownErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            substring: substring.as_ref().to_lowercase(),
            kind,
            message: message.into(),
        }
    }

    /// ACBS could not find the facility.
    #[must_use]
    pub fn facility_not_found(facility_identifier: &str) -> Self {
        Self::resource_not_found("facility not found", "Facility", facility_identifier)
    }

    /// ACBS could not find the deal.
    #[must_use]
    pub fn deal_not_found(deal_identifier: &str) -> Self {
        Self::resource_not_found("deal not found", "Deal", deal_identifier)
    }

    /// ACBS could not find the party.
    #[must_use]
    pub fn party_not_found(party_identifier: &str) -> Self {
        Self::resource_not_found("party not found", "Party", party_identifier)
    }

    /// ACBS could not find the loan.
    #[must_use]
    pub fn loan_not_found(loan_identifier: &str) -> Self {
        Self::resource_not_found("loan not found", "Loan", loan_identifier)
    }

    fn resource_not_found(substring: &str, resource: &str, identifier: &str) -> Self {
        Self::new(
            substring,
            KnownErrorKind::ResourceNotFound,
            format!("{resource} with identifier {identifier} was not found by ACBS."),
        )
    }

    /// The lower-cased substring this entry matches.
    #[must_use]
    pub fn substring(&self) -> &str {
        &self.substring
    }

    /// The error kind this entry produces.
    #[must_use]
    pub const fn kind(&self) -> KnownErrorKind {
        self.kind
    }

    /// The message of the produced error.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether an already lower-cased body contains this entry's substring.
    fn matches(&self, lowercase_body: &str) -> bool {
        lowercase_body.contains(&self.substring)
    }

    /// Turn the raw failure into this entry's error.
    #[must_use]
    pub fn raise(&self, raw: RawError) -> AcbsError {
        match self.kind {
            KnownErrorKind::ResourceNotFound => {
                AcbsError::resource_not_found(self.message.clone(), Some(raw))
            }
            KnownErrorKind::BadRequest => {
                let error_body = raw.body().map(ErrorBody::serialize).unwrap_or_default();
                AcbsError::bad_request(self.message.clone(), Some(raw), error_body)
            }
        }
    }
}

/// Ordered list of [`KnownError`]s. The first matching entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownErrorRegistry {
    entries: Vec<KnownError>,
}

impl KnownErrorRegistry {
    /// An empty registry: every failure falls through to the default outcome.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry. Entries added earlier take precedence.
    #[must_use]
    pub fn with(mut self, entry: KnownError) -> Self {
        self.entries.push(entry);
        self
    }

    /// Append an entry in place.
    pub fn push(&mut self, entry: KnownError) {
        self.entries.push(entry);
    }

    /// Find the first entry whose substring occurs in `body`, ignoring case.
    #[must_use]
    pub fn find_match(&self, body: &str) -> Option<&KnownError> {
        let lowercase_body = body.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.matches(&lowercase_body))
    }

    /// Entries in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = &KnownError> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<KnownError> for KnownErrorRegistry {
    fn from_iter<I: IntoIterator<Item = KnownError>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<KnownError>> for KnownErrorRegistry {
    fn from(entries: Vec<KnownError>) -> Self {
        Self { entries }
    }
}
