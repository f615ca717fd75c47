//! Token Provider Port (Driven Port)
//!
//! Source of bearer tokens for the ACBS business API.

use async_trait::async_trait;

use crate::auth::BearerToken;
use crate::error::AcbsError;

/// Issues bearer tokens.
///
/// Implementations must return a token that is valid at the time of the
/// call. Failures are reported as [`AcbsError::AuthenticationFailed`].
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a bearer token.
    async fn get_token(&self) -> Result<BearerToken, AcbsError>;
}
