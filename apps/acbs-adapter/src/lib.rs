// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! ACBS Adapter - Backend Integration Core
//!
//! Lets the API gateway talk to ACBS, a legacy backend that requires a
//! two-phase, cookie-based IdP handshake and reports domain failures as
//! loosely-typed free text.
//!
//! # Layers
//!
//! - **Application**: `ports` (`TokenProvider`)
//! - **Infrastructure**:
//!   - `auth`: session creation and token exchange with the IdP
//!   - `gateway`: authenticated GET/POST/PUT against ACBS
//!   - `known_errors` / `classifier`: raw failure → [`AcbsError`]
//!   - `client`: per-operation facade used by business services
//!   - `config`, `telemetry`: YAML configuration and logging
//!
//! # Flow
//!
//! ```text
//! business service
//!   └─ AcbsClient::begin_operation ── POST /sessions ──► IdP
//!                                  └─ GET /idptoken/openid-connect ──► IdP
//!   └─ AcbsOperation::{get,post,put} ── Bearer token ──► ACBS
//!                                    └─ failure ─► ErrorClassifier ─► AcbsError
//! ```

/// Application layer - port definitions.
pub mod application;

pub mod auth;
pub mod classifier;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod known_errors;
pub mod telemetry;

pub use application::ports::TokenProvider;
pub use auth::{AcbsAuthenticator, BearerToken, Credentials, SessionCookie};
pub use classifier::{ClassifierMode, ErrorClassifier, classify_read_error, classify_write_error};
pub use client::{AcbsClient, AcbsOperation};
pub use config::{AcbsConfig, AuthenticationConfig, Config, ConfigError};
pub use error::{AcbsError, AcbsErrorKind, ErrorBody, RawError};
pub use gateway::{AcbsHttpGateway, AcbsResponse};
pub use known_errors::{KnownError, KnownErrorKind, KnownErrorRegistry};
