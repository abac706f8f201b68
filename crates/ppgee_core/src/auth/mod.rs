//! Credential verification for the administrator login.
//!
//! # Responsibility
//! - Define the opaque `CredentialVerifier` capability used by login flows.
//! - Provide the time-based one-time password implementation.
//!
//! # Invariants
//! - Verification has no side effects on entity data.
//! - A wrong code is `Ok(false)`, not an error.

mod totp;

pub use totp::TotpVerifier;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Boolean credential check against a process-wide secret.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<bool, AuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Caller supplied no token.
    MissingToken,
    /// Shared secret is not usable base32 key material.
    InvalidSecret(String),
    /// System clock is before the unix epoch.
    Clock,
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(f, "token is required"),
            Self::InvalidSecret(message) => write!(f, "invalid one-time password secret: {message}"),
            Self::Clock => write!(f, "system clock is before the unix epoch"),
        }
    }
}

impl Error for AuthError {}
