//! Authentication error types.

use thiserror::Error;

use crate::services::token::TokenError;
use crate::services::turnstile::ChallengeError;

/// Errors that can occur during admin authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong username or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The challenge service rejected the human-verification response.
    #[error("human verification failed")]
    ChallengeFailed,

    /// The challenge service could not be reached.
    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    /// No bearer token was presented.
    #[error("missing bearer token")]
    MissingToken,

    /// Token is malformed or its signature does not verify.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Token verified but has expired.
    #[error("token expired")]
    Expired,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether this error means the caller is not authenticated, as opposed
    /// to an upstream failure.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        match self {
            Self::Challenge(_)
            | Self::PasswordHash
            | Self::Token(TokenError::InvalidKey | TokenError::Encoding(_)) => false,
            _ => true,
        }
    }
}
