//! HS256 bearer tokens for the admin session.
//!
//! Tokens are three URL-safe, unpadded base64 segments joined by `.`:
//! header, claims, and the HMAC-SHA256 of the first two segments keyed by
//! the server secret. Nothing is stored server-side.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm declared in every header.
pub const ALGORITHM: &str = "HS256";

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Errors from token issuance and verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Wrong segment count or undecodable segment.
    #[error("invalid token: {0}")]
    Malformed(String),

    /// Header declares an algorithm other than HS256.
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signature does not match the header and claims.
    #[error("invalid signature")]
    InvalidSignature,

    /// Claims are past their expiry.
    #[error("token expired")]
    Expired,

    /// The signing key was rejected.
    #[error("invalid signing key")]
    InvalidKey,

    /// Header or claims could not be serialized.
    #[error("token encoding error: {0}")]
    Encoding(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity.
    pub sub: String,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

impl Claims {
    /// Whether the claims have expired at `now` (Unix seconds).
    #[must_use]
    pub const fn is_expired(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// Issues and verifies tokens with a single server secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer keyed by `secret`.
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Issue a token for `sub` expiring [`TOKEN_TTL_SECS`] after `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` or `TokenError::InvalidKey` if the
    /// token cannot be built.
    pub fn issue(&self, sub: &str, now: i64) -> Result<String, TokenError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            sub: sub.to_string(),
            exp: now + TOKEN_TTL_SECS,
        };
        self.sign(&header, &claims)
    }

    /// Verify a token and return its claims.
    ///
    /// Does not check expiry; see [`Claims::is_expired`].
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed` for a bad shape,
    /// `TokenError::UnsupportedAlgorithm` for a non-HS256 header and
    /// `TokenError::InvalidSignature` when the MAC does not match.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header_b64, claims_b64, signature_b64] = segments.as_slice() else {
            return Err(TokenError::Malformed(format!(
                "expected 3 segments, got {}",
                segments.len()
            )));
        };

        let header: Header = decode_segment(header_b64, "header")?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::InvalidSignature)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        decode_segment(claims_b64, "claims")
    }

    fn sign(&self, header: &Header, claims: &Claims) -> Result<String, TokenError> {
        let header = encode_segment(header)?;
        let claims = encode_segment(claims)?;
        let signing_input = format!("{header}.{claims}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::InvalidKey)
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(
    segment: &str,
    name: &str,
) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("{name} is not base64url: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::Malformed(format!("{name} is not valid JSON: {e}")))
}
