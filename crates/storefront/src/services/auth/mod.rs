//! Admin authentication service.
//!
//! A single configured admin logs in with username, password and a
//! Turnstile response and receives a one-hour HS256 bearer token. Every
//! privileged request re-derives the session from that token; nothing is
//! stored server-side.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::config::{AdminConfig, AdminPassword};
use crate::services::token::{Claims, TokenSigner};
use crate::services::turnstile::ChallengeVerifier;

/// Subject written into every admin token.
pub const ADMIN_SUBJECT: &str = "admin";

/// The configured admin account.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: AdminPassword,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl AdminCredentials {
    /// Create credentials for `username`.
    #[must_use]
    pub fn new(username: impl Into<String>, password: AdminPassword) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Check a submitted username and password.
    ///
    /// Both comparisons always run so a wrong username costs the same as a
    /// wrong password.
    #[must_use]
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let username_ok = digest_eq(username, &self.username);
        let password_ok = match &self.password {
            AdminPassword::Plain(expected) => digest_eq(password, expected.expose_secret()),
            AdminPassword::Hash(hash) => verify_password(password, hash).is_ok(),
        };
        username_ok & password_ok
    }
}

impl From<&AdminConfig> for AdminCredentials {
    fn from(config: &AdminConfig) -> Self {
        Self::new(config.username.clone(), config.password.clone())
    }
}

/// Issues and checks admin bearer tokens.
#[derive(Clone)]
pub struct AdminAuthService {
    credentials: AdminCredentials,
    signer: TokenSigner,
    challenge: Arc<dyn ChallengeVerifier>,
}

impl AdminAuthService {
    /// Create the service.
    #[must_use]
    pub fn new(
        credentials: AdminCredentials,
        signer: TokenSigner,
        challenge: Arc<dyn ChallengeVerifier>,
    ) -> Self {
        Self {
            credentials,
            signer,
            challenge,
        }
    }

    /// Log in and receive a bearer token.
    ///
    /// The human-verification response is checked before the credentials.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ChallengeFailed` or `AuthError::InvalidCredentials`
    /// when the caller should be refused, and `AuthError::Challenge` if the
    /// challenge service cannot be reached.
    #[instrument(skip(self, password, challenge))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        challenge: &str,
        remote_ip: Option<&str>,
        now: i64,
    ) -> Result<String, AuthError> {
        if challenge.trim().is_empty() {
            return Err(AuthError::ChallengeFailed);
        }
        if !self.challenge.verify(challenge, remote_ip).await? {
            warn!("admin login refused: challenge failed");
            return Err(AuthError::ChallengeFailed);
        }

        if !self.credentials.matches(username, password) {
            warn!("admin login refused: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.signer.issue(ADMIN_SUBJECT, now)?;
        info!("admin logged in");
        Ok(token)
    }

    /// Verify a bearer token and check its expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` for malformed or forged tokens and
    /// `AuthError::Expired` for expired ones.
    pub fn authenticate(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let claims = self.signer.verify(token)?;
        if claims.is_expired(now) {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

/// Hash a password with Argon2id for `ADMIN_PASSWORD_HASH`.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Constant-time equality over SHA-256 digests, so input length leaks nothing.
fn digest_eq(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use secrecy::SecretString;

    use super::*;
    use crate::services::token::TokenError;
    use crate::services::turnstile::ChallengeError;

    const NOW: i64 = 1_760_000_000;

    enum Outcome {
        Pass,
        Fail,
        Down,
    }

    struct StubChallenge {
        outcome: Outcome,
        calls: AtomicUsize,
    }

    impl StubChallenge {
        fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChallengeVerifier for StubChallenge {
        async fn verify(&self, _: &str, _: Option<&str>) -> Result<bool, ChallengeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Pass => Ok(true),
                Outcome::Fail => Ok(false),
                Outcome::Down => Err(ChallengeError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    fn service(challenge: Arc<StubChallenge>, password: AdminPassword) -> AdminAuthService {
        AdminAuthService::new(
            AdminCredentials::new("tendero", password),
            TokenSigner::new(SecretString::from("Zq8-unit-test-signing-key-4f1e9b7d2c")),
            challenge,
        )
    }

    fn plain(password: &str) -> AdminPassword {
        AdminPassword::Plain(SecretString::from(password))
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let auth = service(StubChallenge::new(Outcome::Pass), plain("s3gura"));

        let token = auth
            .login("tendero", "s3gura", "cf-token", Some("1.2.3.4"), NOW)
            .await
            .unwrap();

        let claims = auth.authenticate(&token, NOW + 10).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp, NOW + 3600);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let auth = service(StubChallenge::new(Outcome::Pass), plain("s3gura"));
        let err = auth
            .login("tendero", "nope", "cf-token", None, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_wrong_username() {
        let auth = service(StubChallenge::new(Outcome::Pass), plain("s3gura"));
        assert!(matches!(
            auth.login("admin", "s3gura", "cf-token", None, NOW).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_challenge_checked_before_credentials() {
        let challenge = StubChallenge::new(Outcome::Fail);
        let auth = service(challenge.clone(), plain("s3gura"));

        let err = auth
            .login("tendero", "s3gura", "bad", None, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ChallengeFailed));
        assert_eq!(challenge.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_challenge_skips_service() {
        let challenge = StubChallenge::new(Outcome::Pass);
        let auth = service(challenge.clone(), plain("s3gura"));

        assert!(matches!(
            auth.login("tendero", "s3gura", "", None, NOW).await,
            Err(AuthError::ChallengeFailed)
        ));
        assert_eq!(challenge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_challenge_service_down_is_not_unauthorized() {
        let auth = service(StubChallenge::new(Outcome::Down), plain("s3gura"));
        let err = auth
            .login("tendero", "s3gura", "cf-token", None, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Challenge(_)));
        assert!(!err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_login_with_argon2_hash() {
        let hash = hash_password("s3gura").unwrap();
        let auth = service(StubChallenge::new(Outcome::Pass), AdminPassword::Hash(hash));

        assert!(
            auth.login("tendero", "s3gura", "cf-token", None, NOW)
                .await
                .is_ok()
        );
        assert!(matches!(
            auth.login("tendero", "S3gura", "cf-token", None, NOW).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_authenticate_expired() {
        let auth = service(StubChallenge::new(Outcome::Pass), plain("x"));
        let token = TokenSigner::new(SecretString::from("Zq8-unit-test-signing-key-4f1e9b7d2c"))
            .issue(ADMIN_SUBJECT, NOW - 3600)
            .unwrap();

        let err = auth.authenticate(&token, NOW).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_authenticate_tampered() {
        let auth = service(StubChallenge::new(Outcome::Pass), plain("x"));
        let token = TokenSigner::new(SecretString::from("Zq8-unit-test-signing-key-4f1e9b7d2c"))
            .issue(ADMIN_SUBJECT, NOW)
            .unwrap();
        let tampered = format!("{token}x");

        assert!(matches!(
            auth.authenticate(&tampered, NOW),
            Err(AuthError::Token(TokenError::InvalidSignature))
        ));
    }

    #[test]
    fn test_digest_eq() {
        assert!(digest_eq("hello", "hello"));
        assert!(digest_eq("", ""));
        assert!(!digest_eq("hello", "world"));
        assert!(!digest_eq("hello", "hello!"));
    }

    #[test]
    fn test_credentials_debug_redacted() {
        let creds = AdminCredentials::new("tendero", plain("s3gura"));
        assert!(!format!("{creds:?}").contains("s3gura"));
    }
}
