//! Cloudflare Turnstile human-verification.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::TurnstileConfig;

/// Turnstile server-side validation endpoint.
const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Errors reaching the challenge service.
///
/// A challenge that the service rejects is not an error; it is reported as
/// `Ok(false)` by [`ChallengeVerifier::verify`].
#[derive(Debug, Error)]
pub enum ChallengeError {
    /// HTTP request failed.
    #[error("challenge verification request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("challenge service error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Verifies a proof-of-human response token.
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    /// Returns `true` if the service accepts `response`.
    async fn verify(&self, response: &str, remote_ip: Option<&str>)
    -> Result<bool, ChallengeError>;
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Turnstile `siteverify` client.
#[derive(Clone)]
pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret_key: SecretString,
    endpoint: String,
}

impl std::fmt::Debug for TurnstileVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnstileVerifier")
            .field("secret_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl TurnstileVerifier {
    /// Create a verifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &TurnstileConfig) -> Result<Self, ChallengeError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            endpoint: SITEVERIFY_URL.to_string(),
        })
    }
}

#[async_trait]
impl ChallengeVerifier for TurnstileVerifier {
    #[instrument(skip(self, response))]
    async fn verify(
        &self,
        response: &str,
        remote_ip: Option<&str>,
    ) -> Result<bool, ChallengeError> {
        let mut form = vec![
            ("secret", self.secret_key.expose_secret()),
            ("response", response),
        ];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let http_response = self.client.post(&self.endpoint).form(&form).send().await?;
        let status = http_response.status();

        if !status.is_success() {
            let message = http_response.text().await.unwrap_or_default();
            return Err(ChallengeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SiteverifyResponse = http_response.json().await?;
        if !body.success {
            debug!(error_codes = ?body.error_codes, "turnstile rejected challenge");
        }
        Ok(body.success)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_siteverify_response_parsing() {
        let body: SiteverifyResponse = serde_json::from_str(
            r#"{"success":false,"error-codes":["invalid-input-response"]}"#,
        )
        .unwrap();
        assert!(!body.success);
        assert_eq!(body.error_codes, vec!["invalid-input-response"]);

        let body: SiteverifyResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(body.success);
        assert!(body.error_codes.is_empty());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let verifier = TurnstileVerifier::new(&TurnstileConfig {
            site_key: "0x4AAAAAAA".to_string(),
            secret_key: SecretString::from("0x4AAAAAAAsecretvalue"),
        })
        .unwrap();
        let debug = format!("{verifier:?}");
        assert!(!debug.contains("secretvalue"));
    }
}
