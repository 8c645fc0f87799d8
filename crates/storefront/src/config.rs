//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_IMAGE_BASE_URL` - Base URL product image paths are appended to
//! - `ADMIN_USERNAME` - Inventory admin username
//! - `ADMIN_PASSWORD` or `ADMIN_PASSWORD_HASH` - Plaintext password or Argon2 PHC hash
//! - `ADMIN_TOKEN_SECRET` - HS256 signing secret (min 32 chars, high entropy)
//! - `TURNSTILE_SITE_KEY` - Cloudflare Turnstile site key (rendered in the login form)
//! - `TURNSTILE_SECRET_KEY` - Cloudflare Turnstile secret key
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CATALOG_CACHE_CAPACITY` - Maximum entries in the catalog cache (default: 10000)
//! - `FORMSPREE_ENDPOINT` - Form relay endpoint for orders (orders are refused without it)
//! - `RECHARGE_RATE_COP_PER_KSAT` - COP per 1000 sats on the recharge page (default: 1500)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
const DEFAULT_RECHARGE_RATE: u64 = 1500;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "tu_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Catalog cache and image settings
    pub catalog: CatalogConfig,
    /// Inventory admin credentials and token secret
    pub admin: AdminConfig,
    /// Human-verification challenge settings
    pub turnstile: TurnstileConfig,
    /// Order relay settings
    pub formspree: Option<FormspreeConfig>,
    /// Recharge page pricing
    pub recharge: RechargeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Catalog read path configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Prefix joined to each product's relative image path
    pub image_base_url: String,
    /// Upper bound on cached entries
    pub cache_capacity: u64,
}

/// How the admin password is held.
#[derive(Clone)]
pub enum AdminPassword {
    /// Plaintext value, compared in constant time.
    Plain(SecretString),
    /// Argon2 PHC string.
    Hash(String),
}

/// Inventory admin configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: AdminPassword,
    /// HMAC-SHA-256 key for bearer tokens
    pub token_secret: SecretString,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let password = match self.password {
            AdminPassword::Plain(_) => "[REDACTED plaintext]",
            AdminPassword::Hash(_) => "[REDACTED argon2]",
        };
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &password)
            .field("token_secret", &"[REDACTED]")
            .finish()
    }
}

/// Cloudflare Turnstile configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct TurnstileConfig {
    /// Public site key, safe to expose in the browser
    pub site_key: String,
    /// Server-side verification secret
    pub secret_key: SecretString,
}

impl std::fmt::Debug for TurnstileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnstileConfig")
            .field("site_key", &self.site_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Formspree order relay configuration.
#[derive(Debug, Clone)]
pub struct FormspreeConfig {
    /// Form endpoint, e.g. `https://formspree.io/f/abcd1234`
    pub endpoint: String,
}

/// Recharge page pricing.
#[derive(Debug, Clone, Copy)]
pub struct RechargeConfig {
    /// COP charged per 1000 sats
    pub rate_cop_per_ksat: u64,
}

impl Default for RechargeConfig {
    fn default() -> Self {
        Self {
            rate_cop_per_ksat: DEFAULT_RECHARGE_RATE,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_parsed_or_default("STOREFRONT_PORT", 3000_u16)?;
        let base_url = get_url("STOREFRONT_BASE_URL")?;

        let catalog = CatalogConfig {
            image_base_url: get_url("STOREFRONT_IMAGE_BASE_URL")?,
            cache_capacity: get_parsed_or_default("CATALOG_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?,
        };

        let admin = AdminConfig::from_env()?;
        let turnstile = TurnstileConfig {
            site_key: get_required_env("TURNSTILE_SITE_KEY")?,
            secret_key: get_required_secret("TURNSTILE_SECRET_KEY")?,
        };
        let formspree = get_optional_env("FORMSPREE_ENDPOINT")
            .map(|endpoint| {
                url::Url::parse(&endpoint).map_err(|e| {
                    ConfigError::InvalidEnvVar("FORMSPREE_ENDPOINT".to_string(), e.to_string())
                })?;
                Ok::<_, ConfigError>(FormspreeConfig { endpoint })
            })
            .transpose()?;
        let recharge = RechargeConfig {
            rate_cop_per_ksat: get_parsed_or_default(
                "RECHARGE_RATE_COP_PER_KSAT",
                DEFAULT_RECHARGE_RATE,
            )?,
        };
        if recharge.rate_cop_per_ksat == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "RECHARGE_RATE_COP_PER_KSAT".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            catalog,
            admin,
            turnstile,
            formspree,
            recharge,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_or_default("SENTRY_SAMPLE_RATE", 1.0_f32)?,
            sentry_traces_sample_rate: get_parsed_or_default("SENTRY_TRACES_SAMPLE_RATE", 0.0_f32)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let username = get_required_env("ADMIN_USERNAME")?;
        if username.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_USERNAME".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        // A hash wins over a plaintext password when both are set.
        let password = if let Some(hash) = get_optional_env("ADMIN_PASSWORD_HASH") {
            argon2::PasswordHash::new(&hash).map_err(|e| {
                ConfigError::InvalidEnvVar("ADMIN_PASSWORD_HASH".to_string(), e.to_string())
            })?;
            AdminPassword::Hash(hash)
        } else {
            let plain = get_required_env("ADMIN_PASSWORD")?;
            if plain.is_empty() {
                return Err(ConfigError::InvalidEnvVar(
                    "ADMIN_PASSWORD".to_string(),
                    "cannot be empty".to_string(),
                ));
            }
            AdminPassword::Plain(SecretString::from(plain))
        };

        let token_secret = get_validated_secret("ADMIN_TOKEN_SECRET")?;
        validate_token_secret(&token_secret, "ADMIN_TOKEN_SECRET")?;

        Ok(Self {
            username,
            password,
            token_secret,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get a required environment variable that must parse as an absolute URL.
fn get_url(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    url::Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value)
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable, falling back to `default` when unset.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Validate that the token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            catalog: CatalogConfig {
                image_base_url: "https://img.contraentrega.co/".to_string(),
                cache_capacity: 100,
            },
            admin: AdminConfig {
                username: "admin".to_string(),
                password: AdminPassword::Plain(SecretString::from("hunter2-plain")),
                token_secret: SecretString::from("k9$Zq2!vL7@pX4#mR8&tW1^yB6*nC3%e"),
            },
            turnstile: TurnstileConfig {
                site_key: "site-key-visible".to_string(),
                secret_key: SecretString::from("turnstile-hidden-value"),
            },
            formspree: None,
            recharge: RechargeConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("TU_API_KEY_aB3$xY9!mK2@nL5#", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_token_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_token_secret(&secret, "ADMIN_TOKEN_SECRET").is_err());
    }

    #[test]
    fn test_validate_token_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_token_secret(&secret, "ADMIN_TOKEN_SECRET").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = sample_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", sample_config());

        assert!(debug_output.contains("site-key-visible"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2-plain"));
        assert!(!debug_output.contains("turnstile-hidden-value"));
        assert!(!debug_output.contains("k9$Zq2"));
    }
}
