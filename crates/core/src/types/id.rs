//! Canonical product keys.
//!
//! Products are keyed by an externally assigned string that always begins
//! with [`PRODUCT_ID_SIGIL`]. URLs carry the bare fragment (`/api/products/test1`)
//! while the stores hold the prefixed form (`@test1`).

use core::fmt;

use serde::{Deserialize, Serialize};

use super::product::ProductError;

/// Sigil prepended to every product key.
pub const PRODUCT_ID_SIGIL: char = '@';

/// Canonical product key (e.g. `@test1`).
///
/// ```
/// use contraentrega_core::ProductId;
///
/// let id = ProductId::normalize("test1").unwrap();
/// assert_eq!(id.as_str(), "@test1");
/// assert_eq!(id.fragment(), "test1");
///
/// // Already-canonical keys are kept as is.
/// assert_eq!(ProductId::normalize("@test1").unwrap(), id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Normalize an identifier fragment into its canonical key form.
    ///
    /// Surrounding whitespace is trimmed and the sigil is prepended when the
    /// fragment does not already carry it.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::EmptyId` if nothing remains besides the sigil.
    pub fn normalize(fragment: &str) -> Result<Self, ProductError> {
        let trimmed = fragment.trim();
        let bare = trimmed.strip_prefix(PRODUCT_ID_SIGIL).unwrap_or(trimmed);

        if bare.is_empty() {
            return Err(ProductError::EmptyId);
        }

        Ok(Self(format!("{PRODUCT_ID_SIGIL}{bare}")))
    }

    /// The canonical key, including the sigil.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key without its sigil, as used in URLs.
    #[must_use]
    pub fn fragment(&self) -> &str {
        self.0.strip_prefix(PRODUCT_ID_SIGIL).unwrap_or(&self.0)
    }

    /// Consumes the key and returns the canonical string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ProductId {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Incoming JSON is normalized so admin payloads may omit the sigil.
impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::normalize(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ProductId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ProductId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::normalize(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ProductId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prepends_sigil() {
        let id = ProductId::normalize("abc").unwrap();
        assert_eq!(id.as_str(), "@abc");
    }

    #[test]
    fn test_normalize_keeps_existing_sigil() {
        let id = ProductId::normalize("@abc").unwrap();
        assert_eq!(id.as_str(), "@abc");
    }

    #[test]
    fn test_normalize_trims() {
        let id = ProductId::normalize("  abc ").unwrap();
        assert_eq!(id.as_str(), "@abc");
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(matches!(ProductId::normalize(""), Err(ProductError::EmptyId)));
        assert!(matches!(ProductId::normalize("@"), Err(ProductError::EmptyId)));
        assert!(matches!(ProductId::normalize("   "), Err(ProductError::EmptyId)));
    }

    #[test]
    fn test_fragment() {
        let id = ProductId::normalize("@test1").unwrap();
        assert_eq!(id.fragment(), "test1");
    }

    #[test]
    fn test_deserialize_normalizes() {
        let id: ProductId = serde_json::from_str("\"test1\"").unwrap();
        assert_eq!(id.as_str(), "@test1");

        let err = serde_json::from_str::<ProductId>("\"@\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_serialize_canonical() {
        let id = ProductId::normalize("test1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"@test1\"");
    }
}
