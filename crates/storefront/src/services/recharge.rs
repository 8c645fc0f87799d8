//! Lightning recharge quotes.
//!
//! A customer pays pesos and receives sats at the configured rate, plus a
//! flat 5% service fee on the peso amount.

use serde::Serialize;
use thiserror::Error;

use super::short_reference;

/// Service fee in percent of the peso amount.
pub const FEE_PERCENT: i64 = 5;

/// Errors building a quote.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RechargeError {
    /// Amount is zero or negative.
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// Exchange rate is zero.
    #[error("exchange rate is not configured")]
    InvalidRate,
}

/// A recharge quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeQuote {
    /// Pesos converted to sats.
    pub amount: i64,
    /// Service fee in pesos, rounded down.
    pub fee: i64,
    /// Pesos the customer pays.
    pub total: i64,
    /// Sats the customer receives, rounded down.
    pub sats: u64,
    /// Pesos per 1000 sats.
    pub rate_cop_per_ksat: u64,
    /// Reference to quote when confirming payment (`RECH-123456`).
    pub reference: String,
}

/// Quote a recharge of `amount` pesos at `rate_cop_per_ksat`.
///
/// # Errors
///
/// Returns `RechargeError::NonPositiveAmount` for amounts below one peso and
/// `RechargeError::InvalidRate` for a zero rate.
pub fn quote(
    amount: i64,
    rate_cop_per_ksat: u64,
    now_millis: i64,
) -> Result<RechargeQuote, RechargeError> {
    if amount <= 0 {
        return Err(RechargeError::NonPositiveAmount(amount));
    }
    if rate_cop_per_ksat == 0 {
        return Err(RechargeError::InvalidRate);
    }

    let fee = amount.saturating_mul(FEE_PERCENT) / 100;
    let sats = u64::try_from(amount)
        .map_err(|_| RechargeError::NonPositiveAmount(amount))?
        .saturating_mul(1000)
        / rate_cop_per_ksat;

    Ok(RechargeQuote {
        amount,
        fee,
        total: amount.saturating_add(fee),
        sats,
        rate_cop_per_ksat,
        reference: short_reference("RECH", now_millis),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_default_rate() {
        let q = quote(30_000, 1500, 1_760_000_654_321).unwrap();
        assert_eq!(q.fee, 1_500);
        assert_eq!(q.total, 31_500);
        assert_eq!(q.sats, 20_000);
        assert_eq!(q.reference, "RECH-654321");
    }

    #[test]
    fn test_fee_rounds_down() {
        let q = quote(99, 1500, 0).unwrap();
        assert_eq!(q.fee, 4);
        assert_eq!(q.total, 103);
    }

    #[test]
    fn test_sats_round_down() {
        // 1000 / 1.5 = 666.67
        assert_eq!(quote(1000, 1500, 0).unwrap().sats, 666);
    }

    #[test]
    fn test_reference_is_zero_padded() {
        assert_eq!(quote(1, 1500, 1_000_000_000_042).unwrap().reference, "RECH-000042");
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        assert_eq!(quote(0, 1500, 0), Err(RechargeError::NonPositiveAmount(0)));
        assert_eq!(
            quote(-5, 1500, 0),
            Err(RechargeError::NonPositiveAmount(-5))
        );
    }

    #[test]
    fn test_rejects_zero_rate() {
        assert_eq!(quote(1000, 0, 0), Err(RechargeError::InvalidRate));
    }
}
