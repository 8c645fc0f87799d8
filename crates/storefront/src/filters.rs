//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Formats a peso amount with dot thousands grouping, e.g. `$15.000`.
///
/// Usage in templates: `{{ quote.total|cop }}`
#[askama::filter_fn]
pub fn cop(amount: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let amount = amount.to_string();
    Ok(amount
        .parse::<i64>()
        .ok()
        .and_then(|a| contraentrega_core::Price::new(a).ok())
        .map_or(amount, |price| price.display()))
}
