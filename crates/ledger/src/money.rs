//! Parsing and formatting of monetary amounts.
//!
//! All balances and prices in the ledger are **integer minor units** (`i64`
//! cents), never floats, so repeated earmark/refund cycles cannot drift.
//! Producers collect prices and manual adjustments as decimal strings; this
//! module turns those strings into minor units and back.

use crate::LedgerError;

/// Parses a signed decimal string into minor units.
///
/// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
///
/// Validation rules:
/// - max 2 fractional digits (rejects `12.345`)
/// - rejects empty or non-numeric strings
pub fn parse_minor(s: &str) -> Result<i64, LedgerError> {
    let empty = || LedgerError::InvalidAmount("empty amount".to_string());
    let invalid = || LedgerError::InvalidAmount("invalid amount".to_string());
    let overflow = || LedgerError::InvalidAmount("amount too large".to_string());

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped)
    } else {
        (false, trimmed)
    };

    let rest = rest.trim().replace(',', ".");
    if rest.is_empty() {
        return Err(empty());
    }

    let mut parts = rest.split('.');
    let units_str = parts.next().ok_or_else(invalid)?;
    let frac_str = parts.next();
    if parts.next().is_some() {
        return Err(invalid());
    }

    if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let units: i64 = units_str.parse().map_err(|_| invalid())?;

    let cents: i64 = match frac_str {
        None | Some("") => 0,
        Some(frac) => {
            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            match frac.len() {
                1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                2 => frac.parse::<i64>().map_err(|_| invalid())?,
                _ => {
                    return Err(LedgerError::InvalidAmount(
                        "too many decimals".to_string(),
                    ));
                }
            }
        }
    };

    let total = units
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(overflow)?;

    if negative {
        total.checked_neg().ok_or_else(overflow)
    } else {
        Ok(total)
    }
}

/// Parses an estimated price: same grammar as [`parse_minor`] but the result
/// must be non-negative. This is the producer-side gate the item stores rely
/// on; negative prices never reach persistence through it.
pub fn parse_price_minor(s: &str) -> Result<i64, LedgerError> {
    let minor = parse_minor(s)?;
    if minor < 0 {
        return Err(LedgerError::InvalidAmount(
            "price must not be negative".to_string(),
        ));
    }
    Ok(minor)
}

/// Formats minor units as a plain decimal string (`-10.50`, `0.07`).
///
/// Currency symbols are a presentation concern and stay out of the core.
pub fn format_minor(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
