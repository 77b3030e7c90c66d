//! Currency handling and amount helpers
//!
//! Amounts are carried as plain `rust_decimal::Decimal` values throughout the
//! levy engine; an estate bills in a single currency, so the currency is a
//! formatting concern rather than part of every value.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimal places stored for every amount (`NUMERIC(14, 2)`)
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Largest amount a single field may hold (`NUMERIC(14, 2)`)
pub const MAX_AMOUNT: Decimal = dec!(999999999999.99);

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    NGN,
    GHS,
    KES,
    ZAR,
    USD,
    GBP,
    EUR,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        AMOUNT_DECIMAL_PLACES
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::NGN => "₦",
            Currency::GHS => "GH₵",
            Currency::KES => "KSh",
            Currency::ZAR => "R",
            Currency::USD => "$",
            Currency::GBP => "£",
            Currency::EUR => "€",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::NGN => "NGN",
            Currency::GHS => "GHS",
            Currency::KES => "KES",
            Currency::ZAR => "ZAR",
            Currency::USD => "USD",
            Currency::GBP => "GBP",
            Currency::EUR => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NGN" => Ok(Currency::NGN),
            "GHS" => Ok(Currency::GHS),
            "KES" => Ok(Currency::KES),
            "ZAR" => Ok(Currency::ZAR),
            "USD" => Ok(Currency::USD),
            "GBP" => Ok(Currency::GBP),
            "EUR" => Ok(Currency::EUR),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur when validating amounts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("{field} must not be negative (got {amount})")]
    Negative {
        field: String,
        amount: Decimal,
    },

    #[error("{field} exceeds the maximum of {max} (got {amount})")]
    OutOfRange {
        field: String,
        amount: Decimal,
        max: Decimal,
    },

    #[error("{field} has more than {places} decimal places (got {amount})")]
    TooPrecise {
        field: String,
        amount: Decimal,
        places: u32,
    },

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// Returns the amount unchanged if it is zero or positive
///
/// # Arguments
///
/// * `field` - Name of the field, used in the error message
/// * `amount` - The amount to check
///
/// # Errors
///
/// Returns `MoneyError::Negative` for amounts below zero
pub fn ensure_non_negative(field: &str, amount: Decimal) -> Result<Decimal, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative {
            field: field.to_string(),
            amount,
        });
    }
    Ok(amount)
}

/// Checks an amount can be stored exactly
///
/// The amount must be non-negative, at most [`MAX_AMOUNT`] and have no more
/// than [`AMOUNT_DECIMAL_PLACES`] significant decimal places, so `100.50`
/// and `100.500` pass and `100.005` does not.
///
/// # Errors
///
/// `MoneyError::Negative`, `MoneyError::OutOfRange` or
/// `MoneyError::TooPrecise`
pub fn ensure_amount(field: &str, amount: Decimal) -> Result<Decimal, MoneyError> {
    ensure_non_negative(field, amount)?;
    if amount > MAX_AMOUNT {
        return Err(MoneyError::OutOfRange {
            field: field.to_string(),
            amount,
            max: MAX_AMOUNT,
        });
    }
    if amount.normalize().scale() > AMOUNT_DECIMAL_PLACES {
        return Err(MoneyError::TooPrecise {
            field: field.to_string(),
            amount,
            places: AMOUNT_DECIMAL_PLACES,
        });
    }
    Ok(amount)
}

/// Formats an amount for display, e.g. `₦12,500` or `₦1,250.50`
///
/// Thousands are grouped with commas. Decimals are only shown when the
/// amount has a fractional part.
pub fn format_amount(amount: Decimal, currency: Currency) -> String {
    let dp = currency.decimal_places();
    let rounded = amount.round_dp(dp);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let magnitude = rounded.abs();

    let text = format!("{:.dp$}", magnitude, dp = dp as usize);
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w.to_string(), f.to_string()),
        None => (text.clone(), String::new()),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction.chars().all(|c| c == '0') {
        format!("{}{}{}", sign, currency.symbol(), grouped)
    } else {
        format!("{}{}{}.{}", sign, currency.symbol(), grouped, fraction)
    }
}
