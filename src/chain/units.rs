//! Exact conversion between human decimal amounts and token base units.
//!
//! Conversions never go through floating point. The string form is split
//! on the decimal point and scaled by padding, so `0.1` ETH is exactly
//! `100000000000000000` wei.

use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::error::AmountError;

/// Parse a user-supplied amount as a strictly positive decimal.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::NotPositive);
    }
    check_digits(trimmed)?;
    let value = Decimal::from_str(trimmed)
        .map_err(|_| AmountError::Malformed(trimmed.to_string()))?;
    if value <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    Ok(value.normalize())
}

/// Convert a decimal amount string into base units for a token with
/// `decimals` places. Extra precision is rejected, never rounded.
pub fn to_base_units(raw: &str, decimals: u8, symbol: &str) -> Result<U256, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::NotPositive);
    }
    check_digits(trimmed)?;

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part.trim_end_matches('0')),
        None => (trimmed, ""),
    };
    if frac_part.len() > usize::from(decimals) {
        return Err(AmountError::TooPrecise {
            symbol: symbol.to_string(),
            decimals,
        });
    }

    let mut digits = String::with_capacity(int_part.len() + usize::from(decimals));
    digits.push_str(int_part);
    digits.push_str(frac_part);
    for _ in frac_part.len()..usize::from(decimals) {
        digits.push('0');
    }
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Err(AmountError::NotPositive);
    }

    U256::from_str_radix(digits, 10).map_err(|_| AmountError::Overflow)
}

/// Convert base units back into a decimal amount.
///
/// Returns `None` when the value does not fit the decimal type; callers
/// treat such balances as larger than anything a user can request.
pub fn from_base_units(value: U256, decimals: u8) -> Option<Decimal> {
    let raw = u128::try_from(value).ok()?;
    let raw = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(raw, u32::from(decimals))
        .ok()
        .map(|d| d.normalize())
}

/// Render base units as a plain decimal string without rounding.
pub fn format_base_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

fn check_digits(value: &str) -> Result<(), AmountError> {
    let mut seen_point = false;
    let mut seen_digit = false;
    for ch in value.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return Err(AmountError::Malformed(value.to_string())),
        }
    }
    if !seen_digit {
        return Err(AmountError::Malformed(value.to_string()));
    }
    Ok(())
}
