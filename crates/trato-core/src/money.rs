//! pt-BR currency parsing and formatting.
//!
//! Users type amounts the Brazilian way ("1.234,56"); the backend wants a
//! plain float. Dots are grouping separators and the comma is the decimal
//! mark.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("not a valid amount: {0:?}")]
    Invalid(String),
    #[error("amount must be greater than zero")]
    NotPositive,
}

/// Parses a pt-BR formatted amount. Currency symbols and spaces are
/// ignored; a leading minus sign is honored.
pub fn parse_amount(input: &str) -> Result<f64, AmountError> {
    let trimmed = input.trim();
    let negative = trimmed.starts_with('-');
    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return Err(AmountError::Invalid(input.to_string()));
    }
    let normalized = cleaned.replace('.', "").replace(',', ".");
    let value: f64 = normalized
        .parse()
        .map_err(|_| AmountError::Invalid(input.to_string()))?;
    Ok(if negative { -value } else { value })
}

/// [`parse_amount`], then rejects anything that is not strictly positive.
/// This is the rule for bid values and sale/trade prices.
pub fn parse_positive_amount(input: &str) -> Result<f64, AmountError> {
    let value = parse_amount(input)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(AmountError::NotPositive);
    }
    Ok(value)
}

/// Formats a value as Brazilian currency: "R$ 1.234,56".
pub fn format_brl(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as i64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{fraction:02}")
}
