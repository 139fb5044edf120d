//! Gross weight parsing and aggregation
//!
//! Weights are opaque text (`"12.50 Kg"`, `"5,50 kg"`, `"1.234,5"`) except
//! here. Sums use `Decimal` so two-place results are exact.

use rust_decimal::Decimal;
use std::str::FromStr;
use wms_labels_types::Volume;

/// Parse a weight string, ignoring any trailing unit.
///
/// - `"5,50 Kg"` -> 5.50 (comma decimal separator)
/// - `"1.234,50"` -> 1234.50 (dot thousands, comma decimal)
/// - `"1,234.50"` -> 1234.50 (comma thousands, dot decimal)
pub fn parse_weight(text: &str) -> Option<Decimal> {
    let numeric: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();
    if numeric.is_empty() {
        return None;
    }

    let normalized = match (numeric.rfind(','), numeric.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => numeric.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => numeric.replace(',', ""),
        (Some(_), None) => numeric.replace(',', "."),
        _ => numeric,
    };

    Decimal::from_str(&normalized).ok()
}

/// Sum of every volume's gross weight, formatted `"{total:.2} {unit}"`.
/// Unparsable weights count as zero.
pub fn total_weight(volumes: &[Volume], unit: &str) -> String {
    let total: Decimal = volumes
        .iter()
        .map(|v| parse_weight(&v.gross_weight).unwrap_or(Decimal::ZERO))
        .sum();
    format_weight(total, unit)
}

pub fn format_weight(value: Decimal, unit: &str) -> String {
    format!("{:.2} {}", value.round_dp(2), unit)
}
