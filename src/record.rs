//! Canonical record types and cell-level parsing helpers.
//!
//! Raw exports arrive with free-form column labels and untyped cells; nothing
//! downstream of the repair pass touches a cell that has not been normalized
//! through the helpers here.

use chrono::NaiveDate;
use serde::Serialize;

/// Fill label used when a categorical column has no observed values at all.
pub const PLACEHOLDER_CATEGORY: &str = "Unknown";

/// Canonical column labels, in export order.
pub const CANONICAL_COLUMNS: [&str; 7] = [
    "quantity",
    "price_per_unit",
    "total_spent",
    "item",
    "location",
    "payment_method",
    "transaction_date",
];

/// A fully repaired transaction row. The numeric fields are always present;
/// `transaction_date` stays `None` when the source value does not parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRecord {
    pub quantity: f64,
    pub price_per_unit: f64,
    pub total_spent: f64,
    pub item: String,
    pub location: String,
    pub payment_method: String,
    pub transaction_date: Option<NaiveDate>,
}

pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => c,
            _ => '_',
        })
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Cell values that denote "missing" despite being stored as text.
pub fn is_sentinel(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("error")
        || trimmed.eq_ignore_ascii_case("unknown")
        || trimmed.eq_ignore_ascii_case("nan")
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

pub fn parse_transaction_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}
