//! The cell-level repair pipeline and the `repair` subcommand.
//!
//! Runs after ingest has fixed the table's structure. Steps, in order:
//! sentinel normalization, numeric coercion, derived-value recovery
//! (`total_spent = quantity * price_per_unit`), zero default-fill, date
//! parsing, and mode-based categorical fill. Malformed cells never produce
//! errors; they coerce to null and are then defaulted. Canonical columns
//! absent from the input are synthesized with all-default values so every
//! consumer sees the full schema.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use encoding_rs::Encoding;
use itertools::Itertools;
use log::info;

use crate::{
    cli::RepairArgs,
    ingest::{self, RawTable},
    io_utils,
    record::{CleanRecord, PLACEHOLDER_CATEGORY, is_sentinel, parse_transaction_date},
};

pub fn execute(args: &RepairArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let records = load_clean_records(&args.input, delimiter, encoding, &args.locations)?;

    let output_delimiter =
        io_utils::resolve_output_delimiter(args.output.as_deref(), args.output_delimiter, delimiter);
    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), output_delimiter)?;
    for (idx, record) in records.iter().enumerate() {
        writer
            .serialize(record)
            .with_context(|| format!("Writing repaired row {}", idx + 1))?;
    }
    writer.flush().context("Flushing output writer")?;

    let destination = args
        .output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!("Repaired {} row(s) -> {}", records.len(), destination);
    Ok(())
}

/// Reads, repairs, and optionally location-filters a raw export. Shared entry
/// point for every subcommand.
pub fn load_clean_records(
    input: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    locations: &[String],
) -> Result<Vec<CleanRecord>> {
    let raw = ingest::read_raw_table(input, delimiter, encoding)?;
    let mut records = repair(&raw);
    if !locations.is_empty() {
        records.retain(|record| locations.iter().any(|wanted| wanted == &record.location));
    }
    Ok(records)
}

/// Per-row state between coercion and fill. Numeric nulls survive until the
/// derived-value step has had a chance to recover them.
struct PartialRecord {
    quantity: Option<f64>,
    price_per_unit: Option<f64>,
    total_spent: Option<f64>,
    item: Option<String>,
    location: Option<String>,
    payment_method: Option<String>,
    transaction_date: Option<NaiveDate>,
}

/// Repairs every row of a structurally clean table. Pure; never fails on
/// malformed cell data.
pub fn repair(raw: &RawTable) -> Vec<CleanRecord> {
    let quantity_at = raw.column_index("quantity");
    let price_at = raw.column_index("price_per_unit");
    let total_at = raw.column_index("total_spent");
    let item_at = raw.column_index("item");
    let location_at = raw.column_index("location");
    let payment_at = raw.column_index("payment_method");
    let date_at = raw.column_index("transaction_date");

    let mut partials = Vec::with_capacity(raw.rows.len());
    for row in &raw.rows {
        let quantity = numeric_cell(row, quantity_at);
        let price_per_unit = numeric_cell(row, price_at);
        let mut total_spent = numeric_cell(row, total_at);
        if total_spent.is_none()
            && let (Some(quantity), Some(price)) = (quantity, price_per_unit)
        {
            total_spent = Some(quantity * price);
        }
        partials.push(PartialRecord {
            quantity,
            price_per_unit,
            total_spent,
            item: categorical_cell(row, item_at),
            location: categorical_cell(row, location_at),
            payment_method: categorical_cell(row, payment_at),
            transaction_date: categorical_cell(row, date_at)
                .and_then(|value| parse_transaction_date(&value)),
        });
    }

    let item_fill = mode_or_placeholder(partials.iter().filter_map(|p| p.item.as_deref()));
    let location_fill = mode_or_placeholder(partials.iter().filter_map(|p| p.location.as_deref()));
    let payment_fill =
        mode_or_placeholder(partials.iter().filter_map(|p| p.payment_method.as_deref()));

    partials
        .into_iter()
        .map(|partial| CleanRecord {
            quantity: partial.quantity.unwrap_or(0.0),
            price_per_unit: partial.price_per_unit.unwrap_or(0.0),
            total_spent: partial.total_spent.unwrap_or(0.0),
            item: partial.item.unwrap_or_else(|| item_fill.clone()),
            location: partial.location.unwrap_or_else(|| location_fill.clone()),
            payment_method: partial
                .payment_method
                .unwrap_or_else(|| payment_fill.clone()),
            transaction_date: partial.transaction_date,
        })
        .collect()
}

fn numeric_cell(row: &[String], idx: Option<usize>) -> Option<f64> {
    let cell = idx.and_then(|i| row.get(i))?;
    if is_sentinel(cell) {
        return None;
    }
    cell.trim().parse::<f64>().ok()
}

fn categorical_cell(row: &[String], idx: Option<usize>) -> Option<String> {
    let cell = idx.and_then(|i| row.get(i))?;
    if is_sentinel(cell) {
        None
    } else {
        Some(cell.trim().to_string())
    }
}

/// Most frequent observed value; ties break toward the lexicographically
/// smaller value so fills are deterministic.
fn mode_or_placeholder<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .next()
        .map(|(value, _)| value.to_string())
        .unwrap_or_else(|| PLACEHOLDER_CATEGORY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::build_raw_table;
    use chrono::NaiveDate;

    fn table(raw: &[&[&str]]) -> RawTable {
        build_raw_table(
            raw.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
        .expect("raw table")
    }

    #[test]
    fn sentinel_total_is_recovered_from_quantity_and_price() {
        let raw = table(&[
            &["Quantity", "Price Per Unit", "Total Spent", "Location"],
            &["3", "2.5", "ERROR", "UNKNOWN"],
            &["1", "4.0", "4.0", "Downtown"],
        ]);
        let records = repair(&raw);
        assert_eq!(records[0].quantity, 3.0);
        assert_eq!(records[0].price_per_unit, 2.5);
        assert_eq!(records[0].total_spent, 7.5);
        // The only observed location becomes the fill value.
        assert_eq!(records[0].location, "Downtown");
    }

    #[test]
    fn unrecoverable_numerics_default_to_zero() {
        let raw = table(&[
            &["Quantity", "Price Per Unit", "Total Spent", "Location"],
            &["nan", "oops", "", "Downtown"],
        ]);
        let records = repair(&raw);
        assert_eq!(records[0].quantity, 0.0);
        assert_eq!(records[0].price_per_unit, 0.0);
        assert_eq!(records[0].total_spent, 0.0);
    }

    #[test]
    fn negative_literals_pass_through_unclamped() {
        let raw = table(&[
            &["Quantity", "Price Per Unit", "Total Spent", "Location"],
            &["-2", "3.0", "", "Downtown"],
        ]);
        let records = repair(&raw);
        assert_eq!(records[0].quantity, -2.0);
        assert_eq!(records[0].total_spent, -6.0);
    }

    #[test]
    fn missing_columns_are_synthesized_with_defaults() {
        let raw = table(&[&["Item", "Location"], &["Latte", "Downtown"]]);
        let records = repair(&raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity, 0.0);
        assert_eq!(records[0].price_per_unit, 0.0);
        assert_eq!(records[0].total_spent, 0.0);
        assert_eq!(records[0].payment_method, PLACEHOLDER_CATEGORY);
        assert_eq!(records[0].transaction_date, None);
    }

    #[test]
    fn categorical_nulls_take_the_column_mode_with_lexicographic_ties() {
        let raw = table(&[
            &["Item", "Location"],
            &["Latte", "Downtown"],
            &["Latte", "Airport"],
            &["Mocha", "Airport"],
            &["Mocha", "UNKNOWN"],
            &["ERROR", "Downtown"],
        ]);
        let records = repair(&raw);
        // Latte and Mocha tie at two observations each.
        assert_eq!(records[4].item, "Latte");
        assert_eq!(records[3].location, "Airport");
    }

    #[test]
    fn dates_parse_or_stay_absent() {
        let raw = table(&[
            &["Transaction Date", "Location"],
            &["2024-03-01", "Downtown"],
            &["01/04/2024", "Downtown"],
            &["soon", "Downtown"],
        ]);
        let records = repair(&raw);
        assert_eq!(
            records[0].transaction_date,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            records[1].transaction_date,
            NaiveDate::from_ymd_opt(2024, 4, 1)
        );
        assert_eq!(records[2].transaction_date, None);
    }

    #[test]
    fn short_rows_read_as_missing_cells() {
        let raw = table(&[
            &["Quantity", "Price Per Unit", "Total Spent", "Location"],
            &["2", "1.5"],
        ]);
        let records = repair(&raw);
        assert_eq!(records[0].total_spent, 3.0);
    }
}
