//! Aggregate metrics over the repaired table and the `metrics` subcommand.

use std::collections::HashMap;

use anyhow::Result;
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{cli::MetricsArgs, io_utils, record::CleanRecord, repair, table};

/// Fixed-shape summary snapshot. Recomputed on every invocation; `None`
/// fields mean the input was empty and the caller decides how to render that.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub total_revenue: f64,
    pub average_ticket: Option<f64>,
    pub total_items: f64,
    pub valid_rows: usize,
    pub best_seller: Option<String>,
}

pub fn execute(args: &MetricsArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let records = repair::load_clean_records(&args.input, delimiter, encoding, &args.locations)?;
    let metrics = compute_metrics(&records);

    let headers = vec!["metric".to_string(), "value".to_string()];
    let rows = vec![
        vec![
            "total_revenue".to_string(),
            format!("{:.2}", metrics.total_revenue),
        ],
        vec![
            "average_ticket".to_string(),
            metrics
                .average_ticket
                .map(|value| format!("{value:.2}"))
                .unwrap_or_default(),
        ],
        vec![
            "items_sold".to_string(),
            table::format_number(metrics.total_items),
        ],
        vec!["valid_rows".to_string(), metrics.valid_rows.to_string()],
        vec![
            "best_seller".to_string(),
            metrics.best_seller.clone().unwrap_or_default(),
        ],
    ];
    table::print_table(&headers, &rows);
    info!(
        "Computed summary metrics over {} repaired row(s) from {:?}",
        metrics.valid_rows, args.input
    );
    Ok(())
}

/// Pure aggregation over repaired rows. Total over any input, including the
/// empty table.
pub fn compute_metrics(records: &[CleanRecord]) -> MetricsRecord {
    let total_revenue: f64 = records.iter().map(|record| record.total_spent).sum();
    let total_items: f64 = records.iter().map(|record| record.quantity).sum();
    let average_ticket = if records.is_empty() {
        None
    } else {
        Some(total_revenue / records.len() as f64)
    };

    let mut quantity_by_item: HashMap<&str, f64> = HashMap::new();
    for record in records {
        *quantity_by_item.entry(record.item.as_str()).or_insert(0.0) += record.quantity;
    }
    let best_seller = quantity_by_item
        .into_iter()
        .sorted_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .next()
        .map(|(item, _)| item.to_string());

    MetricsRecord {
        total_revenue,
        average_ticket,
        total_items,
        valid_rows: records.len(),
        best_seller,
    }
}
