//! The `audit` subcommand: renders the first rows of the repaired table so
//! the effect of the repair pass can be eyeballed before exporting.

use anyhow::Result;
use log::info;

use crate::{cli::AuditArgs, io_utils, record::CANONICAL_COLUMNS, repair, table};

pub fn execute(args: &AuditArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let records = repair::load_clean_records(&args.input, delimiter, encoding, &args.locations)?;

    let mut rows = Vec::new();
    for record in records.iter().take(args.rows) {
        rows.push(vec![
            table::format_number(record.quantity),
            table::format_number(record.price_per_unit),
            format!("{:.2}", record.total_spent),
            record.item.clone(),
            record.location.clone(),
            record.payment_method.clone(),
            record
                .transaction_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        ]);
    }
    let headers = CANONICAL_COLUMNS
        .iter()
        .map(|label| label.to_string())
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    info!(
        "Displayed {} of {} repaired row(s) from {:?}",
        rows.len(),
        records.len(),
        args.input
    );
    Ok(())
}
