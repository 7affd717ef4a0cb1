//! Raw-table loading: header recovery, merge-conflict line removal, and
//! column-label normalization.
//!
//! Exports from the point-of-sale tooling are messy in structural ways that
//! have to be fixed before any cell-level repair makes sense: explanatory
//! text or repeated headers can precede the real header row, and botched
//! merges leave whole conflict-marker lines in the file. This module turns
//! such a file into a [`RawTable`] with a canonical header and only data rows.

use std::path::Path;

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;

use crate::{io_utils, record::normalize_column_name};

/// Normalized label that identifies the real header row when junk rows
/// precede it.
const HEADER_ANCHOR: &str = "location";

const CONFLICT_MARKERS: [&str; 3] = ["<<<<<<<", "=======", ">>>>>>>"];

/// An ordered table of untyped cells with a normalized header. Rows may be
/// shorter than the header; missing cells read as absent downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

pub fn read_raw_table(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<RawTable> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 1))?;
        rows.push(io_utils::decode_record(&record, encoding)?);
    }
    build_raw_table(rows).with_context(|| format!("Ingesting {path:?}"))
}

/// Builds a [`RawTable`] from decoded rows. The first row whose cells include
/// a location-like label becomes the header and everything at or before it is
/// discarded; when no such row exists the original first row stays as the
/// header. Conflict-marker rows are dropped outright.
pub fn build_raw_table(rows: Vec<Vec<String>>) -> Result<RawTable> {
    if rows.is_empty() {
        bail!("Input contains no rows");
    }
    let header_at = find_header_row(&rows).unwrap_or(0);
    let columns = rows[header_at]
        .iter()
        .map(|label| normalize_column_name(label))
        .collect();
    let data = rows
        .into_iter()
        .skip(header_at + 1)
        .filter(|row| !is_conflict_marker(row))
        .collect();
    Ok(RawTable {
        columns,
        rows: data,
    })
}

fn find_header_row(rows: &[Vec<String>]) -> Option<usize> {
    rows.iter().position(|row| {
        row.iter()
            .any(|cell| normalize_column_name(cell) == HEADER_ANCHOR)
    })
}

pub(crate) fn is_conflict_marker(row: &[String]) -> bool {
    row.first().is_some_and(|cell| {
        let cell = cell.trim_start();
        CONFLICT_MARKERS
            .iter()
            .any(|marker| cell.starts_with(marker))
    })
}
