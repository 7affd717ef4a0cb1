//! Transaction-value estimator and the `predict` subcommand.
//!
//! A least-squares regression of `total_spent` on quantity and unit price,
//! fit fresh from the repaired table on every invocation and never persisted.
//! The feature vector carries an interaction term (`1, q, p, q*p`) so exports
//! whose totals are exact products are recovered exactly, and the closed-form
//! normal-equations solve keeps predictions deterministic without any random
//! seed. Predictions are only meaningful for inputs in the range of the
//! training data; no extrapolation check is performed.

use anyhow::{Result, anyhow};
use log::info;

use crate::{cli::PredictArgs, io_utils, record::CleanRecord, repair, table};

/// Minimum usable rows before a fit is attempted.
pub const MIN_TRAINING_ROWS: usize = 5;

const PIVOT_EPSILON: f64 = 1e-9;

/// A fitted regression model. Owned by the caller that trained it.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimator {
    coefficients: [f64; 4],
}

impl Estimator {
    pub fn predict(&self, quantity: f64, price_per_unit: f64) -> f64 {
        let x = features(quantity, price_per_unit);
        x.iter()
            .zip(self.coefficients.iter())
            .map(|(xi, ci)| xi * ci)
            .sum()
    }
}

pub fn execute(args: &PredictArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let records = repair::load_clean_records(&args.input, delimiter, encoding, &args.locations)?;
    let estimator = fit_estimator(&records).ok_or_else(|| {
        anyhow!(
            "Estimator unavailable: need at least {MIN_TRAINING_ROWS} usable rows with varying quantity and price"
        )
    })?;
    let estimate = estimator.predict(args.quantity, args.price);

    let headers = vec![
        "quantity".to_string(),
        "price_per_unit".to_string(),
        "estimated_total".to_string(),
    ];
    let rows = vec![vec![
        table::format_number(args.quantity),
        table::format_number(args.price),
        format!("{estimate:.2}"),
    ]];
    table::print_table(&headers, &rows);
    info!(
        "Trained estimator on {} repaired row(s) from {:?}",
        records.len(),
        args.input
    );
    Ok(())
}

/// Fits the estimator, or returns `None` when the table is too small or the
/// normal-equations system is degenerate (all rows identical, say). Training
/// failure is a signal to the caller, never an error.
pub fn fit_estimator(records: &[CleanRecord]) -> Option<Estimator> {
    if records.len() < MIN_TRAINING_ROWS {
        return None;
    }
    let mut normal = [[0.0f64; 4]; 4];
    let mut rhs = [0.0f64; 4];
    for record in records {
        let x = features(record.quantity, record.price_per_unit);
        for i in 0..4 {
            rhs[i] += x[i] * record.total_spent;
            for j in 0..4 {
                normal[i][j] += x[i] * x[j];
            }
        }
    }
    let coefficients = solve(normal, rhs)?;
    Some(Estimator { coefficients })
}

fn features(quantity: f64, price_per_unit: f64) -> [f64; 4] {
    [1.0, quantity, price_per_unit, quantity * price_per_unit]
}

/// Gaussian elimination with partial pivoting; `None` on a singular system.
fn solve(mut a: [[f64; 4]; 4], mut b: [f64; 4]) -> Option<[f64; 4]> {
    for col in 0..4 {
        let pivot = (col..4).max_by(|&lhs, &rhs| a[lhs][col].abs().total_cmp(&a[rhs][col].abs()))?;
        if a[pivot][col].abs() < PIVOT_EPSILON {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..4 {
            let factor = a[row][col] / a[col][col];
            for k in col..4 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = [0.0f64; 4];
    for col in (0..4).rev() {
        let mut sum = b[col];
        for k in col + 1..4 {
            sum -= a[col][k] * x[k];
        }
        x[col] = sum / a[col][col];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_rows(count: usize) -> Vec<CleanRecord> {
        (0..count)
            .map(|i| {
                let quantity = (i % 10 + 1) as f64;
                let price = 2.0 + (i % 7) as f64 * 0.5;
                CleanRecord {
                    quantity,
                    price_per_unit: price,
                    total_spent: quantity * price,
                    item: "Latte".to_string(),
                    location: "Downtown".to_string(),
                    payment_method: "Card".to_string(),
                    transaction_date: None,
                }
            })
            .collect()
    }

    #[test]
    fn too_few_rows_yield_no_estimator() {
        assert!(fit_estimator(&training_rows(4)).is_none());
    }

    #[test]
    fn degenerate_training_data_yields_no_estimator() {
        let mut rows = training_rows(6);
        for row in &mut rows {
            row.quantity = 2.0;
            row.price_per_unit = 3.0;
            row.total_spent = 6.0;
        }
        assert!(fit_estimator(&rows).is_none());
    }

    #[test]
    fn consistent_products_predict_in_sample_values_closely() {
        let rows = training_rows(50);
        let estimator = fit_estimator(&rows).expect("estimator");
        for row in &rows {
            let predicted = estimator.predict(row.quantity, row.price_per_unit);
            assert!(
                (predicted - row.total_spent).abs() < 1e-3,
                "predicted {predicted} for expected {}",
                row.total_spent
            );
        }
    }

    #[test]
    fn prediction_is_deterministic_across_fits() {
        let rows = training_rows(30);
        let first = fit_estimator(&rows).expect("estimator");
        let second = fit_estimator(&rows).expect("estimator");
        assert_eq!(first.predict(3.0, 2.5), second.predict(3.0, 2.5));
    }
}
