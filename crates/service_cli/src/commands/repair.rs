//! Repair command implementation
//!
//! Makes a correlation matrix valid and positive definite, reporting how
//! far it had to move.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

use folio_risk::repair_correlation_with_report;

use crate::input::load_matrix;
use crate::output::{emit, num, open_output, OutputFormat, Table};
use crate::{CliError, Result};

#[derive(Debug, Serialize)]
struct RepairOutput {
    correlation: Vec<Vec<f64>>,
    iterations: usize,
    was_modified: bool,
    is_positive_definite: bool,
}

/// Run the repair command
pub fn run(matrix: &Path, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let raw = load_matrix(matrix)?;
    if raw.is_empty() {
        return Err(CliError::InvalidArgument(format!(
            "{} holds an empty matrix",
            matrix.display()
        )));
    }
    let report = repair_correlation_with_report(&raw)?;
    info!(
        dim = report.matrix.dim(),
        iterations = report.iterations,
        modified = report.was_modified,
        "correlation repaired"
    );

    let result = RepairOutput {
        correlation: report.matrix.to_rows(),
        iterations: report.iterations,
        was_modified: report.was_modified,
        is_positive_definite: report.is_positive_definite,
    };

    let headers: Vec<String> = std::iter::once(String::new())
        .chain((0..result.correlation.len()).map(|j| j.to_string()))
        .collect();
    let mut table = Table::with_headers("Repaired correlation", headers);
    for (i, row) in result.correlation.iter().enumerate() {
        let mut cells = vec![i.to_string()];
        cells.extend(row.iter().map(|v| num(*v)));
        table.push(cells);
    }

    let mut status = Table::new("Repair", &["Metric", "Value"]);
    status.push(vec!["Shrink iterations".into(), result.iterations.to_string()]);
    status.push(vec!["Modified".into(), result.was_modified.to_string()]);
    status.push(vec![
        "Positive definite".into(),
        result.is_positive_definite.to_string(),
    ]);

    let mut out = open_output(output)?;
    emit(format, "repair", &result, &[table, status], &mut out)?;
    out.flush()?;
    Ok(())
}
