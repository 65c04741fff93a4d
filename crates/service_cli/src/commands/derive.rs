//! Derive command implementation
//!
//! Shows the distribution parameters implied by five percentiles and the
//! percentiles those parameters reproduce.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use folio_core::distribution::DistributionParams;
use folio_core::types::PercentileSet;
use folio_risk::derive_distribution;

use crate::output::{emit, num, open_output, pct, OutputFormat, Table};
use crate::Result;

#[derive(Debug, Serialize)]
struct DeriveOutput {
    input: PercentileSet,
    params: DistributionParams,
    implied: PercentileSet,
}

/// Run the derive command
pub fn run(
    percentiles: [f64; 5],
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let [p5, p25, p50, p75, p95] = percentiles;
    let input = PercentileSet::new(p5, p25, p50, p75, p95)?;
    let params = derive_distribution(&input);
    let result = DeriveOutput {
        input,
        params,
        implied: params.implied_percentiles(),
    };

    let mut shape = Table::new("Distribution", &["Parameter", "Value"]);
    shape.push(vec!["mu".into(), pct(params.mu)]);
    shape.push(vec!["sigma".into(), pct(params.sigma)]);
    shape.push(vec!["skew".into(), num(params.skew)]);
    shape.push(vec!["tail df".into(), format!("{:.0}", params.tail_df)]);

    let mut round_trip = Table::new("Percentiles", &["Level", "Input", "Implied"]);
    let labels = ["p5", "p25", "p50", "p75", "p95"];
    for ((label, a), b) in labels
        .iter()
        .zip(result.input.as_array())
        .zip(result.implied.as_array())
    {
        round_trip.push(vec![label.to_string(), pct(a), pct(b)]);
    }

    let mut out = open_output(output)?;
    emit(format, "derive", &result, &[shape, round_trip], &mut out)?;
    out.flush()?;
    Ok(())
}
