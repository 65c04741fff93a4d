//! Simulate command implementation
//!
//! Runs the scenario engine over a portfolio file and reports percentiles,
//! tail risk, loss probabilities and per-position attribution.

use std::io::Write;
use std::path::Path;
use tracing::info;

use folio_risk::{run_simulation, SimulationResult};

use crate::config::FolioConfig;
use crate::input::Portfolio;
use crate::output::{emit, money, num, open_output, pct, OutputFormat, Table};
use crate::Result;

/// Run the simulate command
pub fn run(
    config: &FolioConfig,
    portfolio: &Path,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let book = Portfolio::load(portfolio)?;
    let sim_config = config.simulation_config(book.cash_weight, book.cash_rate)?;
    info!(
        positions = book.positions.len(),
        n_paths = sim_config.n_paths(),
        sampling = %sim_config.sampling(),
        fat_tail = %sim_config.fat_tail(),
        "starting simulation"
    );

    let result = run_simulation(&book.positions, &book.correlation, &sim_config)?;
    let mut out = open_output(output)?;
    emit(format, "simulate", &result, &tables(&result), &mut out)?;
    out.flush()?;
    Ok(())
}

/// Builds the report tables for a simulation result.
pub fn tables(result: &SimulationResult) -> Vec<Table> {
    let summary = &result.summary;
    let mut tables = Vec::new();

    let mut overview = Table::new("Summary", &["Metric", "Value"]);
    overview.push(vec!["Paths".into(), summary.n_paths.to_string()]);
    overview.push(vec!["Starting value".into(), money(summary.starting_value)]);
    overview.push(vec!["Mean return".into(), pct(summary.mean_return)]);
    overview.push(vec!["Std deviation".into(), pct(summary.std_dev)]);
    overview.push(vec!["Std error".into(), pct(summary.std_error)]);
    overview.push(vec!["Mean value".into(), money(summary.mean_value)]);
    overview.push(vec!["Analytic return".into(), pct(result.analytic.expected_return)]);
    overview.push(vec!["Analytic volatility".into(), pct(result.analytic.volatility)]);
    overview.push(vec!["Sharpe".into(), num(result.analytic.sharpe)]);
    tables.push(overview);

    let mut percentiles = Table::new("Percentiles", &["Level", "Return", "Value", "Drawdown"]);
    for ((r, v), d) in summary
        .return_percentiles
        .iter()
        .zip(&summary.value_percentiles)
        .zip(&summary.drawdown_percentiles)
    {
        percentiles.push(vec![
            format!("p{}", (r.level * 100.0).round()),
            pct(r.value),
            money(v.value),
            pct(d.value),
        ]);
    }
    tables.push(percentiles);

    let mut tail = Table::new(
        "Tail risk",
        &["Confidence", "VaR", "CVaR", "VaR value", "CVaR value"],
    );
    for t in &summary.tail_risk {
        tail.push(vec![
            pct(t.confidence),
            pct(t.var_return),
            pct(t.cvar_return),
            money(t.var_value),
            money(t.cvar_value),
        ]);
    }
    tables.push(tail);

    let mut losses = Table::new("Loss probabilities", &["Event", "Probability"]);
    for p in &summary.loss_probabilities {
        losses.push(vec![format!("return < {}", pct(p.threshold)), pct(p.probability)]);
    }
    if let Some(dd) = &summary.drawdown_exceedance {
        losses.push(vec![format!("drawdown > {}", pct(dd.threshold)), pct(dd.probability)]);
    }
    tables.push(losses);

    let mut positions = Table::new(
        "Positions",
        &["Id", "Weight", "Mu", "Sigma", "Skew", "Tail df", "Sim mean", "Sim vol"],
    );
    for p in &result.positions {
        positions.push(vec![
            p.id.clone(),
            pct(p.weight),
            pct(p.params.mu),
            pct(p.params.sigma),
            num(p.params.skew),
            format!("{:.0}", p.params.tail_df),
            pct(p.simulated_mean),
            pct(p.simulated_volatility),
        ]);
    }
    tables.push(positions);

    if let Some(attribution) = &result.attribution {
        let mut headers = vec!["Level".to_string(), "Portfolio".to_string()];
        headers.extend(result.positions.iter().map(|p| p.id.clone()));
        headers.push("Cash".to_string());
        let mut table = Table::with_headers("Attribution", headers);
        for row in &attribution.rows {
            let mut cells = vec![
                format!("p{}", (row.level * 100.0).round()),
                pct(row.portfolio_return),
            ];
            cells.extend(row.contributions.iter().map(|c| pct(*c)));
            cells.push(pct(row.cash_contribution));
            table.push(cells);
        }
        tables.push(table);
    }

    let d = &result.diagnostics;
    let mut diagnostics = Table::new("Diagnostics", &["Metric", "Value"]);
    diagnostics.push(vec!["Workers".into(), d.n_workers.to_string()]);
    diagnostics.push(vec!["Anomalies".into(), d.anomalies.to_string()]);
    diagnostics.push(vec!["Repair iterations".into(), d.repair_iterations.to_string()]);
    diagnostics.push(vec!["Correlation repaired".into(), d.correlation_repaired.to_string()]);
    diagnostics.push(vec!["Identity fallback".into(), d.correlation_fallback.to_string()]);
    diagnostics.push(vec![
        "Shared tail df".into(),
        d.shared_tail_df.map_or_else(|| "-".to_string(), |df| format!("{:.0}", df)),
    ]);
    diagnostics.push(vec!["Elapsed (ms)".into(), d.elapsed_ms.to_string()]);
    tables.push(diagnostics);

    tables
}
