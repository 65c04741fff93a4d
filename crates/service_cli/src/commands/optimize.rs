//! Optimize command implementation
//!
//! Risk decomposition, risk-parity weights and the ranked swap search,
//! with the top swaps validated by simulation.

use std::io::Write;
use std::path::Path;
use tracing::info;

use folio_risk::{run_optimization, OptimizationResult};

use crate::config::FolioConfig;
use crate::input::Portfolio;
use crate::output::{emit, num, open_output, pct, OutputFormat, Table};
use crate::Result;

/// Run the optimize command
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
        top_k = config.optimization.top_k,
        validation_paths = config.optimization.validation_paths,
        "starting optimisation"
    );

    let result = run_optimization(
        &book.positions,
        &book.correlation,
        &sim_config,
        &config.optimization,
    )?;
    let mut out = open_output(output)?;
    emit(format, "optimize", &result, &tables(&result), &mut out)?;
    out.flush()?;
    Ok(())
}

/// Builds the report tables for an optimisation result.
pub fn tables(result: &OptimizationResult) -> Vec<Table> {
    let decomposition = &result.decomposition;
    let mut tables = Vec::new();

    let mut portfolio = Table::new("Portfolio", &["Metric", "Analytic", "Simulated"]);
    let analytic = &decomposition.portfolio;
    let simulated = &result.baseline_simulated;
    portfolio.push(vec![
        "Expected return".into(),
        pct(analytic.expected_return),
        pct(simulated.expected_return),
    ]);
    portfolio.push(vec![
        "Volatility".into(),
        pct(analytic.volatility),
        pct(simulated.volatility),
    ]);
    portfolio.push(vec!["Sharpe".into(), num(analytic.sharpe), num(simulated.sharpe)]);
    tables.push(portfolio);

    let mut risk = Table::new(
        "Risk decomposition",
        &["Id", "Weight", "Return", "Vol", "MCTR", "Risk contrib", "Corr", "iSharpe"],
    );
    for p in &decomposition.positions {
        risk.push(vec![
            p.id.clone(),
            pct(p.weight),
            pct(p.expected_return),
            pct(p.volatility),
            num(p.mctr),
            pct(p.risk_contribution),
            num(p.correlation_to_portfolio),
            num(p.incremental_sharpe),
        ]);
    }
    tables.push(risk);

    let parity = &result.risk_parity;
    let mut parity_table = Table::new(
        format!(
            "Risk parity ({} iterations, {})",
            parity.iterations,
            if parity.converged { "converged" } else { "not converged" }
        ),
        &["Id", "Current", "Parity", "Risk contrib"],
    );
    for (i, p) in decomposition.positions.iter().enumerate() {
        parity_table.push(vec![
            p.id.clone(),
            pct(p.weight),
            pct(parity.weights[i]),
            pct(parity.risk_contributions[i]),
        ]);
    }
    tables.push(parity_table);

    let mut swaps = Table::new(
        "Top swaps",
        &["Sell", "Buy", "Amount", "dReturn", "dVol", "dSharpe", "Sim dSharpe"],
    );
    for v in &result.validations {
        let c = &v.candidate;
        swaps.push(vec![
            c.sell_id.clone(),
            c.buy_id.clone(),
            pct(c.amount),
            pct(c.delta.delta_return),
            pct(c.delta.delta_volatility),
            num(c.delta.delta_sharpe),
            num(v.simulated_delta_sharpe),
        ]);
    }
    tables.push(swaps);

    tables
}
