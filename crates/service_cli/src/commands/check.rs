//! Check command implementation
//!
//! Prints the resolved configuration and runs a small smoke simulation.

use tracing::info;

use folio_core::types::{PercentileSet, Position};
use folio_risk::run_simulation;

use crate::config::FolioConfig;
use crate::Result;

const SMOKE_PATHS: usize = 2_000;

/// Run the check command
pub fn run(config: &FolioConfig) -> Result<()> {
    println!("folio {}", env!("CARGO_PKG_VERSION"));
    println!("  Available cores:  {}", num_cpus::get());
    println!("  Log level:        {}", config.log_level);
    println!("  Paths:            {}", config.engine.n_paths);
    println!("  Sampling:         {}", config.engine.sampling);
    println!("  Fat tails:        {}", config.engine.fat_tail);
    match config.engine.n_workers {
        Some(n) => println!("  Workers:          {}", n),
        None => println!("  Workers:          auto"),
    }
    println!("  Swap fraction:    {}", config.optimization.swap_fraction);
    println!("  Validated swaps:  {}", config.optimization.top_k);

    config.simulation_config(0.0, 0.0)?;
    config.optimization.validate()?;

    let mut smoke = config.clone();
    smoke.engine.n_paths = SMOKE_PATHS;
    let sim_config = smoke.simulation_config(0.0, 0.0)?;
    let positions = vec![
        Position::new("SMOKE_A", 1.0, 100.0, PercentileSet::new(-0.2, 0.0, 0.08, 0.16, 0.3)?)?,
        Position::new("SMOKE_B", 1.0, 100.0, PercentileSet::new(-0.1, 0.01, 0.04, 0.07, 0.15)?)?,
    ];
    let correlation = vec![vec![1.0, 0.3], vec![0.3, 1.0]];
    let result = run_simulation(&positions, &correlation, &sim_config)?;

    info!(elapsed_ms = result.diagnostics.elapsed_ms, "smoke simulation finished");
    println!(
        "  Smoke run:        {} paths, mean return {:.2}%",
        result.summary.n_paths,
        result.summary.mean_return * 100.0
    );
    println!("\nAll checks passed");
    Ok(())
}
