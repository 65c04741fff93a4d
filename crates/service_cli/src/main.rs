//! folio - Command Line Portfolio Risk Simulation
//!
//! Operational entry point for the folio workspace.
//!
//! # Commands
//!
//! - `folio simulate --portfolio <file>` - Simulate one-year return scenarios
//! - `folio optimize --portfolio <file>` - Risk decomposition and swap search
//! - `folio repair --matrix <file>` - Repair a correlation matrix
//! - `folio derive --p5 .. --p95 ..` - Distribution parameters from percentiles
//! - `folio check` - Check configuration and run a smoke simulation
//!
//! # Architecture
//!
//! As the service layer of the workspace, this crate wires configuration,
//! logging and file formats around `folio_risk`.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use folio_engine::mc::{FatTailMethod, SamplingMethod};

mod commands;
mod config;
mod error;
mod input;
mod output;

pub use error::{CliError, Result};

use config::{CliOverrides, FolioConfig, LogLevel};
use output::OutputFormat;

/// Portfolio risk simulation CLI
#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "folio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Engine settings that override `folio.toml` and `FOLIO_*`.
#[derive(Args, Debug, Default)]
struct EngineArgs {
    /// Number of simulated paths
    #[arg(short = 'n', long)]
    paths: Option<usize>,

    /// Sampling family (pseudo, quasi)
    #[arg(long)]
    sampling: Option<SamplingMethod>,

    /// Fat-tail method (student_t, gaussian_copula)
    #[arg(long)]
    fat_tail: Option<FatTailMethod>,

    /// Worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed for pseudo-random sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Report P(drawdown > threshold)
    #[arg(long)]
    drawdown_threshold: Option<f64>,
}

/// Output destination and format.
#[derive(Args, Debug)]
struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one-year return scenarios for a portfolio
    Simulate {
        /// Path to portfolio file (JSON)
        #[arg(short, long)]
        portfolio: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Decompose risk and rank rebalancing swaps
    Optimize {
        /// Path to portfolio file (JSON)
        #[arg(short, long)]
        portfolio: PathBuf,

        /// Number of swaps validated by simulation
        #[arg(long)]
        top_k: Option<usize>,

        #[command(flatten)]
        engine: EngineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Repair a correlation matrix (JSON)
    Repair {
        /// Path to matrix file
        #[arg(short, long)]
        matrix: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Derive distribution parameters from five percentiles
    Derive {
        #[arg(long, allow_hyphen_values = true)]
        p5: f64,
        #[arg(long, allow_hyphen_values = true)]
        p25: f64,
        #[arg(long, allow_hyphen_values = true)]
        p50: f64,
        #[arg(long, allow_hyphen_values = true)]
        p75: f64,
        #[arg(long, allow_hyphen_values = true)]
        p95: f64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check configuration and run a smoke simulation
    Check,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Simulate { .. } => "simulate",
            Commands::Optimize { .. } => "optimize",
            Commands::Repair { .. } => "repair",
            Commands::Derive { .. } => "derive",
            Commands::Check => "check",
        }
    }

    fn overrides(&self) -> CliOverrides {
        match self {
            Commands::Simulate { engine, .. } | Commands::Optimize { engine, .. } => CliOverrides {
                n_paths: engine.paths,
                sampling: engine.sampling,
                fat_tail: engine.fat_tail,
                n_workers: engine.workers,
                seed: engine.seed,
                drawdown_threshold: engine.drawdown_threshold,
                log_level: None,
            },
            _ => CliOverrides::default(),
        }
    }
}

fn load_config(cli: &Cli) -> Result<FolioConfig> {
    let explicit = cli.config != Path::new("folio.toml");
    let mut config = FolioConfig::load(&cli.config, explicit)?.with_env_override()?;
    let mut overrides = cli.command.overrides();
    if cli.verbose {
        overrides.log_level = Some(LogLevel::Debug);
    }
    config.merge_with_cli(&overrides);
    if let Commands::Optimize { top_k: Some(k), .. } = &cli.command {
        config.optimization.top_k = *k;
    }
    Ok(config)
}

fn init_tracing(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter_str()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli, config: FolioConfig) -> Result<()> {
    match cli.command {
        Commands::Simulate {
            portfolio, output, ..
        } => commands::simulate::run(&config, &portfolio, output.format, output.output.as_deref()),
        Commands::Optimize {
            portfolio, output, ..
        } => commands::optimize::run(&config, &portfolio, output.format, output.output.as_deref()),
        Commands::Repair { matrix, output } => {
            commands::repair::run(&matrix, output.format, output.output.as_deref())
        }
        Commands::Derive {
            p5,
            p25,
            p50,
            p75,
            p95,
            output,
        } => commands::derive::run(
            [p5, p25, p50, p75, p95],
            output.format,
            output.output.as_deref(),
        ),
        Commands::Check => commands::check::run(&config),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).context("failed to load configuration")?;

    init_tracing(config.log_level);
    debug!(?config, "configuration resolved");

    let name = cli.command.name();
    run(cli, config).with_context(|| format!("folio {} failed", name))?;
    info!(command = name, "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_simulate_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "folio",
            "simulate",
            "--portfolio",
            "book.json",
            "--paths",
            "5000",
            "--sampling",
            "pseudo",
            "--fat-tail",
            "gaussian_copula",
            "--format",
            "json",
        ])
        .unwrap();

        let overrides = cli.command.overrides();
        assert_eq!(overrides.n_paths, Some(5_000));
        assert_eq!(overrides.sampling, Some(SamplingMethod::Pseudo));
        assert_eq!(overrides.fat_tail, Some(FatTailMethod::GaussianCopula));
        match cli.command {
            Commands::Simulate { output, .. } => assert_eq!(output.format, OutputFormat::Json),
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_derive_accepts_negative_percentiles() {
        let cli = Cli::try_parse_from([
            "folio", "derive", "--p5", "-0.2", "--p25", "0.02", "--p50", "0.1", "--p75", "0.18",
            "--p95", "0.35",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Derive { p5, .. } if p5 == -0.2));
    }
}
