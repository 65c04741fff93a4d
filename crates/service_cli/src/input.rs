//! Portfolio and matrix input files.

use serde::Deserialize;
use std::path::Path;

use folio_core::types::{PercentileSet, Position};

use crate::{CliError, Result};

#[derive(Debug, Deserialize)]
struct PercentileRecord {
    p5: f64,
    p25: f64,
    p50: f64,
    p75: f64,
    p95: f64,
}

#[derive(Debug, Deserialize)]
struct PositionRecord {
    id: String,
    quantity: f64,
    price: f64,
    percentiles: PercentileRecord,
}

#[derive(Debug, Deserialize)]
struct PortfolioFile {
    positions: Vec<PositionRecord>,
    #[serde(default)]
    correlation: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    cash_weight: f64,
    #[serde(default)]
    cash_rate: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MatrixFile {
    Bare(Vec<Vec<f64>>),
    Wrapped { correlation: Vec<Vec<f64>> },
}

/// A validated portfolio ready for the engine.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub positions: Vec<Position>,
    pub correlation: Vec<Vec<f64>>,
    pub cash_weight: f64,
    pub cash_rate: f64,
}

impl Portfolio {
    /// Parses the JSON portfolio format.
    ///
    /// A missing `correlation` means uncorrelated positions.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: PortfolioFile = serde_json::from_str(content)?;
        let positions = file
            .positions
            .into_iter()
            .map(|record| {
                let p = record.percentiles;
                let percentiles = PercentileSet::new(p.p5, p.p25, p.p50, p.p75, p.p95)?;
                Ok(Position::new(record.id, record.quantity, record.price, percentiles)?)
            })
            .collect::<Result<Vec<_>>>()?;

        let correlation = file
            .correlation
            .unwrap_or_else(|| identity_rows(positions.len()));

        Ok(Self {
            positions,
            correlation,
            cash_weight: file.cash_weight,
            cash_rate: file.cash_rate,
        })
    }

    /// Reads a portfolio file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json_str(&read_input(path)?)
    }
}

/// Reads a correlation matrix, either a bare array of rows or an object
/// with a `correlation` field.
pub fn load_matrix(path: &Path) -> Result<Vec<Vec<f64>>> {
    parse_matrix(&read_input(path)?)
}

fn parse_matrix(content: &str) -> Result<Vec<Vec<f64>>> {
    Ok(match serde_json::from_str(content)? {
        MatrixFile::Bare(rows) => rows,
        MatrixFile::Wrapped { correlation } => correlation,
    })
}

fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

fn identity_rows(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = r#"{
        "positions": [
            {"id": "AAPL", "quantity": 10, "price": 190.0,
             "percentiles": {"p5": -0.25, "p25": 0.0, "p50": 0.08, "p75": 0.16, "p95": 0.35}},
            {"id": "TLT", "quantity": -5, "price": 95.0,
             "percentiles": {"p5": -0.12, "p25": -0.02, "p50": 0.03, "p75": 0.07, "p95": 0.15}}
        ],
        "correlation": [[1.0, -0.3], [-0.3, 1.0]],
        "cash_weight": 0.05,
        "cash_rate": 0.04
    }"#;

    #[test]
    fn test_parse_portfolio() {
        let portfolio = Portfolio::from_json_str(BOOK).unwrap();
        assert_eq!(portfolio.positions.len(), 2);
        assert_eq!(portfolio.positions[1].market_value(), -475.0);
        assert_eq!(portfolio.correlation[0][1], -0.3);
        assert_eq!(portfolio.cash_weight, 0.05);
    }

    #[test]
    fn test_missing_correlation_is_identity() {
        let json = r#"{"positions": [
            {"id": "A", "quantity": 1, "price": 1,
             "percentiles": {"p5": -0.1, "p25": 0.0, "p50": 0.05, "p75": 0.1, "p95": 0.2}},
            {"id": "B", "quantity": 1, "price": 1,
             "percentiles": {"p5": -0.1, "p25": 0.0, "p50": 0.05, "p75": 0.1, "p95": 0.2}}
        ]}"#;
        let portfolio = Portfolio::from_json_str(json).unwrap();
        assert_eq!(portfolio.correlation, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(portfolio.cash_weight, 0.0);
    }

    #[test]
    fn test_unordered_percentiles_are_rejected() {
        let json = r#"{"positions": [
            {"id": "A", "quantity": 1, "price": 1,
             "percentiles": {"p5": 0.3, "p25": 0.0, "p50": 0.05, "p75": 0.1, "p95": 0.2}}
        ]}"#;
        assert!(matches!(
            Portfolio::from_json_str(json),
            Err(CliError::Engine(_))
        ));
    }

    #[test]
    fn test_matrix_shapes() {
        assert_eq!(parse_matrix("[[1.0]]").unwrap(), vec![vec![1.0]]);
        assert_eq!(
            parse_matrix(r#"{"correlation": [[1.0, 0.2], [0.2, 1.0]]}"#).unwrap()[1][0],
            0.2
        );
        assert!(matches!(parse_matrix("{}"), Err(CliError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Portfolio::load(Path::new("no/such/book.json"));
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }
}
