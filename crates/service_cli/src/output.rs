//! Report rendering: JSON, CSV and box-drawn tables.

use chrono::Utc;
use clap::ValueEnum;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::Result;

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Full result as pretty-printed JSON.
    Json,
    /// One CSV section per table.
    Csv,
    /// Human-readable tables.
    #[default]
    Table,
}

/// A titled table of pre-formatted cells.
#[derive(Debug, Clone)]
pub struct Table {
    title: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_headers(title: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            title: title.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }
        widths
    }

    /// Renders the table with box-drawing characters.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let widths = self.widths();
        let rule = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("{}{}{}", left, segments.join(mid), right)
        };
        let line = |cells: &[String]| {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let cell = cells.get(i).map(String::as_str).unwrap_or("");
                    format!(" {:<width$} ", cell, width = *w)
                })
                .collect();
            format!("│{}│", padded.join("│"))
        };

        writeln!(out, "\n{}", self.title)?;
        writeln!(out, "{}", rule("┌", "┬", "┐"))?;
        writeln!(out, "{}", line(&self.headers))?;
        writeln!(out, "{}", rule("├", "┼", "┤"))?;
        if self.rows.is_empty() {
            writeln!(out, "{}", line(&["(no data)".to_string()]))?;
        }
        for row in &self.rows {
            writeln!(out, "{}", line(row))?;
        }
        writeln!(out, "{}", rule("└", "┴", "┘"))
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    command: &'a str,
    generated_at: String,
    result: &'a T,
}

/// Writes a report in the requested format.
///
/// JSON serialises `value` in full; CSV and table output use `tables`.
pub fn emit<T: Serialize, W: Write>(
    format: OutputFormat,
    command: &str,
    value: &T,
    tables: &[Table],
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let envelope = Envelope {
                command,
                generated_at: Utc::now().to_rfc3339(),
                result: value,
            };
            serde_json::to_writer_pretty(&mut *out, &envelope)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(&mut *out);
            for table in tables {
                writer.write_record([format!("# {}", table.title)])?;
                writer.write_record(&table.headers)?;
                for row in &table.rows {
                    writer.write_record(row)?;
                }
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            for table in tables {
                table.render(out)?;
            }
        }
    }
    Ok(())
}

/// Opens the report destination: a file if given, otherwise stdout.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// Formats a return as a percentage.
pub fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Formats a currency amount.
pub fn money(value: f64) -> String {
    format!("{:.2}", value)
}

/// Formats a plain number.
pub fn num(value: f64) -> String {
    format!("{:.4}", value)
}
