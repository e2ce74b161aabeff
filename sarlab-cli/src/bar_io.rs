//! CSV bar loading and result writing for the CLI.
//!
//! Input CSV needs `timestamp` (or `date`), `high` and `low` columns; any
//! other columns are ignored. Prices are parsed as exact decimals straight
//! from the text.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sarlab_core::{Bar, SarResult};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tracing::warn;

/// Output encoding for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Deserialize)]
struct BarRow {
    #[serde(alias = "date")]
    timestamp: String,
    #[serde(with = "rust_decimal::serde::str")]
    high: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    low: Decimal,
}

#[derive(Debug, Serialize)]
struct ResultRow {
    timestamp: String,
    sar: Option<String>,
    is_reversal: Option<bool>,
}

impl From<&SarResult> for ResultRow {
    fn from(r: &SarResult) -> Self {
        Self {
            timestamp: r.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            sar: r.sar.map(|v| v.normalize().to_string()),
            is_reversal: r.is_reversal,
        }
    }
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD HH:MM:SS`.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts);
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("unrecognized timestamp '{raw}'"))?;
    Ok(date.and_time(NaiveTime::MIN))
}

/// Read bars from CSV, in file order.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();

    for (i, row) in csv_reader.deserialize::<BarRow>().enumerate() {
        // header is line 1
        let line = i + 2;
        let row = row.with_context(|| format!("parse CSV line {line}"))?;
        let timestamp =
            parse_timestamp(&row.timestamp).with_context(|| format!("CSV line {line}"))?;
        bars.push(Bar::new(timestamp, row.high, row.low));
    }

    let inverted = bars.iter().filter(|b| !b.is_sane()).count();
    if inverted > 0 {
        warn!(inverted, "bars with high below low");
    }

    Ok(bars)
}

pub fn read_bars_file(path: &Path) -> Result<Vec<Bar>> {
    let file =
        std::fs::File::open(path).with_context(|| format!("open input '{}'", path.display()))?;
    read_bars(file).with_context(|| format!("read bars from '{}'", path.display()))
}

/// Write results as CSV (`timestamp,sar,is_reversal`, empty fields for
/// unestablished rows) or a JSON array.
pub fn write_results<W: Write>(
    results: &[SarResult],
    format: OutputFormat,
    mut writer: W,
) -> Result<()> {
    let rows: Vec<ResultRow> = results.iter().map(ResultRow::from).collect();
    match format {
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for row in &rows {
                csv_writer.serialize(row)?;
            }
            csv_writer.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &rows)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
