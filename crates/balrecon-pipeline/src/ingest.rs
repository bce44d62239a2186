//! Snapshot ingestion from delimited balance exports.
//!
//! Exports are read with every column as text and coerced explicitly, so a
//! client code such as `007` keeps its leading zeros and a malformed balance
//! is reported with its row instead of silently becoming a string column.

use crate::config::{ColumnMapping, ReconConfig};
use balrecon_traits::{Date, ReconError, Result, Snapshot, SnapshotSide, columns};
use polars::prelude::*;
use regex::Regex;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static DATE_IN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(\d{4})-?(\d{2})-?(\d{2})(?:\D|$)").expect("date pattern compiles")
});

/// Reads one snapshot export from disk.
///
/// When `as_of` is `None` the business date is inferred from the file name
/// (see [`infer_snapshot_date`]).
pub fn read_snapshot(
    path: impl AsRef<Path>,
    side: SnapshotSide,
    config: &ReconConfig,
    as_of: Option<Date>,
) -> Result<Snapshot> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let as_of = as_of.or_else(|| infer_snapshot_date(path));
    debug!(%side, path = %path.display(), bytes = bytes.len(), "reading snapshot");
    parse_snapshot(bytes, side, config, as_of)
}

/// Reads one snapshot export from any reader.
pub fn read_snapshot_from_reader<R: Read>(
    mut reader: R,
    side: SnapshotSide,
    config: &ReconConfig,
    as_of: Option<Date>,
) -> Result<Snapshot> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_snapshot(bytes, side, config, as_of)
}

fn parse_snapshot(
    bytes: Vec<u8>,
    side: SnapshotSide,
    config: &ReconConfig,
    as_of: Option<Date>,
) -> Result<Snapshot> {
    let separator = config.separator_byte()?;

    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        // exports never quote fields; a literal `"` is part of the value
        .map_parse_options(|opts| opts.with_separator(separator).with_quote_char(None))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    let data = normalise(&raw, side, &config.columns)?;
    info!(%side, rows = data.height(), as_of = ?as_of, "snapshot loaded");
    Ok(Snapshot::new(data, side, as_of))
}

/// Maps a raw all-text export onto the canonical snapshot columns.
fn normalise(raw: &DataFrame, side: SnapshotSide, mapping: &ColumnMapping) -> Result<DataFrame> {
    let code_col = require_column(raw, side, &mapping.client_code)?;
    let name_col = require_column(raw, side, &mapping.client_name)?;
    let sales_col = require_column(raw, side, &mapping.sales_id)?;
    let balance_col = require_column(raw, side, &mapping.balance)?;
    let rate_col = find_column(raw, &mapping.interest_rate);

    let codes = text_values(raw, &code_col)?;
    let names = text_values(raw, &name_col)?;
    let sales = text_values(raw, &sales_col)?;
    let balances = numeric_values(raw, side, &balance_col)?;
    let rates = match rate_col {
        Some(name) => numeric_values(raw, side, &name)?,
        None => {
            debug!(%side, column = %mapping.interest_rate, "no interest rate column, fee tiers default to Normal");
            vec![None; raw.height()]
        }
    };

    let keep: Vec<usize> = codes
        .iter()
        .enumerate()
        .filter_map(|(i, code)| code.as_ref().map(|_| i))
        .collect();

    let dropped = raw.height() - keep.len();
    if dropped > 0 {
        warn!(%side, dropped, "dropping rows without a client code");
    }

    let pick = |values: &[Option<String>]| -> Vec<Option<String>> {
        keep.iter().map(|&i| values[i].clone()).collect()
    };
    let pick_num =
        |values: &[Option<f64>]| -> Vec<Option<f64>> { keep.iter().map(|&i| values[i]).collect() };

    let df = df! {
        columns::CUSTCODE => pick(&codes),
        columns::CUSTNAME => pick(&names),
        columns::SALESID => pick(&sales),
        columns::BALANCE => pick_num(&balances),
        columns::INTRATE => pick_num(&rates),
    }?;

    Ok(df)
}

/// Finds a header, ignoring surrounding whitespace in the export.
fn find_column(raw: &DataFrame, wanted: &str) -> Option<String> {
    let wanted = wanted.trim();
    raw.get_column_names()
        .iter()
        .find(|name| name.trim() == wanted)
        .map(|name| name.to_string())
}

fn require_column(raw: &DataFrame, side: SnapshotSide, wanted: &str) -> Result<String> {
    find_column(raw, wanted).ok_or_else(|| ReconError::MissingColumn {
        snapshot: side,
        column: wanted.to_string(),
    })
}

/// Trimmed text cells; empty cells become null.
fn text_values(raw: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = raw.column(name)?.cast(&DataType::String)?;
    let values = column
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

fn numeric_values(raw: &DataFrame, side: SnapshotSide, name: &str) -> Result<Vec<Option<f64>>> {
    text_values(raw, name)?
        .into_iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            None => Ok(None),
            Some(text) => parse_amount(&text)
                .map(Some)
                .ok_or_else(|| ReconError::InvalidValue {
                    snapshot: side,
                    column: name.trim().to_string(),
                    row: i + 1,
                    value: text,
                }),
        })
        .collect()
}

/// Parses an exported amount.
///
/// Accepts thousands separators (`1,234.50`), an explicit sign and
/// accounting negatives (`(1,234)`). Returns `None` for anything that is not
/// a finite number.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (negated, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };

    let cleaned: String = body.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negated { -value } else { value })
}

/// Infers a business date from a file name.
///
/// Looks for `YYYYMMDD` or `YYYY-MM-DD` in the file stem and returns the
/// first one that is a real calendar date.
pub fn infer_snapshot_date(path: &Path) -> Option<Date> {
    let stem = path.file_stem()?.to_str()?;

    DATE_IN_NAME.captures_iter(stem).find_map(|caps| {
        let year = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2)?.as_str().parse().ok()?;
        let day = caps.get(3)?.as_str().parse().ok()?;
        Date::from_ymd_opt(year, month, day)
    })
}

/// Parses a `YYYY-MM-DD` business date given by the user.
pub fn parse_snapshot_date(text: &str) -> Result<Date> {
    Date::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| ReconError::InvalidDate(format!("{text:?} (expected YYYY-MM-DD): {e}")))
}
