//! Batch context resolution.
//!
//! Explicit caller options win; otherwise the symbol is extracted from the
//! source filename and the trading date from the rows themselves.

use regex::Regex;
use tickbar_core::{BatchContext, BatchOptions, Error, Result};
use tickbar_ingestion::RawRow;
use tracing::{debug, warn};

/// Filename patterns a contract code is extracted from, tried in order.
/// The feed convention is `<PREFIX>_TAQ_<CODE>_<YYYYMM>.csv`
/// (e.g. `TFL2_TAQ_T1803_201801.csv`); the generic contract-code shapes
/// cover renamed files.
const SYMBOL_PATTERNS: &[&str] = &[
    r"(?i)TAQ_([A-Za-z0-9]+)_\d{6}",
    r"([A-Za-z]{1,2}\d{3,4})",
];

/// Extract a contract code from a source filename.
pub fn symbol_from_filename(filename: &str) -> Option<String> {
    for pattern in SYMBOL_PATTERNS {
        let re = Regex::new(pattern).ok()?;
        if let Some(m) = re.captures(filename).and_then(|caps| caps.get(1)) {
            return Some(m.as_str().to_uppercase());
        }
    }
    None
}

/// Upper-cased file stem, the last-resort symbol.
fn file_stem(filename: &str) -> Option<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let stem = name.split('.').next().unwrap_or(name);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_uppercase())
    }
}

/// First per-row trading date, normalized to `YYYYMMDD`.
fn trading_date_from_rows(rows: &[RawRow]) -> Option<String> {
    let first = rows.first()?;
    let value = first
        .iter()
        .find(|(k, _)| k.trim().to_lowercase() == "tradingdate")
        .map(|(_, v)| v.trim())?;
    let date = value.parse::<f64>().ok()?;
    if date <= 0.0 {
        return None;
    }
    Some(format!("{}", date as u32))
}

/// Establish the immutable batch context for one symbol-day.
///
/// The trading date anchors time-of-day literals; per-row values still
/// take precedence per bar downstream. Fails only when no trading date is
/// available from either the options or the rows.
pub fn resolve_context(rows: &[RawRow], options: &BatchOptions) -> Result<BatchContext> {
    let symbol = options
        .symbol
        .clone()
        .or_else(|| {
            options
                .source_file
                .as_deref()
                .and_then(symbol_from_filename)
        })
        .or_else(|| options.source_file.as_deref().and_then(file_stem))
        .unwrap_or_else(|| {
            warn!("no symbol available from options or filename, using UNKNOWN");
            "UNKNOWN".to_string()
        });

    let trading_date = match &options.trading_date {
        Some(date) => date.clone(),
        None => trading_date_from_rows(rows).ok_or_else(|| {
            Error::config("no trading date available from options or rows")
        })?,
    };

    let ctx = BatchContext::new(&trading_date, symbol)?;
    debug!("batch context: {} on {}", ctx.symbol, ctx.trading_date_num);
    Ok(ctx)
}
