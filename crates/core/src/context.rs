//! Batch context and caller-supplied options.
//!
//! The original trading-date/contract-code fallbacks are threaded through
//! every stage as one immutable value instead of ambient state.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Immutable per-batch context passed explicitly into every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchContext {
    /// Trading date anchoring time-of-day literals.
    pub trading_date: NaiveDate,
    /// The same date as a `YYYYMMDD` integer, the output-row form.
    pub trading_date_num: u32,
    /// Contract symbol (e.g. "T1803").
    pub symbol: String,
}

impl BatchContext {
    /// Build a context from a `YYYYMMDD` date string and a symbol.
    pub fn new(trading_date: &str, symbol: impl Into<String>) -> Result<Self> {
        let trimmed = trading_date.trim();
        let date = parse_trading_date(trimmed)?;
        let num: u32 = trimmed
            .parse()
            .map_err(|_| Error::config(format!("non-numeric trading date `{trimmed}`")))?;

        Ok(Self {
            trading_date: date,
            trading_date_num: num,
            symbol: symbol.into(),
        })
    }
}

/// Parse a `YYYYMMDD` trading-date string into a calendar date.
pub fn parse_trading_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d")
        .map_err(|_| Error::config(format!("invalid trading date `{s}`, expected YYYYMMDD")))
}

/// Caller-supplied inputs for one batch.
///
/// All fields are optional; the pipeline fills gaps from the rows
/// themselves or from the source filename.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Fallback trading date (`YYYYMMDD`). Per-row values take precedence.
    pub trading_date: Option<String>,
    /// Contract symbol. Extracted from `source_file` when absent.
    pub symbol: Option<String>,
    /// Name of the file the rows came from, used for symbol extraction.
    pub source_file: Option<String>,
}
