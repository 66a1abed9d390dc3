//! Core data types for the tickbar resampling engine.

use chrono::{Duration, NaiveDateTime, Timelike};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Price type with ordering support.
pub type Price = OrderedFloat<f64>;

/// Number of order-book levels carried on each side.
pub const DEPTH_LEVELS: usize = 5;

/// Truncate a timestamp to its minute boundary.
///
/// Seconds and sub-second components are discarded, never rounded.
#[inline]
pub fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts - Duration::seconds(i64::from(ts.second()))
        - Duration::nanoseconds(i64::from(ts.nanosecond()))
}

/// Side indicator attached to a trade print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    /// Buyer-initiated (`B` flag).
    Buy,
    /// Seller-initiated (`S` flag).
    Sell,
    /// Flag present but neither buy nor sell.
    Neutral,
    /// No side indicator column in the source.
    Unknown,
}

/// One order-book level: resting price and volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// Level price; absent when the source reports no quote at this level.
    pub price: Option<f64>,
    /// Standing volume at the level.
    pub volume: f64,
}

/// Five bid and five ask levels of standing order-book interest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub bids: [DepthLevel; DEPTH_LEVELS],
    pub asks: [DepthLevel; DEPTH_LEVELS],
}

impl DepthSnapshot {
    /// Total standing bid volume across all levels.
    #[inline]
    pub fn total_bid_volume(&self) -> f64 {
        self.bids.iter().map(|l| l.volume).sum()
    }

    /// Total standing ask volume across all levels.
    #[inline]
    pub fn total_ask_volume(&self) -> f64 {
        self.asks.iter().map(|l| l.volume).sum()
    }
}

/// How a canonical field was resolved from the source batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSource {
    /// Read directly from a source column.
    Column(String),
    /// Derived by a named fallback rule.
    Derived(String),
}

/// One-to-one table from canonical field name to its source, built once
/// per batch and attached to the output as metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMapping {
    entries: BTreeMap<String, FieldSource>,
}

impl SchemaMapping {
    /// Record how a canonical field was resolved.
    pub fn insert(&mut self, canonical: &str, source: FieldSource) {
        self.entries.insert(canonical.to_string(), source);
    }

    /// Provenance of a canonical field, if it was resolved at all.
    pub fn source(&self, canonical: &str) -> Option<&FieldSource> {
        self.entries.get(canonical)
    }

    /// Whether a canonical field was resolved.
    pub fn contains(&self, canonical: &str) -> bool {
        self.entries.contains_key(canonical)
    }

    /// Whether a canonical field came from a fallback derivation.
    pub fn is_derived(&self, canonical: &str) -> bool {
        matches!(self.entries.get(canonical), Some(FieldSource::Derived(_)))
    }

    /// Canonical fields that used fallback derivation.
    pub fn derived_fields(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, src)| matches!(src, FieldSource::Derived(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (canonical, source) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSource)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One normalized exchange print/snapshot.
///
/// Immutable once constructed; later stages only derive aggregates from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRecord {
    /// Absolute timestamp, anchored to the trading date.
    pub timestamp: NaiveDateTime,
    /// Original arrival index; deterministic tiebreak for equal timestamps.
    pub sequence: u64,
    /// Last trade price, non-zero after repair.
    pub price: f64,
    /// Per-print traded volume (possibly derived from the cumulative series).
    pub trade_volume: f64,
    /// Per-print traded amount (possibly derived from the cumulative series).
    pub trade_amount: f64,
    /// Session-cumulative volume as reported by the source.
    pub total_volume: Option<f64>,
    /// Session-cumulative amount as reported by the source.
    pub total_amount: Option<f64>,
    /// Open interest as reported by the source.
    pub open_interest: Option<f64>,
    /// Side indicator.
    pub side: TradeSide,
    /// Free-text open/close intent flag.
    pub open_close: Option<String>,
    /// Buy-side share of `trade_volume`, fixed at mapping time.
    pub buy_volume: f64,
    /// Sell-side share of `trade_volume`, fixed at mapping time.
    pub sell_volume: f64,
    /// Per-row trading date (`YYYYMMDD`), taking precedence over the batch fallback.
    pub trading_date: Option<u32>,
    /// True when the time literal was unrecognized and defaulted to midnight.
    pub suspect_time: bool,
    /// Order-book snapshot carried by this record.
    pub depth: DepthSnapshot,
}

/// One minute window for one symbol-day.
///
/// Constructed by the bar reducer, then extended in place by the
/// sequential enricher; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    /// Trading date as `YYYYMMDD`.
    pub trading_date: u32,
    /// Contract symbol (e.g. "T1803").
    pub symbol: String,
    /// Window start, truncated to the minute.
    pub window_start: NaiveDateTime,
    /// First price in arrival order.
    pub open: f64,
    /// Maximum price over the window.
    pub high: f64,
    /// Minimum price over the window.
    pub low: f64,
    /// Last price in arrival order.
    pub close: f64,
    /// Sum of per-print volumes inside the window.
    pub volume: f64,
    /// Sum of per-print amounts inside the window.
    pub amount: f64,
    /// Buy-side volume over the window.
    pub buy_volume: f64,
    /// Sell-side volume over the window.
    pub sell_volume: f64,
    /// Session-cumulative volume as of window end. Source snapshot when
    /// available; filled in by the enricher otherwise.
    pub total_volume: Option<f64>,
    /// Session-cumulative amount as of window end.
    pub total_amount: Option<f64>,
    /// Open interest at window end.
    pub open_interest: f64,
    /// Open-interest delta vs the previous bar; 0 on the first bar.
    pub position_change: f64,
    /// Number of records in the window.
    pub tick_count: u32,
    /// Long-open prints in the window.
    pub open_long_count: u32,
    /// Short-open prints in the window.
    pub open_short_count: u32,
    /// Long-close prints in the window.
    pub close_long_count: u32,
    /// Short-close prints in the window.
    pub close_short_count: u32,
    /// Last-observed depth levels within the window.
    pub depth: DepthSnapshot,
    /// (bid depth - ask depth) / (bid depth + ask depth), clamped to [-1, 1].
    pub order_rate: f64,
    /// bid depth - ask depth.
    pub order_diff: f64,
    /// Volume-vs-baseline ratio; a pipeline-supplied placeholder.
    pub volume_ratio: f64,
    /// True for the 21:00-03:00 night session.
    pub is_night: bool,
    /// Product code: leading alphabetic prefix of the symbol, upper-cased.
    pub security_id: String,
    /// Previous close, approximated from the session open.
    pub pre_close_price: f64,
    /// Settlement price, approximated by the bar close.
    pub settle_price: f64,
    /// Previous settlement, approximated from the session open.
    pub pre_settle_price: f64,
    /// Upper price limit (pre-settle +10%).
    pub price_up_limit: f64,
    /// Lower price limit (pre-settle -10%).
    pub price_down_limit: f64,
}

impl Bar {
    /// O = H = L = C: the shape every single-tick minute produces.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.open == self.high && self.high == self.low && self.low == self.close
    }
}
