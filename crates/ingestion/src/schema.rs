//! Schema mapping and field normalization.
//!
//! Translates arbitrary source column names into the canonical field set,
//! derives absent per-print fields from the cumulative series, repairs
//! zero/missing prices and fixes the buy/sell volume split.

use std::collections::HashMap;
use tickbar_core::{
    BatchDiagnostics, DepthLevel, DepthSnapshot, Error, FieldSource, Result, SchemaMapping,
    TradeSide, DEPTH_LEVELS,
};
use tracing::{debug, warn};

/// One raw source row: column name to raw value.
pub type RawRow = HashMap<String, String>;

/// One-to-one mapping from source column name to canonical field.
///
/// Source names are matched after lower-casing and trimming; unlisted
/// columns are ignored. The depth columns (`buyprice01`..`sellvolume05`)
/// map onto themselves and are handled separately.
const FIELD_ALIASES: &[(&str, &str)] = &[
    ("tradingtime", "time"),
    ("lastprice", "price"),
    ("tradevolume", "tradevolume"),
    ("tradeamount", "tradeamount"),
    ("totalvolume", "totalvolume"),
    ("totalamount", "totalamount"),
    ("totalposition", "open_interest"),
    ("buyorsell", "buy_sell"),
    ("openclose", "open_close"),
    ("tradingdate", "tradingdate"),
];

/// Depth column prefixes, each spanning levels 01..05.
const DEPTH_PREFIXES: &[&str] = &["buyprice", "sellprice", "buyvolume", "sellvolume"];

/// A mapped record prior to time resolution.
///
/// `time` is still the raw literal; the time resolver turns it into an
/// absolute timestamp and produces the final `TickRecord`.
#[derive(Debug, Clone)]
pub struct MappedTick {
    /// Raw time literal.
    pub time: String,
    /// Original arrival index.
    pub sequence: u64,
    /// Repaired, non-zero price.
    pub price: f64,
    pub trade_volume: f64,
    pub trade_amount: f64,
    pub total_volume: Option<f64>,
    pub total_amount: Option<f64>,
    pub open_interest: Option<f64>,
    pub side: TradeSide,
    pub open_close: Option<String>,
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub trading_date: Option<u32>,
    pub depth: DepthSnapshot,
}

/// Map one raw batch into normalized records.
///
/// Builds the schema mapping once, then walks the rows in arrival order
/// applying derivation fallbacks, price repair and the side split. Fails
/// only when a required canonical field (`time`, `price`) cannot be
/// resolved; every other condition is counted in the diagnostics.
pub fn map_batch(rows: &[RawRow], diag: &mut BatchDiagnostics) -> Result<Vec<MappedTick>> {
    diag.rows_in = rows.len();
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<RawRow> = rows.iter().map(normalize_row).collect();
    let mut mapping = build_mapping(&rows[0]);

    if !mapping.contains("time") {
        return Err(Error::MissingRequiredField("time"));
    }
    if !mapping.contains("price") {
        return Err(Error::MissingRequiredField("price"));
    }

    let derive_volume = !mapping.contains("tradevolume") && mapping.contains("totalvolume");
    let derive_amount = !mapping.contains("tradeamount") && mapping.contains("totalamount");
    if derive_volume {
        warn!("per-print volume column absent, deriving from totalvolume first differences");
        mapping.insert(
            "tradevolume",
            FieldSource::Derived("diff(totalvolume)".to_string()),
        );
    }
    if derive_amount {
        warn!("per-print amount column absent, deriving from totalamount first differences");
        mapping.insert(
            "tradeamount",
            FieldSource::Derived("diff(totalamount)".to_string()),
        );
    }

    let has_side = mapping.contains("buy_sell");
    if !has_side {
        debug!("no side indicator column, splitting every trade's volume evenly");
    }

    let mut ticks = Vec::with_capacity(rows.len());
    let mut last_valid_price: Option<f64> = None;
    let mut prev_total_volume: Option<f64> = None;
    let mut prev_total_amount: Option<f64> = None;

    for (idx, row) in rows.iter().enumerate() {
        let total_volume = number(row, &mapping, "totalvolume");
        let total_amount = number(row, &mapping, "totalamount");

        // Cumulative state advances for every row, dropped or not, so the
        // difference chain stays anchored to the source series.
        let trade_volume = if derive_volume {
            derive_increment(total_volume, &mut prev_total_volume)
        } else {
            number(row, &mapping, "tradevolume").unwrap_or(0.0)
        };
        let trade_amount = if derive_amount {
            derive_increment(total_amount, &mut prev_total_amount)
        } else {
            number(row, &mapping, "tradeamount").unwrap_or(0.0)
        };

        let price = match number(row, &mapping, "price") {
            Some(p) if p != 0.0 => {
                last_valid_price = Some(p);
                p
            }
            _ => match last_valid_price {
                Some(p) => {
                    diag.zero_price_repairs += 1;
                    p
                }
                None => {
                    diag.dropped_unpriced += 1;
                    continue;
                }
            },
        };

        let side = if has_side {
            classify_side(text(row, &mapping, "buy_sell"))
        } else {
            TradeSide::Unknown
        };
        let (buy_volume, sell_volume) = split_volume(side, trade_volume);

        ticks.push(MappedTick {
            time: text(row, &mapping, "time").unwrap_or("").to_string(),
            sequence: idx as u64,
            price,
            trade_volume,
            trade_amount,
            total_volume,
            total_amount,
            open_interest: number(row, &mapping, "open_interest"),
            side,
            open_close: text(row, &mapping, "open_close")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            buy_volume,
            sell_volume,
            trading_date: number(row, &mapping, "tradingdate").map(|d| d as u32),
            depth: parse_depth(row, &mapping),
        });
    }

    if diag.zero_price_repairs > 0 {
        warn!(
            "repaired {} zero or missing prices with the previous valid price",
            diag.zero_price_repairs
        );
    }
    if diag.dropped_unpriced > 0 {
        warn!(
            "dropped {} leading records with no valid price to repair from",
            diag.dropped_unpriced
        );
    }

    diag.mapping = mapping;
    Ok(ticks)
}

/// Lower-case and trim every column name of one row.
fn normalize_row(row: &RawRow) -> RawRow {
    row.iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v.clone()))
        .collect()
}

/// Resolve the one-to-one mapping table against the batch's column set.
fn build_mapping(first_row: &RawRow) -> SchemaMapping {
    let mut mapping = SchemaMapping::default();
    for (source, canonical) in FIELD_ALIASES {
        if first_row.contains_key(*source) {
            mapping.insert(canonical, FieldSource::Column(source.to_string()));
        }
    }
    for prefix in DEPTH_PREFIXES {
        for level in 1..=DEPTH_LEVELS {
            let name = format!("{prefix}0{level}");
            if first_row.contains_key(&name) {
                mapping.insert(&name, FieldSource::Column(name.clone()));
            }
        }
    }
    mapping
}

/// Raw text of a canonical field, when it maps to a source column.
fn text<'a>(row: &'a RawRow, mapping: &SchemaMapping, canonical: &str) -> Option<&'a str> {
    match mapping.source(canonical) {
        Some(FieldSource::Column(name)) => row.get(name).map(String::as_str),
        _ => None,
    }
}

/// Numeric value of a canonical field. Blank or unparseable values are absent.
fn number(row: &RawRow, mapping: &SchemaMapping, canonical: &str) -> Option<f64> {
    text(row, mapping, canonical).and_then(parse_decimal)
}

/// Lenient numeric parsing: blanks and garbage coerce to absent.
fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// First difference of a cumulative series, clipped at zero.
///
/// Cumulative series can carry rounding jitter; a negative step is a data
/// artifact, not a real decrease. The first observed value is its own
/// increment. Rows with no cumulative value contribute zero.
fn derive_increment(current: Option<f64>, prev: &mut Option<f64>) -> f64 {
    match (current, *prev) {
        (Some(cur), Some(p)) => {
            *prev = Some(cur);
            (cur - p).max(0.0)
        }
        (Some(cur), None) => {
            *prev = Some(cur);
            cur.max(0.0)
        }
        (None, _) => 0.0,
    }
}

/// Classify an explicit side indicator value.
fn classify_side(raw: Option<&str>) -> TradeSide {
    match raw.map(|s| s.trim().to_uppercase()) {
        Some(ref s) if s == "B" => TradeSide::Buy,
        Some(ref s) if s == "S" => TradeSide::Sell,
        _ => TradeSide::Neutral,
    }
}

/// Attribute per-print volume to the buy/sell sides.
///
/// An explicit side takes the full volume; a neutral or absent indicator
/// splits it evenly.
fn split_volume(side: TradeSide, trade_volume: f64) -> (f64, f64) {
    match side {
        TradeSide::Buy => (trade_volume, 0.0),
        TradeSide::Sell => (0.0, trade_volume),
        TradeSide::Neutral | TradeSide::Unknown => (trade_volume / 2.0, trade_volume / 2.0),
    }
}

/// Read the five bid and ask levels carried by one row.
///
/// A level missing from the source yields a null price and zero volume.
fn parse_depth(row: &RawRow, mapping: &SchemaMapping) -> DepthSnapshot {
    let mut depth = DepthSnapshot::default();
    for i in 0..DEPTH_LEVELS {
        let level = i + 1;
        depth.bids[i] = DepthLevel {
            price: number(row, mapping, &format!("buyprice0{level}")),
            volume: number(row, mapping, &format!("buyvolume0{level}")).unwrap_or(0.0),
        };
        depth.asks[i] = DepthLevel {
            price: number(row, mapping, &format!("sellprice0{level}")),
            volume: number(row, mapping, &format!("sellvolume0{level}")).unwrap_or(0.0),
        };
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn trade_rows(prices: &[&str]) -> Vec<RawRow> {
        prices
            .iter()
            .map(|p| row(&[("tradingtime", "09:30:00"), ("lastprice", p), ("tradevolume", "1")]))
            .collect()
    }

    #[test]
    fn test_missing_required_field_is_fatal() {
        let mut diag = BatchDiagnostics::default();
        let rows = vec![row(&[("lastprice", "100.0")])];
        let err = map_batch(&rows, &mut diag).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField("time")));

        let rows = vec![row(&[("tradingtime", "09:30:00")])];
        let err = map_batch(&rows, &mut diag).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField("price")));
    }

    #[test]
    fn test_column_names_normalized() {
        let mut diag = BatchDiagnostics::default();
        let rows = vec![row(&[("  TradingTime ", "09:30:00"), ("LastPrice", "100.5")])];
        let ticks = map_batch(&rows, &mut diag).unwrap();

        assert_eq!(ticks.len(), 1);
        assert!((ticks[0].price - 100.5).abs() < 1e-10);
        assert_eq!(
            diag.mapping.source("price"),
            Some(&FieldSource::Column("lastprice".to_string()))
        );
    }

    #[test]
    fn test_volume_derived_from_cumulative_diff() {
        let mut diag = BatchDiagnostics::default();
        let rows: Vec<RawRow> = [("100", "50"), ("101", "80"), ("102", "75"), ("103", "90")]
            .iter()
            .map(|(p, tv)| {
                row(&[("tradingtime", "09:30:00"), ("lastprice", p), ("totalvolume", tv)])
            })
            .collect();

        let ticks = map_batch(&rows, &mut diag).unwrap();
        let volumes: Vec<f64> = ticks.iter().map(|t| t.trade_volume).collect();

        // First record keeps its own cumulative value; the negative step
        // (80 -> 75) is clipped to zero.
        assert_eq!(volumes, vec![50.0, 30.0, 0.0, 15.0]);
        assert!(diag.mapping.is_derived("tradevolume"));
        assert_eq!(
            diag.mapping.source("tradevolume"),
            Some(&FieldSource::Derived("diff(totalvolume)".to_string()))
        );
    }

    #[test]
    fn test_explicit_volume_wins_over_derivation() {
        let mut diag = BatchDiagnostics::default();
        let rows = vec![row(&[
            ("tradingtime", "09:30:00"),
            ("lastprice", "100"),
            ("tradevolume", "7"),
            ("totalvolume", "500"),
        ])];

        let ticks = map_batch(&rows, &mut diag).unwrap();
        assert!((ticks[0].trade_volume - 7.0).abs() < 1e-10);
        assert!(!diag.mapping.is_derived("tradevolume"));
    }

    #[test]
    fn test_zero_price_repaired_from_previous() {
        let mut diag = BatchDiagnostics::default();
        let ticks = map_batch(&trade_rows(&["105", "0", "106"]), &mut diag).unwrap();

        let prices: Vec<f64> = ticks.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![105.0, 105.0, 106.0]);
        assert_eq!(diag.zero_price_repairs, 1);
        assert_eq!(diag.dropped_unpriced, 0);
    }

    #[test]
    fn test_leading_unpriced_records_dropped() {
        let mut diag = BatchDiagnostics::default();
        let ticks = map_batch(&trade_rows(&["0", "", "105", "0"]), &mut diag).unwrap();

        assert_eq!(ticks.len(), 2);
        assert_eq!(diag.dropped_unpriced, 2);
        assert_eq!(diag.zero_price_repairs, 1);
        // Sequence numbers keep the original arrival indices.
        assert_eq!(ticks[0].sequence, 2);
        assert_eq!(ticks[1].sequence, 3);
    }

    #[test]
    fn test_side_split_explicit_indicator() {
        let mut diag = BatchDiagnostics::default();
        let rows: Vec<RawRow> = [("B", "10"), ("s", "4"), ("", "6")]
            .iter()
            .map(|(side, tv)| {
                row(&[
                    ("tradingtime", "09:30:00"),
                    ("lastprice", "100"),
                    ("tradevolume", tv),
                    ("buyorsell", side),
                ])
            })
            .collect();

        let ticks = map_batch(&rows, &mut diag).unwrap();

        assert_eq!(ticks[0].side, TradeSide::Buy);
        assert!((ticks[0].buy_volume - 10.0).abs() < 1e-10);
        assert!((ticks[0].sell_volume - 0.0).abs() < 1e-10);

        assert_eq!(ticks[1].side, TradeSide::Sell);
        assert!((ticks[1].sell_volume - 4.0).abs() < 1e-10);

        // Present but unrecognized tag: split evenly.
        assert_eq!(ticks[2].side, TradeSide::Neutral);
        assert!((ticks[2].buy_volume - 3.0).abs() < 1e-10);
        assert!((ticks[2].sell_volume - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_side_split_without_indicator_column() {
        let mut diag = BatchDiagnostics::default();
        let rows = vec![row(&[
            ("tradingtime", "09:30:00"),
            ("lastprice", "100"),
            ("tradevolume", "10"),
        ])];

        let ticks = map_batch(&rows, &mut diag).unwrap();
        assert_eq!(ticks[0].side, TradeSide::Unknown);
        assert!((ticks[0].buy_volume - 5.0).abs() < 1e-10);
        assert!((ticks[0].sell_volume - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_depth_levels_parsed_independently() {
        let mut diag = BatchDiagnostics::default();
        let rows = vec![row(&[
            ("tradingtime", "09:30:00"),
            ("lastprice", "100"),
            ("buyprice01", "99.5"),
            ("buyvolume01", "12"),
            ("sellprice01", "100.5"),
            ("sellvolume01", "8"),
            ("buyprice03", "99.0"),
            ("buyvolume03", "20"),
        ])];

        let ticks = map_batch(&rows, &mut diag).unwrap();
        let depth = &ticks[0].depth;

        assert_eq!(depth.bids[0].price, Some(99.5));
        assert!((depth.bids[0].volume - 12.0).abs() < 1e-10);
        assert_eq!(depth.asks[0].price, Some(100.5));
        assert_eq!(depth.bids[2].price, Some(99.0));
        // Level 2 absent from the source: null price, zero volume.
        assert_eq!(depth.bids[1].price, None);
        assert!((depth.bids[1].volume - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_per_row_trading_date_captured() {
        let mut diag = BatchDiagnostics::default();
        let rows = vec![row(&[
            ("tradingtime", "09:30:00"),
            ("lastprice", "100"),
            ("tradingdate", "20180102"),
        ])];

        let ticks = map_batch(&rows, &mut diag).unwrap();
        assert_eq!(ticks[0].trading_date, Some(20180102));
    }

    #[test]
    fn test_empty_batch_is_ok() {
        let mut diag = BatchDiagnostics::default();
        let ticks = map_batch(&[], &mut diag).unwrap();
        assert!(ticks.is_empty());
        assert!(diag.mapping.is_empty());
    }
}
