//! Flat-row projection of bars.
//!
//! The persistence collaborator consumes bars as flat rows in a fixed
//! column order. Absent values substitute the type-appropriate zero or
//! null, so a projected row never misses a required column.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use tickbar_core::Bar;

/// Output column order: the contract with the storage collaborator.
pub const COLUMNS: [&str; 50] = [
    "TRADINGDATE",
    "SYMBOL",
    "TRADINGTIME",
    "OPEN",
    "HIGH",
    "LOW",
    "CLOSE",
    "VOLUME",
    "AMOUNT",
    "TOTALPOSITION",
    "POSITIONCHANGE",
    "SECURITYID",
    "BUYVOL",
    "SELLVOL",
    "TOTALVOLUME",
    "TOTALAMOUNT",
    "TICKCOUNT",
    "ISNIGHT",
    "SETTLEPRICE",
    "PRESETTLEPRICE",
    "PRICEUPLIMIT",
    "PRICEDOWNLIMIT",
    "PRE_CLOSE_PRICE",
    "ORDER_RATE",
    "ORDER_DIFF",
    "VOL_RATE",
    "OPEN_LONG_COUNT",
    "OPEN_SHORT_COUNT",
    "CLOSE_LONG_COUNT",
    "CLOSE_SHORT_COUNT",
    "BUYPRICE01",
    "BUYPRICE02",
    "BUYPRICE03",
    "BUYPRICE04",
    "BUYPRICE05",
    "SELLPRICE01",
    "SELLPRICE02",
    "SELLPRICE03",
    "SELLPRICE04",
    "SELLPRICE05",
    "BUYVOLUME01",
    "BUYVOLUME02",
    "BUYVOLUME03",
    "BUYVOLUME04",
    "BUYVOLUME05",
    "SELLVOLUME01",
    "SELLVOLUME02",
    "SELLVOLUME03",
    "SELLVOLUME04",
    "SELLVOLUME05",
];

/// One typed cell of a flat output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RowValue {
    Int(i64),
    Float(f64),
    Text(String),
    Time(NaiveDateTime),
    Null,
}

impl fmt::Display for RowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValue::Int(v) => write!(f, "{v}"),
            RowValue::Float(v) => write!(f, "{v}"),
            RowValue::Text(v) => write!(f, "{v}"),
            RowValue::Time(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            RowValue::Null => Ok(()),
        }
    }
}

/// Project one enriched bar into the fixed column order.
pub fn bar_to_row(bar: &Bar) -> Vec<RowValue> {
    let mut row = Vec::with_capacity(COLUMNS.len());

    row.push(RowValue::Int(i64::from(bar.trading_date)));
    row.push(RowValue::Text(bar.symbol.clone()));
    row.push(RowValue::Time(bar.window_start));
    row.push(RowValue::Float(bar.open));
    row.push(RowValue::Float(bar.high));
    row.push(RowValue::Float(bar.low));
    row.push(RowValue::Float(bar.close));
    row.push(RowValue::Float(bar.volume));
    row.push(RowValue::Float(bar.amount));
    row.push(RowValue::Float(bar.open_interest));
    row.push(RowValue::Float(bar.position_change));
    row.push(RowValue::Text(bar.security_id.clone()));
    row.push(RowValue::Float(bar.buy_volume));
    row.push(RowValue::Float(bar.sell_volume));
    row.push(RowValue::Float(bar.total_volume.unwrap_or(0.0)));
    row.push(RowValue::Float(bar.total_amount.unwrap_or(0.0)));
    row.push(RowValue::Int(i64::from(bar.tick_count)));
    row.push(RowValue::Int(i64::from(bar.is_night)));
    row.push(RowValue::Float(bar.settle_price));
    row.push(RowValue::Float(bar.pre_settle_price));
    row.push(RowValue::Float(bar.price_up_limit));
    row.push(RowValue::Float(bar.price_down_limit));
    row.push(RowValue::Float(bar.pre_close_price));
    row.push(RowValue::Float(bar.order_rate));
    row.push(RowValue::Float(bar.order_diff));
    row.push(RowValue::Float(bar.volume_ratio));
    row.push(RowValue::Int(i64::from(bar.open_long_count)));
    row.push(RowValue::Int(i64::from(bar.open_short_count)));
    row.push(RowValue::Int(i64::from(bar.close_long_count)));
    row.push(RowValue::Int(i64::from(bar.close_short_count)));

    for level in &bar.depth.bids {
        row.push(level.price.map_or(RowValue::Null, RowValue::Float));
    }
    for level in &bar.depth.asks {
        row.push(level.price.map_or(RowValue::Null, RowValue::Float));
    }
    for level in &bar.depth.bids {
        row.push(RowValue::Float(level.volume));
    }
    for level in &bar.depth.asks {
        row.push(RowValue::Float(level.volume));
    }

    debug_assert_eq!(row.len(), COLUMNS.len());
    row
}
