//! Time literal resolution and chronological ordering.
//!
//! Source feeds encode the record time in several literal shapes; each is
//! anchored to the batch trading date and the records are then sorted by
//! `(timestamp, sequence)`. The arrival-index tiebreak matters: real feeds
//! emit multiple prints per timestamp and their relative order carries
//! open/high/low/close meaning.

use crate::schema::MappedTick;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tickbar_core::{BatchContext, BatchDiagnostics, Error, TickRecord};
use tracing::warn;

/// Accepted full date-time layouts for shape (a).
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Outcome of resolving one raw time literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeResolution {
    /// Literal matched a recognized shape and a valid wall-clock value.
    Parsed(NaiveDateTime),
    /// Literal matched no shape; defaulted to midnight of the trading date.
    Defaulted(NaiveDateTime),
    /// Literal matched a shape but named an invalid calendar value.
    Invalid,
}

/// Resolve one raw time literal against the batch trading date.
///
/// Shapes, in priority order: (a) a full date-time string, parsed as-is;
/// (b) a colon-separated time-of-day of at most 8 characters; (c) a
/// 6-digit `HHMMSS` string; (d) a 9-digit `HHMMSS` string with discarded
/// sub-second digits; (e) anything else defaults to midnight.
pub fn resolve_literal(raw: &str, trading_date: NaiveDate) -> TimeResolution {
    let s = raw.trim();

    if s.contains(':') {
        if s.len() > 8 {
            for fmt in DATETIME_FORMATS {
                if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
                    return TimeResolution::Parsed(ts);
                }
            }
            return TimeResolution::Invalid;
        }
        return match NaiveTime::parse_from_str(s, "%H:%M:%S") {
            Ok(t) => TimeResolution::Parsed(trading_date.and_time(t)),
            Err(_) => TimeResolution::Invalid,
        };
    }

    if s.len() == 14 && s.bytes().all(|b| b.is_ascii_digit()) {
        return match NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S") {
            Ok(ts) => TimeResolution::Parsed(ts),
            Err(_) => TimeResolution::Invalid,
        };
    }
    if s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()) {
        return hhmmss(s, trading_date);
    }
    if s.len() == 9 && s.bytes().all(|b| b.is_ascii_digit()) {
        // Sub-second digits are discarded, not rounded.
        return hhmmss(&s[..6], trading_date);
    }

    TimeResolution::Defaulted(trading_date.and_time(NaiveTime::MIN))
}

fn hhmmss(digits: &str, trading_date: NaiveDate) -> TimeResolution {
    let hms = (
        digits[0..2].parse::<u32>().ok(),
        digits[2..4].parse::<u32>().ok(),
        digits[4..6].parse::<u32>().ok(),
    );
    match hms {
        (Some(h), Some(m), Some(s)) => match NaiveTime::from_hms_opt(h, m, s) {
            Some(t) => TimeResolution::Parsed(trading_date.and_time(t)),
            None => TimeResolution::Invalid,
        },
        _ => TimeResolution::Invalid,
    }
}

/// Resolve every mapped record and establish the batch's total order.
///
/// Records with an invalid calendar value are dropped and counted;
/// unrecognized literals are defaulted to midnight, flagged suspect and
/// counted. The survivors are sorted by `(timestamp, sequence)`.
pub fn resolve_batch(
    ticks: Vec<MappedTick>,
    ctx: &BatchContext,
    diag: &mut BatchDiagnostics,
) -> Vec<TickRecord> {
    let mut records = Vec::with_capacity(ticks.len());

    for tick in ticks {
        let (timestamp, suspect_time) = match resolve_literal(&tick.time, ctx.trading_date) {
            TimeResolution::Parsed(ts) => (ts, false),
            TimeResolution::Defaulted(ts) => {
                diag.defaulted_times += 1;
                warn!(
                    "{}, record defaulted to midnight",
                    Error::time_format(&tick.time)
                );
                (ts, true)
            }
            TimeResolution::Invalid => {
                diag.dropped_times += 1;
                warn!("{}, record dropped", Error::time_format(&tick.time));
                continue;
            }
        };

        records.push(TickRecord {
            timestamp,
            sequence: tick.sequence,
            price: tick.price,
            trade_volume: tick.trade_volume,
            trade_amount: tick.trade_amount,
            total_volume: tick.total_volume,
            total_amount: tick.total_amount,
            open_interest: tick.open_interest,
            side: tick.side,
            open_close: tick.open_close,
            buy_volume: tick.buy_volume,
            sell_volume: tick.sell_volume,
            trading_date: tick.trading_date,
            suspect_time,
            depth: tick.depth,
        });
    }

    records.sort_by_key(|r| (r.timestamp, r.sequence));
    diag.records_normalized = records.len();
    records
}
