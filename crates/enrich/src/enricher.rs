//! Sequential bar enrichment.
//!
//! A single forward pass over the ordered bar sequence of one symbol-day.
//! Each step depends only on the current and immediately preceding bar, or
//! on session-wide constants established from the first bar.

use chrono::Timelike;
use tickbar_core::{Bar, BatchContext, BatchDiagnostics};
use tracing::debug;

/// Placeholder for the volume-vs-baseline ratio.
///
/// The metric is never computed against historical data; the intended
/// baseline window and source are unspecified, so the pipeline supplies
/// this constant instead.
pub const VOLUME_RATIO_PLACEHOLDER: f64 = 1.0;

/// Price-limit band around the previous settlement.
const PRICE_LIMIT_BAND: f64 = 0.10;

/// Night session covers 21:00 through 02:59 local; the boundary is fixed,
/// not per-exchange.
#[inline]
pub fn is_night_hour(hour: u32) -> bool {
    hour >= 21 || hour < 3
}

/// Product code: leading alphabetic prefix of the symbol, upper-cased.
/// `"UNKNOWN"` when the symbol has no alphabetic prefix.
pub fn security_id(symbol: &str) -> String {
    let prefix: String = symbol
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if prefix.is_empty() {
        "UNKNOWN".to_string()
    } else {
        prefix.to_uppercase()
    }
}

/// Enrich the ordered bar sequence in place.
///
/// The cumulative columns follow an all-or-nothing policy: if any bar
/// lacks a source cumulative value, the whole column is replaced by a
/// running sum of the per-minute field; otherwise the source snapshots
/// stay untouched. Reference and limit prices are approximated from the
/// session open and flagged as such in the diagnostics.
pub fn enrich_bars(bars: &mut [Bar], ctx: &BatchContext, diag: &mut BatchDiagnostics) {
    if bars.is_empty() {
        return;
    }

    let volume_fallback = bars.iter().any(|b| b.total_volume.is_none());
    let amount_fallback = bars.iter().any(|b| b.total_amount.is_none());
    if volume_fallback {
        debug!("source totalvolume incomplete, replacing column with running sum");
    }
    if amount_fallback {
        debug!("source totalamount incomplete, replacing column with running sum");
    }

    let session_open = bars[0].open;
    let pre_settle = session_open;
    let up_limit = pre_settle * (1.0 + PRICE_LIMIT_BAND);
    let down_limit = pre_settle * (1.0 - PRICE_LIMIT_BAND);
    let security = security_id(&ctx.symbol);

    let mut running_volume = 0.0;
    let mut running_amount = 0.0;
    let mut prev_open_interest: Option<f64> = None;

    for bar in bars.iter_mut() {
        running_volume += bar.volume;
        running_amount += bar.amount;
        if volume_fallback {
            bar.total_volume = Some(running_volume);
        }
        if amount_fallback {
            bar.total_amount = Some(running_amount);
        }

        bar.position_change = match prev_open_interest {
            Some(prev) => bar.open_interest - prev,
            None => 0.0,
        };
        prev_open_interest = Some(bar.open_interest);

        bar.is_night = is_night_hour(bar.window_start.hour());
        bar.security_id = security.clone();

        let total_buy = bar.depth.total_bid_volume();
        let total_sell = bar.depth.total_ask_volume();
        bar.order_diff = total_buy - total_sell;
        let denominator = total_buy + total_sell;
        bar.order_rate = if denominator > 0.0 {
            (bar.order_diff / denominator).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        bar.volume_ratio = VOLUME_RATIO_PLACEHOLDER;

        bar.pre_close_price = session_open;
        bar.pre_settle_price = pre_settle;
        bar.settle_price = bar.close;
        bar.price_up_limit = up_limit;
        bar.price_down_limit = down_limit;
    }

    diag.cumulative_volume_fallback = volume_fallback;
    diag.cumulative_amount_fallback = amount_fallback;
    diag.approximate_reference_prices = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use tickbar_core::DepthSnapshot;

    fn ctx() -> BatchContext {
        BatchContext::new("20230101", "T1803").unwrap()
    }

    fn make_bar(h: u32, m: u32, open: f64, close: f64) -> Bar {
        Bar {
            trading_date: 20230101,
            symbol: "T1803".to_string(),
            window_start: NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 10.0,
            amount: 1000.0,
            buy_volume: 5.0,
            sell_volume: 5.0,
            total_volume: Some(100.0),
            total_amount: Some(10000.0),
            open_interest: 0.0,
            position_change: 0.0,
            tick_count: 2,
            open_long_count: 0,
            open_short_count: 0,
            close_long_count: 0,
            close_short_count: 0,
            depth: DepthSnapshot::default(),
            order_rate: 0.0,
            order_diff: 0.0,
            volume_ratio: 0.0,
            is_night: false,
            security_id: String::new(),
            pre_close_price: 0.0,
            settle_price: 0.0,
            pre_settle_price: 0.0,
            price_up_limit: 0.0,
            price_down_limit: 0.0,
        }
    }

    #[test]
    fn test_position_change() {
        let mut bars = vec![
            make_bar(9, 30, 100.0, 101.0),
            make_bar(9, 31, 101.0, 102.0),
            make_bar(9, 32, 102.0, 100.0),
        ];
        bars[0].open_interest = 2000.0;
        bars[1].open_interest = 2050.0;
        bars[2].open_interest = 2030.0;

        let mut diag = BatchDiagnostics::default();
        enrich_bars(&mut bars, &ctx(), &mut diag);

        assert!((bars[0].position_change - 0.0).abs() < 1e-10);
        assert!((bars[1].position_change - 50.0).abs() < 1e-10);
        assert!((bars[2].position_change - (-20.0)).abs() < 1e-10);
    }

    #[test]
    fn test_cumulative_fallback_all_or_nothing() {
        let mut bars = vec![
            make_bar(9, 30, 100.0, 101.0),
            make_bar(9, 31, 101.0, 102.0),
        ];
        // One missing source value forces the whole column to a running sum.
        bars[1].total_volume = None;

        let mut diag = BatchDiagnostics::default();
        enrich_bars(&mut bars, &ctx(), &mut diag);

        assert!(diag.cumulative_volume_fallback);
        assert_eq!(bars[0].total_volume, Some(10.0));
        assert_eq!(bars[1].total_volume, Some(20.0));
        // The amount column was fully sourced and stays untouched.
        assert!(!diag.cumulative_amount_fallback);
        assert_eq!(bars[0].total_amount, Some(10000.0));
    }

    #[test]
    fn test_source_cumulative_kept_when_complete() {
        let mut bars = vec![
            make_bar(9, 30, 100.0, 101.0),
            make_bar(9, 31, 101.0, 102.0),
        ];
        bars[0].total_volume = Some(500.0);
        bars[1].total_volume = Some(520.0);

        let mut diag = BatchDiagnostics::default();
        enrich_bars(&mut bars, &ctx(), &mut diag);

        assert!(!diag.cumulative_volume_fallback);
        assert_eq!(bars[0].total_volume, Some(500.0));
        assert_eq!(bars[1].total_volume, Some(520.0));
    }

    #[test]
    fn test_order_imbalance() {
        let mut bars = vec![make_bar(9, 30, 100.0, 101.0)];
        bars[0].depth.bids[0].volume = 30.0;
        bars[0].depth.bids[1].volume = 10.0;
        bars[0].depth.asks[0].volume = 20.0;

        let mut diag = BatchDiagnostics::default();
        enrich_bars(&mut bars, &ctx(), &mut diag);

        assert!((bars[0].order_diff - 20.0).abs() < 1e-10);
        // (40 - 20) / (40 + 20)
        assert_relative_eq!(bars[0].order_rate, 1.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_order_rate_zero_denominator() {
        let mut bars = vec![make_bar(9, 30, 100.0, 101.0)];
        let mut diag = BatchDiagnostics::default();
        enrich_bars(&mut bars, &ctx(), &mut diag);

        assert!((bars[0].order_rate - 0.0).abs() < 1e-10);
        assert!((bars[0].order_diff - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_night_session_boundaries() {
        assert!(is_night_hour(21));
        assert!(is_night_hour(23));
        assert!(is_night_hour(0));
        assert!(is_night_hour(2));
        assert!(!is_night_hour(3));
        assert!(!is_night_hour(20));

        let mut bars = vec![make_bar(21, 0, 100.0, 101.0), make_bar(9, 30, 100.0, 101.0)];
        let mut diag = BatchDiagnostics::default();
        enrich_bars(&mut bars, &ctx(), &mut diag);
        assert!(bars[0].is_night);
        assert!(!bars[1].is_night);
    }

    #[test]
    fn test_security_id_extraction() {
        assert_eq!(security_id("T1803"), "T");
        assert_eq!(security_id("rb2105"), "RB");
        assert_eq!(security_id("IF2406"), "IF");
        assert_eq!(security_id("1803"), "UNKNOWN");
        assert_eq!(security_id(""), "UNKNOWN");
    }

    #[test]
    fn test_reference_prices_from_session_open() {
        let mut bars = vec![
            make_bar(9, 30, 100.0, 101.0),
            make_bar(9, 31, 101.0, 102.0),
        ];
        let mut diag = BatchDiagnostics::default();
        enrich_bars(&mut bars, &ctx(), &mut diag);

        assert!((bars[1].pre_close_price - 100.0).abs() < 1e-10);
        assert!((bars[1].pre_settle_price - 100.0).abs() < 1e-10);
        assert!((bars[1].settle_price - 102.0).abs() < 1e-10);
        assert_relative_eq!(bars[1].price_up_limit, 110.0, epsilon = 1e-10);
        assert_relative_eq!(bars[1].price_down_limit, 90.0, epsilon = 1e-10);
        assert!(diag.approximate_reference_prices);
        assert!((bars[0].volume_ratio - VOLUME_RATIO_PLACEHOLDER).abs() < 1e-10);
    }
}
