//! Bar reduction: folding one minute group into a canonical bar.

use crate::bucket::{bucket_by_minute, MinuteGroup};
use tickbar_core::{Bar, BatchContext, BatchDiagnostics, Price, TickRecord};
use tracing::debug;

/// Open/close intent markers.
///
/// CFFEX L2 feeds report the flag as Chinese free text; the double-open
/// and double-close markers count toward both the long and the short
/// variant of the action.
const LONG_OPEN_MARKS: [&str; 2] = ["多头开仓", "双开仓"];
const SHORT_OPEN_MARKS: [&str; 2] = ["空头开仓", "双开仓"];
const LONG_CLOSE_MARKS: [&str; 2] = ["多头平仓", "双平仓"];
const SHORT_CLOSE_MARKS: [&str; 2] = ["空头平仓", "双平仓"];

/// Fold one minute's ordered record group into a bar.
///
/// Open and close come from the first and last record in arrival order;
/// cumulative fields, open interest and the depth snapshot are
/// point-in-time values of the last record, never summed. Fields owned by
/// the sequential enricher are left at their zero values.
pub fn reduce_group(group: &MinuteGroup<'_>, ctx: &BatchContext) -> Bar {
    let ticks = group.ticks;
    let first = &ticks[0];
    let last = &ticks[ticks.len() - 1];

    let high = ticks
        .iter()
        .map(|t| Price::from(t.price))
        .max()
        .map(|p| p.into_inner())
        .unwrap_or(first.price);
    let low = ticks
        .iter()
        .map(|t| Price::from(t.price))
        .min()
        .map(|p| p.into_inner())
        .unwrap_or(first.price);

    let (open_long, open_short, close_long, close_short) = count_open_close(ticks);

    Bar {
        trading_date: first.trading_date.unwrap_or(ctx.trading_date_num),
        symbol: ctx.symbol.clone(),
        window_start: group.minute,
        open: first.price,
        high,
        low,
        close: last.price,
        volume: ticks.iter().map(|t| t.trade_volume).sum(),
        amount: ticks.iter().map(|t| t.trade_amount).sum(),
        buy_volume: ticks.iter().map(|t| t.buy_volume).sum(),
        sell_volume: ticks.iter().map(|t| t.sell_volume).sum(),
        total_volume: last.total_volume,
        total_amount: last.total_amount,
        open_interest: last.open_interest.unwrap_or(0.0),
        position_change: 0.0,
        tick_count: ticks.len() as u32,
        open_long_count: open_long,
        open_short_count: open_short,
        close_long_count: close_long,
        close_short_count: close_short,
        depth: last.depth,
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

/// Reduce an ordered record sequence into its minute bars.
///
/// Buckets and folds in one pass; degenerate (O=H=L=C) bars are counted
/// so callers can detect under-sampled input.
pub fn build_bars(
    records: &[TickRecord],
    ctx: &BatchContext,
    diag: &mut BatchDiagnostics,
) -> Vec<Bar> {
    let groups = bucket_by_minute(records);
    let mut bars = Vec::with_capacity(groups.len());

    for group in &groups {
        let bar = reduce_group(group, ctx);
        if bar.is_degenerate() {
            diag.degenerate_bars += 1;
        }
        bars.push(bar);
    }

    if diag.degenerate_bars > 0 {
        debug!(
            "{} of {} bars are degenerate single-price windows",
            diag.degenerate_bars,
            bars.len()
        );
    }
    bars
}

/// Count open/close intent per category by substring match.
///
/// Records without the flag contribute nothing; a batch with no flag
/// column yields all four counts as zero on every bar.
fn count_open_close(ticks: &[TickRecord]) -> (u32, u32, u32, u32) {
    let mut open_long = 0;
    let mut open_short = 0;
    let mut close_long = 0;
    let mut close_short = 0;

    for tick in ticks {
        if let Some(tag) = tick.open_close.as_deref() {
            if LONG_OPEN_MARKS.iter().any(|m| tag.contains(m)) {
                open_long += 1;
            }
            if SHORT_OPEN_MARKS.iter().any(|m| tag.contains(m)) {
                open_short += 1;
            }
            if LONG_CLOSE_MARKS.iter().any(|m| tag.contains(m)) {
                close_long += 1;
            }
            if SHORT_CLOSE_MARKS.iter().any(|m| tag.contains(m)) {
                close_short += 1;
            }
        }
    }

    (open_long, open_short, close_long, close_short)
}
