//! Batch orchestration for the tickbar resampling engine.
//!
//! Wires the stages strictly in order: schema mapping and time resolution,
//! minute bucketing and bar reduction, then sequential enrichment. Fatal
//! schema or context errors reject the whole batch; everything else
//! accumulates into the diagnostics.
//!
//! Batches are independent symbol-days with no shared mutable state, so
//! callers may process many of them concurrently without locking; inside
//! one batch every stage needs the full ordered output of the previous
//! one, so no intra-batch concurrency exists.

pub mod context;
pub mod rows;

pub use context::{resolve_context, symbol_from_filename};
pub use rows::{bar_to_row, RowValue, COLUMNS};

use serde::{Deserialize, Serialize};
use tickbar_core::{Bar, BatchDiagnostics, BatchOptions, Result};
use tickbar_ingestion::RawRow;
use tracing::info;

/// Result of one processed batch: the ordered bar sequence plus its
/// data-quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    pub bars: Vec<Bar>,
    pub diagnostics: BatchDiagnostics,
}

/// Process one symbol-day batch end to end.
///
/// An empty input batch, or one that empties out during repair, yields
/// `Ok` with no bars — that is not a schema error. Re-running on the same
/// input produces identical output.
pub fn process_batch(rows: &[RawRow], options: &BatchOptions) -> Result<BatchOutput> {
    let mut diagnostics = BatchDiagnostics::default();

    if rows.is_empty() {
        return Ok(BatchOutput {
            bars: Vec::new(),
            diagnostics,
        });
    }

    let ctx = context::resolve_context(rows, options)?;
    let records = tickbar_ingestion::normalize_batch(rows, &ctx, &mut diagnostics)?;
    let mut bars = tickbar_aggregation::build_bars(&records, &ctx, &mut diagnostics);
    tickbar_enrich::enrich_bars(&mut bars, &ctx, &mut diagnostics);

    info!(
        "{}: {} rows -> {} bars ({} records dropped, {} degenerate)",
        ctx.symbol,
        diagnostics.rows_in,
        bars.len(),
        diagnostics.dropped_records(),
        diagnostics.degenerate_bars
    );

    Ok(BatchOutput {
        bars,
        diagnostics,
    })
}
