//! Tick normalization for the tickbar resampling engine.
//!
//! This crate handles:
//! - Source column mapping into the canonical field set
//! - Per-print volume/amount derivation and price repair
//! - Buy/sell volume attribution
//! - Time literal resolution and chronological ordering

pub mod schema;
pub mod time;

pub use schema::{map_batch, MappedTick, RawRow};
pub use time::{resolve_batch, resolve_literal, TimeResolution};

use tickbar_core::{BatchContext, BatchDiagnostics, Result, TickRecord};

/// Normalize one raw batch end to end: schema mapping, then time
/// resolution and ordering.
pub fn normalize_batch(
    rows: &[RawRow],
    ctx: &BatchContext,
    diag: &mut BatchDiagnostics,
) -> Result<Vec<TickRecord>> {
    let mapped = schema::map_batch(rows, diag)?;
    Ok(time::resolve_batch(mapped, ctx, diag))
}
