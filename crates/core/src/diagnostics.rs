//! Batch-level data-quality diagnostics.
//!
//! Non-fatal conditions never abort a batch; they accumulate here so the
//! caller can judge whether the output quality is acceptable.

use crate::types::SchemaMapping;
use serde::{Deserialize, Serialize};

/// Data-quality outcome of one processed batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchDiagnostics {
    /// Raw rows received.
    pub rows_in: usize,
    /// Records surviving normalization (price repair and time parsing).
    pub records_normalized: usize,
    /// Zero or missing prices replaced with the previous valid price.
    pub zero_price_repairs: usize,
    /// Records dropped because no prior valid price existed.
    pub dropped_unpriced: usize,
    /// Records whose time literal was unrecognized and defaulted to midnight.
    pub defaulted_times: usize,
    /// Records dropped because a recognized literal named an invalid
    /// wall-clock value.
    pub dropped_times: usize,
    /// Bars with open == high == low == close; a high count signals
    /// under-sampled input.
    pub degenerate_bars: usize,
    /// The totalvolume column was replaced by a running sum of bar volume.
    pub cumulative_volume_fallback: bool,
    /// The totalamount column was replaced by a running sum of bar amount.
    pub cumulative_amount_fallback: bool,
    /// Reference/limit prices were derived from the session open rather
    /// than authoritative exchange data.
    pub approximate_reference_prices: bool,
    /// How each canonical field was resolved.
    pub mapping: SchemaMapping,
}

impl BatchDiagnostics {
    /// Records dropped across all stages.
    pub fn dropped_records(&self) -> usize {
        self.dropped_unpriced + self.dropped_times
    }

    /// Canonical fields that used fallback derivation.
    pub fn derived_fields(&self) -> Vec<&str> {
        self.mapping.derived_fields()
    }
}
