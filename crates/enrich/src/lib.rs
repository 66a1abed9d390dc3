//! Sequential enrichment for the tickbar resampling engine.
//!
//! This crate handles the cross-window bar metrics:
//! - Cumulative total fallback (all-or-nothing per column)
//! - Position change and night-session flagging
//! - Order-book imbalance
//! - Approximate reference and limit prices

pub mod enricher;

pub use enricher::{enrich_bars, is_night_hour, security_id, VOLUME_RATIO_PLACEHOLDER};
