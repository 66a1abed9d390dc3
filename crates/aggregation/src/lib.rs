//! Minute bucketing and bar reduction for the tickbar resampling engine.
//!
//! This crate handles:
//! - Partitioning the ordered record sequence into minute groups
//! - Folding each group into one canonical bar
//! - Degenerate-bar accounting

pub mod bucket;
pub mod reducer;

pub use bucket::{bucket_by_minute, MinuteGroup};
pub use reducer::{build_bars, reduce_group};
