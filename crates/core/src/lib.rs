//! Core types and context for the tickbar resampling engine.
//!
//! This crate provides shared types used across all other crates:
//! - Tick and bar data types
//! - Batch context, options and diagnostics
//! - Common error types

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod types;

pub use context::{parse_trading_date, BatchContext, BatchOptions};
pub use diagnostics::BatchDiagnostics;
pub use error::{Error, Result};
pub use types::*;
