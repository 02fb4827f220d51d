//! Core types, pure algorithms and the storage trait for the Steady personal
//! baseline engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! aggregation, windowing, statistics and scoring functions are pure; the
//! orchestration that strings them together lives in `steady-engine`.

// `BaselineStore` spells out `impl Future + Send` returns; backends may still
// implement those methods with plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod baseline;
pub mod deviation;
pub mod error;
pub mod medication;
pub mod metric;
pub mod observation;
pub mod stats;
pub mod store;
pub mod window;

pub use error::{Error, Result};

/// The `calculation_method` recorded on every baseline this engine writes.
pub const CALCULATION_METHOD: &str = "weighted_rolling_window";
