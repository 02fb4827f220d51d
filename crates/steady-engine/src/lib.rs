//! Baseline recomputation for Steady.
//!
//! [`Engine`] strings the pure pieces of `steady-core` together for one user
//! (aggregate → choose window → weighted statistics → archive and upsert) and
//! runs that flow across every eligible user on a bounded worker pool.
//!
//! ```text
//! Idle → SelectingUsers → { per user: Aggregate → Check ≥14 days → Compute
//!                           → Archive + Upsert } → Done
//! ```
//!
//! A failure while selecting users aborts the run. A failure inside one
//! user's flow is logged and only skips that user.

pub mod config;
pub mod error;
pub mod locks;
pub mod recompute;
pub mod scheduler;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use recompute::{Engine, RecomputeOutcome};
pub use scheduler::{RecomputeRequest, RunSummary};
