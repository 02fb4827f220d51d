//! HTTP surface for the Steady baseline engine.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/calculate-baseline` | Optional body `{"user_id":"<uuid>"}` |
//! | `GET`  | `/users/{user_id}/baseline` | Current baseline |
//! | `GET`  | `/users/{user_id}/baseline/history` | Archived baselines |
//! | `GET`  | `/users/{user_id}/deviations?date=` | Deviation explanation for a day |
//!
//! Every route answers CORS preflight (`OPTIONS`) with an empty 200.

pub mod baselines;
pub mod deviations;
pub mod error;
pub mod recompute;

pub use error::ApiError;

use std::path::PathBuf;

use axum::{
  Router,
  http::{HeaderName, Method, header},
  routing::{get, post},
};
use serde::Deserialize;
use steady_core::store::BaselineStore;
use steady_engine::{Engine, EngineConfig};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                    String,
  pub port:                    u16,
  pub store_path:              PathBuf,
  /// Run a batch recomputation every this many hours. Unset disables the
  /// in-process schedule.
  #[serde(default)]
  pub schedule_interval_hours: Option<u64>,
  #[serde(default)]
  pub engine:                  EngineConfig,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] serving `engine`.
pub fn router<S>(engine: Engine<S>) -> Router
where
  S: BaselineStore + 'static,
{
  Router::new()
    .route("/calculate-baseline",                 post(recompute::handler::<S>))
    .route("/users/{user_id}/baseline",           get(baselines::current::<S>))
    .route("/users/{user_id}/baseline/history",   get(baselines::history::<S>))
    .route("/users/{user_id}/deviations",         get(deviations::handler::<S>))
    .layer(cors())
    .layer(TraceLayer::new_for_http())
    .with_state(engine)
}

fn cors() -> CorsLayer {
  CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([
      header::AUTHORIZATION,
      header::CONTENT_TYPE,
      HeaderName::from_static("apikey"),
      HeaderName::from_static("x-client-info"),
    ])
}

// ─── Tests ────────────────────────────────────────────────────────────────────
