//! Read-only baseline endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/{user_id}/baseline` | 404 if never computed |
//! | `GET`  | `/users/{user_id}/baseline/history` | Archived baselines, newest first |

use axum::{
  Json,
  extract::{Path, State},
};
use steady_core::{
  baseline::{BaselineHistory, BaselineMetrics},
  store::BaselineStore,
};
use steady_engine::Engine;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /users/{user_id}/baseline`
pub async fn current<S>(
  State(engine): State<Engine<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<BaselineMetrics>, ApiError>
where
  S: BaselineStore + 'static,
{
  let baseline = engine
    .store()
    .get_baseline(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no baseline for user {user_id}")))?;
  Ok(Json(baseline))
}

/// `GET /users/{user_id}/baseline/history`
pub async fn history<S>(
  State(engine): State<Engine<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<BaselineHistory>>, ApiError>
where
  S: BaselineStore + 'static,
{
  let history = engine
    .store()
    .baseline_history(user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(history))
}
