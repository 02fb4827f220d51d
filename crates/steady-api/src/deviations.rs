//! `GET /users/{user_id}/deviations?date=YYYY-MM-DD[&risk=red|amber|green]`
//!
//! Scores the stored observation for `date` against the user's current
//! baseline. The risk tier comes from the caller; this endpoint only supplies
//! the significant deltas and the sentence built from them.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use steady_core::{
  deviation::{Explanation, RiskLevel, explain, score_observation},
  store::BaselineStore,
};
use steady_engine::Engine;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct DeviationParams {
  pub date: NaiveDate,
  #[serde(default)]
  pub risk: RiskLevel,
}

pub async fn handler<S>(
  State(engine): State<Engine<S>>,
  Path(user_id): Path<Uuid>,
  Query(params): Query<DeviationParams>,
) -> Result<Json<Explanation>, ApiError>
where
  S: BaselineStore + 'static,
{
  let store = engine.store();

  let baseline = store
    .get_baseline(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no baseline for user {user_id}")))?;

  let observation = store
    .get_observation(user_id, params.date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no observation for user {user_id} on {}", params.date))
    })?;

  let deltas = score_observation(&observation, &baseline);
  Ok(Json(explain(params.risk, deltas)))
}
