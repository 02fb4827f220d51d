//! `POST /calculate-baseline`: trigger a baseline recomputation run.
//!
//! Body (optional): `{"user_id":"<uuid>"}`. With a user id that user is
//! recomputed unconditionally; without one every user whose baseline is due
//! is recomputed.

use axum::{Json, extract::State};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use steady_core::{CALCULATION_METHOD, store::BaselineStore};
use steady_engine::{Engine, RecomputeRequest};
use tracing::error;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct RecomputeBody {
  #[serde(default)]
  pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeResponse {
  pub message:         String,
  pub processed_users: usize,
  pub method:          String,
}

pub async fn handler<S>(
  State(engine): State<Engine<S>>,
  body: Bytes,
) -> Result<Json<RecomputeResponse>, ApiError>
where
  S: BaselineStore + 'static,
{
  let body = parse_body(&body)?;
  let request = RecomputeRequest::from(body.user_id);

  let summary = engine.run(request, Utc::now()).await.map_err(|e| {
    error!(error = %e, "baseline run aborted");
    ApiError::Internal(e.to_string())
  })?;

  let message = match request {
    RecomputeRequest::Forced(user_id) => format!(
      "Baseline recomputation finished for user {user_id}: {} updated",
      summary.updated
    ),
    RecomputeRequest::Batch => format!(
      "Baseline recomputation finished: {} of {} eligible users updated",
      summary.updated, summary.eligible
    ),
  };

  Ok(Json(RecomputeResponse {
    message,
    processed_users: summary.updated,
    method: CALCULATION_METHOD.to_owned(),
  }))
}

/// An empty body, `null`, or `{}` all mean batch mode.
fn parse_body(body: &[u8]) -> Result<RecomputeBody, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(RecomputeBody::default());
  }
  serde_json::from_slice::<Option<RecomputeBody>>(body)
    .map(Option::unwrap_or_default)
    .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_and_null_bodies_mean_batch() {
    for body in [&b""[..], b"  \n", b"null", b"{}", br#"{"user_id":null}"#] {
      assert!(parse_body(body).unwrap().user_id.is_none(), "{body:?}");
    }
  }

  #[test]
  fn user_id_is_parsed() {
    let id = Uuid::new_v4();
    let body = format!(r#"{{"user_id":"{id}"}}"#);
    assert_eq!(parse_body(body.as_bytes()).unwrap().user_id, Some(id));
  }

  #[test]
  fn malformed_body_is_rejected() {
    assert!(matches!(parse_body(b"{user"), Err(ApiError::BadRequest(_))));
    assert!(matches!(
      parse_body(br#"{"user_id":"not-a-uuid"}"#),
      Err(ApiError::BadRequest(_))
    ));
  }
}
