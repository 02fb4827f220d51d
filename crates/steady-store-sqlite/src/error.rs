//! Error type for `steady-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] steady_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("invalid column value: {0}")]
  InvalidColumn(String),

  /// A baseline column pair had a mean without an SD or vice versa.
  #[error("baseline for user {user_id} has an incomplete {metric} pair")]
  IncompletePair { user_id: uuid::Uuid, metric: &'static str },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
