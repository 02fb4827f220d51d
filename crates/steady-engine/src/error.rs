//! Error types for `steady-engine`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// Another writer replaced the baseline while it was being recomputed.
  #[error("baseline for user {0} changed during recomputation")]
  Conflict(Uuid),

  #[error("invalid engine configuration: {0}")]
  Config(String),

  #[error("worker pool error: {0}")]
  Worker(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn store_err<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}
