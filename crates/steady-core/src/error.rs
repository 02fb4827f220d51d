//! Error types for `steady-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown metric type: {0:?}")]
  UnknownMetric(String),

  #[error("unknown risk level: {0:?}")]
  UnknownRiskLevel(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
