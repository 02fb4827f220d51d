//! Metric types and raw sensor samples.
//!
//! Raw samples are immutable facts produced by an external ingestion
//! collaborator. The engine only ever reads them.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Metric type ─────────────────────────────────────────────────────────────

/// A tracked physiological or behavioural metric.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricType {
  SleepHours,
  Steps,
  ScreenUnlocks,
}

impl MetricType {
  pub const ALL: [MetricType; 3] =
    [Self::SleepHours, Self::Steps, Self::ScreenUnlocks];

  /// The snake_case discriminant used in storage and on the wire.
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownMetric(s.to_owned()))
  }
}

// ─── Samples ─────────────────────────────────────────────────────────────────

/// One timestamped sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
  pub sample_id:   Uuid,
  pub user_id:     Uuid,
  pub metric_type: MetricType,
  pub value:       f64,
  pub recorded_at: DateTime<Utc>,
}

/// Input for appending a sample; the store assigns `sample_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSample {
  pub user_id:     Uuid,
  pub metric_type: MetricType,
  pub value:       f64,
  pub recorded_at: DateTime<Utc>,
}

impl NewSample {
  pub fn new(
    user_id: Uuid,
    metric_type: MetricType,
    value: f64,
    recorded_at: DateTime<Utc>,
  ) -> Self {
    Self { user_id, metric_type, value, recorded_at }
  }
}

/// The mean of all samples of one metric on one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
  pub metric_type:   MetricType,
  pub date:          NaiveDate,
  pub average_value: f64,
}
