//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond precision
//! so that lexical order matches chronological order. Dates are ISO
//! `YYYY-MM-DD`. UUIDs are hyphenated lowercase strings. History snapshots are
//! compact JSON.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use steady_core::{
  baseline::{BaselineHistory, BaselineMetrics, MetricBaseline},
  medication::MedicationRecord,
  metric::{MetricType, RawSample},
  observation::DailyObservation,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Metric pairs ────────────────────────────────────────────────────────────

pub fn split_pair(b: Option<MetricBaseline>) -> (Option<f64>, Option<f64>) {
  match b {
    Some(MetricBaseline { mean, sd }) => (Some(mean), Some(sd)),
    None => (None, None),
  }
}

fn join_pair(
  user_id: Uuid,
  metric: MetricType,
  mean: Option<f64>,
  sd: Option<f64>,
) -> Result<Option<MetricBaseline>> {
  match (mean, sd) {
    (Some(mean), Some(sd)) => Ok(Some(MetricBaseline { mean, sd })),
    (None, None) => Ok(None),
    _ => Err(Error::IncompletePair { user_id, metric: metric.as_str() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `raw_samples` row.
pub struct RawSampleRow {
  pub sample_id:   String,
  pub user_id:     String,
  pub metric_type: String,
  pub value:       f64,
  pub recorded_at: String,
}

impl RawSampleRow {
  pub fn into_sample(self) -> Result<RawSample> {
    Ok(RawSample {
      sample_id:   decode_uuid(&self.sample_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      metric_type: MetricType::parse(&self.metric_type)?,
      value:       self.value,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `medications` row.
pub struct RawMedication {
  pub medication_id: String,
  pub user_id:       String,
  pub name:          String,
  pub created_at:    String,
}

impl RawMedication {
  pub fn into_medication(self) -> Result<MedicationRecord> {
    Ok(MedicationRecord {
      medication_id: decode_uuid(&self.medication_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      name:          self.name,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `daily_observations` row.
pub struct RawObservation {
  pub user_id:        String,
  pub date:           String,
  pub sleep_hours:    Option<f64>,
  pub steps:          Option<f64>,
  pub screen_unlocks: Option<f64>,
}

impl RawObservation {
  pub fn into_observation(self) -> Result<DailyObservation> {
    Ok(DailyObservation {
      user_id:        decode_uuid(&self.user_id)?,
      date:           decode_date(&self.date)?,
      sleep_hours:    self.sleep_hours,
      steps:          self.steps,
      screen_unlocks: self.screen_unlocks,
    })
  }
}

/// Raw values read directly from a `baseline_metrics` row.
pub struct RawBaseline {
  pub user_id:                     String,
  pub sleep_mean:                  Option<f64>,
  pub sleep_sd:                    Option<f64>,
  pub steps_mean:                  Option<f64>,
  pub steps_sd:                    Option<f64>,
  pub unlocks_mean:                Option<f64>,
  pub unlocks_sd:                  Option<f64>,
  pub calculation_method:          String,
  pub window_days:                 i64,
  pub medication_changes_detected: bool,
  pub updated_at:                  String,
}

/// Column list matching the field order of [`RawBaseline::from_row`].
pub const BASELINE_COLUMNS: &str = "user_id, sleep_mean, sleep_sd, steps_mean, steps_sd, \
   unlocks_mean, unlocks_sd, calculation_method, window_days, \
   medication_changes_detected, updated_at";

impl RawBaseline {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:                     row.get(0)?,
      sleep_mean:                  row.get(1)?,
      sleep_sd:                    row.get(2)?,
      steps_mean:                  row.get(3)?,
      steps_sd:                    row.get(4)?,
      unlocks_mean:                row.get(5)?,
      unlocks_sd:                  row.get(6)?,
      calculation_method:          row.get(7)?,
      window_days:                 row.get(8)?,
      medication_changes_detected: row.get(9)?,
      updated_at:                  row.get(10)?,
    })
  }

  pub fn into_baseline(self) -> Result<BaselineMetrics> {
    let user_id = decode_uuid(&self.user_id)?;
    Ok(BaselineMetrics {
      user_id,
      sleep: join_pair(user_id, MetricType::SleepHours, self.sleep_mean, self.sleep_sd)?,
      steps: join_pair(user_id, MetricType::Steps, self.steps_mean, self.steps_sd)?,
      screen_unlocks: join_pair(
        user_id,
        MetricType::ScreenUnlocks,
        self.unlocks_mean,
        self.unlocks_sd,
      )?,
      calculation_method: self.calculation_method,
      window_days: u32::try_from(self.window_days)
        .map_err(|_| Error::InvalidColumn(format!("window_days = {}", self.window_days)))?,
      medication_changes_detected: self.medication_changes_detected,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `baseline_history` row.
pub struct RawHistory {
  pub history_id:    String,
  pub user_id:       String,
  pub snapshot_json: String,
  pub replaced_at:   String,
  pub version_notes: String,
}

impl RawHistory {
  pub fn into_history(self) -> Result<BaselineHistory> {
    Ok(BaselineHistory {
      history_id:    decode_uuid(&self.history_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      snapshot:      serde_json::from_str(&self.snapshot_json)?,
      replaced_at:   decode_dt(&self.replaced_at)?,
      version_notes: self.version_notes,
    })
  }
}
