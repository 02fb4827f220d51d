//! Baseline records and their version history.
//!
//! There is at most one active [`BaselineMetrics`] row per user. Every
//! overwrite of that row first archives the previous content as a
//! [`BaselineHistory`] entry; history is append-only.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metric::MetricType;

// ─── Per-metric baseline ─────────────────────────────────────────────────────

/// Recency-weighted mean and standard deviation for one metric.
///
/// Mean and SD travel together: a metric either has both or is absent
/// (insufficient data). A missing baseline is never represented as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBaseline {
  pub mean: f64,
  pub sd:   f64,
}

// ─── Active baseline ─────────────────────────────────────────────────────────

/// A user's current personal baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetrics {
  pub user_id:                     Uuid,
  pub sleep:                       Option<MetricBaseline>,
  pub steps:                       Option<MetricBaseline>,
  pub screen_unlocks:              Option<MetricBaseline>,
  pub calculation_method:          String,
  pub window_days:                 u32,
  pub medication_changes_detected: bool,
  pub updated_at:                  DateTime<Utc>,
}

impl BaselineMetrics {
  pub fn metric(&self, metric: MetricType) -> Option<MetricBaseline> {
    match metric {
      MetricType::SleepHours => self.sleep,
      MetricType::Steps => self.steps,
      MetricType::ScreenUnlocks => self.screen_unlocks,
    }
  }

  pub fn set_metric(&mut self, metric: MetricType, value: Option<MetricBaseline>) {
    match metric {
      MetricType::SleepHours => self.sleep = value,
      MetricType::Steps => self.steps = value,
      MetricType::ScreenUnlocks => self.screen_unlocks = value,
    }
  }

  /// Whether the baseline is at least `interval_days` old as of `now`.
  pub fn is_due(&self, now: DateTime<Utc>, interval_days: u32) -> bool {
    now - self.updated_at >= Duration::days(i64::from(interval_days))
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// An archived copy of a baseline taken just before it was overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineHistory {
  pub history_id:    Uuid,
  pub user_id:       Uuid,
  pub snapshot:      BaselineMetrics,
  pub replaced_at:   DateTime<Utc>,
  pub version_notes: String,
}

// ─── Replace outcome ─────────────────────────────────────────────────────────

/// Result of an archive-then-upsert attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplaceOutcome {
  /// The new baseline was written. `archived` holds the history entry created
  /// for the previous row, or `None` if this was the user's first baseline.
  Replaced { archived: Option<BaselineHistory> },
  /// The stored row changed since the caller read it; nothing was written.
  Conflict { current_updated_at: Option<DateTime<Utc>> },
}
