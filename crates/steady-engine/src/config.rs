//! Engine tuning, deserialised from the `[engine]` table of `config.toml`.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use steady_core::{stats::StatsParams, window::WindowParams};

use crate::{Error, Result};

/// Every field falls back to its default when absent from the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Lookback with no confound; also the horizon for raw samples and
  /// medication records.
  pub max_window_days:       u32,
  /// Lookback once a medication change falls inside the horizon.
  pub confound_window_days:  u32,
  pub half_life_days:        f64,
  pub min_distinct_days:     usize,
  /// Batch mode recomputes baselines at least this old.
  pub refresh_interval_days: u32,
  /// Upper bound on users recomputed concurrently. `1` is strictly sequential.
  pub workers:               usize,
  /// Offset of the users' local calendar from UTC, in minutes.
  pub utc_offset_minutes:    i32,
  /// Let batch mode also pick up users with samples but no baseline yet.
  pub include_new_users:     bool,
}

impl Default for EngineConfig {
  fn default() -> Self {
    let window = WindowParams::default();
    let stats = StatsParams::default();
    Self {
      max_window_days:       window.max_window_days,
      confound_window_days:  window.confound_window_days,
      half_life_days:        stats.half_life_days,
      min_distinct_days:     stats.min_distinct_days,
      refresh_interval_days: 30,
      workers:               4,
      utc_offset_minutes:    0,
      include_new_users:     false,
    }
  }
}

impl EngineConfig {
  pub fn window_params(&self) -> WindowParams {
    WindowParams {
      max_window_days:      self.max_window_days,
      confound_window_days: self.confound_window_days,
    }
  }

  pub fn stats_params(&self) -> StatsParams {
    StatsParams {
      half_life_days:    self.half_life_days,
      min_distinct_days: self.min_distinct_days,
    }
  }

  pub fn offset(&self) -> Result<FixedOffset> {
    FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
      Error::Config(format!("utc_offset_minutes out of range: {}", self.utc_offset_minutes))
    })
  }

  /// Reject settings the algorithms cannot run with.
  pub fn validate(&self) -> Result<()> {
    if self.half_life_days <= 0.0 || !self.half_life_days.is_finite() {
      return Err(Error::Config(format!(
        "half_life_days must be positive, got {}",
        self.half_life_days
      )));
    }
    if self.confound_window_days > self.max_window_days {
      return Err(Error::Config(format!(
        "confound_window_days ({}) exceeds max_window_days ({})",
        self.confound_window_days, self.max_window_days
      )));
    }
    if self.workers == 0 {
      return Err(Error::Config("workers must be at least 1".into()));
    }
    self.offset().map(|_| ())
  }
}
