//! One user's baseline recomputation.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Duration, FixedOffset, Utc};
use steady_core::{
  CALCULATION_METHOD,
  aggregate::aggregate_daily,
  baseline::{BaselineMetrics, ReplaceOutcome},
  metric::MetricType,
  stats::{WeightedStats, weighted_stats, within_window},
  store::BaselineStore,
  window::{WindowSelection, select_window},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  EngineConfig, Error, Result,
  error::store_err,
  locks::UserLocks,
};

/// What a single recomputation did.
#[derive(Debug, Clone, PartialEq)]
pub enum RecomputeOutcome {
  /// A new baseline was written.
  Updated {
    baseline: BaselineMetrics,
    /// Metrics whose baseline was recomputed this run.
    computed: Vec<MetricType>,
    /// Whether a previous baseline was archived.
    archived: bool,
  },
  /// No metric reached the distinct-day threshold; nothing was written.
  InsufficientData,
}

/// Recomputes baselines against a [`BaselineStore`].
///
/// Cloning is cheap; clones share the store and the per-user lock table.
pub struct Engine<S> {
  store:  Arc<S>,
  config: EngineConfig,
  offset: FixedOffset,
  locks:  UserLocks,
}

impl<S> Clone for Engine<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      config: self.config.clone(),
      offset: self.offset,
      locks:  self.locks.clone(),
    }
  }
}

impl<S> Engine<S>
where
  S: BaselineStore + 'static,
{
  pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self> {
    config.validate()?;
    let offset = config.offset()?;
    Ok(Self { store, config, offset, locks: UserLocks::default() })
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn config(&self) -> &EngineConfig { &self.config }

  /// Recompute `user_id`'s baseline as of `now`.
  ///
  /// Metrics without enough data this run keep their previous value. If no
  /// metric qualifies, nothing is archived or written.
  pub async fn recompute_user(
    &self,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<RecomputeOutcome> {
    let _guard = self.locks.lock(user_id).await;

    let previous = self.store.get_baseline(user_id).await.map_err(store_err)?;

    let horizon = now - Duration::days(i64::from(self.config.max_window_days));
    let samples = self
      .store
      .samples_since(user_id, horizon)
      .await
      .map_err(store_err)?;
    let medications = self
      .store
      .medications_since(user_id, horizon)
      .await
      .map_err(store_err)?;

    let series = aggregate_daily(&samples, self.offset);
    let window = select_window(&medications, now, &self.config.window_params());
    let today = now.with_timezone(&self.offset).date_naive();
    let params = self.config.stats_params();

    let computed: BTreeMap<MetricType, WeightedStats> = series
      .iter()
      .filter_map(|(metric, points)| {
        let recent = within_window(points, today, window.window_days);
        weighted_stats(&recent, today, &params).map(|stats| (*metric, stats))
      })
      .collect();

    if computed.is_empty() {
      debug!(
        user_id = %user_id,
        samples = samples.len(),
        window_days = window.window_days,
        "insufficient data for every metric; baseline left untouched"
      );
      return Ok(RecomputeOutcome::InsufficientData);
    }

    let mut next = previous.clone().unwrap_or_else(|| BaselineMetrics {
      user_id,
      sleep: None,
      steps: None,
      screen_unlocks: None,
      calculation_method: CALCULATION_METHOD.to_owned(),
      window_days: window.window_days,
      medication_changes_detected: window.medication_changes_detected,
      updated_at: now,
    });
    for (metric, stats) in &computed {
      next.set_metric(*metric, Some(stats.baseline()));
    }
    next.calculation_method = CALCULATION_METHOD.to_owned();
    next.window_days = window.window_days;
    next.medication_changes_detected = window.medication_changes_detected;
    next.updated_at = now;

    let outcome = self
      .store
      .replace_baseline(next.clone(), previous, version_notes(&window))
      .await
      .map_err(store_err)?;

    match outcome {
      ReplaceOutcome::Replaced { archived } => {
        info!(
          user_id = %user_id,
          metrics = computed.len(),
          window_days = window.window_days,
          medication_changes = window.medication_changes_detected,
          archived = archived.is_some(),
          "baseline updated"
        );
        Ok(RecomputeOutcome::Updated {
          baseline: next,
          computed: computed.into_keys().collect(),
          archived: archived.is_some(),
        })
      }
      ReplaceOutcome::Conflict { current_updated_at } => {
        warn!(
          user_id = %user_id,
          current_updated_at = ?current_updated_at,
          "baseline changed underneath recomputation; not overwriting"
        );
        Err(Error::Conflict(user_id))
      }
    }
  }
}

/// Note stored with the archived baseline.
pub fn version_notes(window: &WindowSelection) -> String {
  let confound = if window.medication_changes_detected {
    "medication change detected"
  } else {
    "no medication changes"
  };
  format!("Recomputed over a {}-day window; {confound}", window.window_days)
}
