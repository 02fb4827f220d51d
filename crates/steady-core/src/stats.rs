//! Recency-weighted baseline statistics.
//!
//! Each daily aggregate is weighted by `exp(-age · ln2 / half_life)`, so a
//! value `half_life` days old counts half as much as the same value today.
//! Mean and variance are the weighted population moments.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{baseline::MetricBaseline, metric::DailyAggregate};

/// Parameters for [`weighted_stats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsParams {
  pub half_life_days:    f64,
  /// Fewer distinct dates than this and the metric is left without a baseline.
  pub min_distinct_days: usize,
}

impl Default for StatsParams {
  fn default() -> Self {
    Self { half_life_days: 15.0, min_distinct_days: 14 }
  }
}

/// Weighted moments for one metric plus the span of data they cover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedStats {
  pub mean:          f64,
  pub sd:            f64,
  pub distinct_days: usize,
  pub first_date:    NaiveDate,
  pub last_date:     NaiveDate,
}

impl WeightedStats {
  pub fn baseline(&self) -> MetricBaseline {
    MetricBaseline { mean: self.mean, sd: self.sd }
  }
}

/// Half-life decay weight for a point `age_days` old.
pub fn decay_weight(age_days: f64, half_life_days: f64) -> f64 {
  (-age_days.abs() * std::f64::consts::LN_2 / half_life_days).exp()
}

/// Keep only the aggregates no older than `window_days` relative to `today`.
pub fn within_window(
  points: &[DailyAggregate],
  today: NaiveDate,
  window_days: u32,
) -> Vec<DailyAggregate> {
  points
    .iter()
    .filter(|p| (today - p.date).num_days() <= i64::from(window_days))
    .copied()
    .collect()
}

/// Compute the weighted mean and SD of `points` as of `today`.
///
/// Returns `None` when the points cover fewer than
/// [`StatsParams::min_distinct_days`] distinct dates, or when the moments are
/// not finite. The result does not depend on the order of `points`.
pub fn weighted_stats(
  points: &[DailyAggregate],
  today: NaiveDate,
  params: &StatsParams,
) -> Option<WeightedStats> {
  let dates: BTreeSet<NaiveDate> = points.iter().map(|p| p.date).collect();
  if dates.len() < params.min_distinct_days {
    return None;
  }
  let first_date = *dates.first()?;
  let last_date = *dates.last()?;

  // Fixed summation order keeps the floating-point result permutation-proof.
  let mut sorted = points.to_vec();
  sorted.sort_by(|a, b| {
    a.date
      .cmp(&b.date)
      .then_with(|| a.average_value.total_cmp(&b.average_value))
  });

  let weighted: Vec<(f64, f64)> = sorted
    .iter()
    .map(|p| {
      let age = (today - p.date).num_days() as f64;
      (p.average_value, decay_weight(age, params.half_life_days))
    })
    .collect();

  let total_weight: f64 = weighted.iter().map(|(_, w)| w).sum();
  if total_weight <= 0.0 || !total_weight.is_finite() {
    return None;
  }

  let mean = weighted.iter().map(|(v, w)| v * w).sum::<f64>() / total_weight;
  let variance = weighted
    .iter()
    .map(|(v, w)| w * (v - mean).powi(2))
    .sum::<f64>()
    / total_weight;
  let sd = variance.sqrt();
  if !mean.is_finite() || !sd.is_finite() {
    return None;
  }

  Some(WeightedStats {
    mean,
    sd,
    distinct_days: dates.len(),
    first_date,
    last_date,
  })
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;
  use crate::metric::MetricType;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 6, 30).unwrap() }

  fn series(values: &[f64]) -> Vec<DailyAggregate> {
    values
      .iter()
      .enumerate()
      .map(|(age, v)| DailyAggregate {
        metric_type:   MetricType::SleepHours,
        date:          today() - Duration::days(age as i64),
        average_value: *v,
      })
      .collect()
  }

  #[test]
  fn fourteen_distinct_days_is_enough() {
    let points = series(&[7.0; 14]);
    let stats = weighted_stats(&points, today(), &StatsParams::default()).unwrap();
    assert_eq!(stats.distinct_days, 14);
    assert!((stats.mean - 7.0).abs() < 1e-12);
    assert!(stats.sd.abs() < 1e-12);
  }

  #[test]
  fn thirteen_distinct_days_is_not() {
    let points = series(&[7.0; 13]);
    assert!(weighted_stats(&points, today(), &StatsParams::default()).is_none());
  }

  #[test]
  fn duplicate_dates_count_once() {
    let mut points = series(&[7.0; 13]);
    points.push(points[0]);
    points.push(points[5]);
    assert_eq!(points.len(), 15);
    assert!(weighted_stats(&points, today(), &StatsParams::default()).is_none());
  }

  #[test]
  fn half_life_halves_the_weight() {
    let ratio = decay_weight(15.0, 15.0) / decay_weight(0.0, 15.0);
    assert!((ratio - 0.5).abs() < 1e-9);
    assert!((decay_weight(30.0, 15.0) - 0.25).abs() < 1e-9);
  }

  #[test]
  fn permutation_does_not_change_result() {
    let values: Vec<f64> = (0..40).map(|i| 6.0 + ((i * 7) % 11) as f64 * 0.3).collect();
    let points = series(&values);
    let params = StatsParams::default();
    let expected = weighted_stats(&points, today(), &params).unwrap();

    let mut reversed = points.clone();
    reversed.reverse();
    let mut rotated = points.clone();
    rotated.rotate_left(17);
    let mut interleaved: Vec<_> = points.iter().step_by(2).copied().collect();
    interleaved.extend(points.iter().skip(1).step_by(2).copied());

    for permuted in [reversed, rotated, interleaved] {
      let got = weighted_stats(&permuted, today(), &params).unwrap();
      assert_eq!(got.mean.to_bits(), expected.mean.to_bits());
      assert_eq!(got.sd.to_bits(), expected.sd.to_bits());
    }
  }

  #[test]
  fn recent_days_dominate() {
    // Seven recent days at 20, seven older days at 10.
    let mut values = vec![20.0; 7];
    values.extend([10.0; 7]);
    let stats = weighted_stats(&series(&values), today(), &StatsParams::default()).unwrap();
    assert!(stats.mean > 15.0, "mean {}", stats.mean);
    assert!(stats.sd > 0.0);
  }

  #[test]
  fn matches_hand_computed_moments() {
    let points = series(&[8.0, 6.0, 8.0, 6.0, 8.0, 6.0, 8.0, 6.0, 8.0, 6.0, 8.0, 6.0, 8.0, 6.0]);
    let stats = weighted_stats(&points, today(), &StatsParams::default()).unwrap();

    let (mut sw, mut swv) = (0.0, 0.0);
    for (age, p) in points.iter().enumerate() {
      let w = decay_weight(age as f64, 15.0);
      sw += w;
      swv += w * p.average_value;
    }
    let mean = swv / sw;
    let var = points
      .iter()
      .enumerate()
      .map(|(age, p)| decay_weight(age as f64, 15.0) * (p.average_value - mean).powi(2))
      .sum::<f64>()
      / sw;

    assert!((stats.mean - mean).abs() < 1e-9);
    assert!((stats.sd - var.sqrt()).abs() < 1e-9);
  }

  #[test]
  fn non_finite_moments_yield_no_baseline() {
    let mut values = vec![7.0; 14];
    values[3] = f64::INFINITY;
    assert!(weighted_stats(&series(&values), today(), &StatsParams::default()).is_none());

    // Finite inputs whose squares overflow.
    let huge = vec![f64::MAX, -f64::MAX].repeat(7);
    assert!(weighted_stats(&series(&huge), today(), &StatsParams::default()).is_none());
  }

  #[test]
  fn window_filter_drops_older_points() {
    let points = series(&[1.0; 60]);
    let kept = within_window(&points, today(), 30);
    assert_eq!(kept.len(), 31);
    assert!(kept.iter().all(|p| (today() - p.date).num_days() <= 30));
  }

  #[test]
  fn reports_covered_date_range() {
    let points = series(&[5.0; 20]);
    let stats = weighted_stats(&points, today(), &StatsParams::default()).unwrap();
    assert_eq!(stats.last_date, today());
    assert_eq!(stats.first_date, today() - Duration::days(19));
  }
}
