//! Deviation scoring against a stored baseline.
//!
//! A day's observed value is significant when it lies more than one baseline
//! standard deviation from the baseline mean. Significant metrics become
//! [`MetricDelta`]s, whose count and direction feed the explanation shown to
//! the user alongside an externally assigned [`RiskLevel`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  baseline::{BaselineMetrics, MetricBaseline},
  metric::MetricType,
  observation::DailyObservation,
};

/// Z-scores strictly above this are significant.
pub const SIGNIFICANCE_THRESHOLD: f64 = 1.0;

// ─── Types ───────────────────────────────────────────────────────────────────

/// Which side of the baseline an observation fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
  Up,
  Down,
}

/// One metric's significant deviation for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
  pub metric_type: MetricType,
  pub direction:   Direction,
  /// Absolute distance from the baseline mean, in the metric's unit.
  pub magnitude:   f64,
  /// `magnitude` formatted for display (e.g. `"2.9"`, `"1,700"`).
  pub value:       String,
  pub unit:        String,
  pub z_score:     f64,
}

/// Colour-coded risk tier assigned by the downstream classifier.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
  #[default]
  Green,
  Amber,
  Red,
}

impl RiskLevel {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownRiskLevel(s.to_owned()))
  }

  fn title(self) -> &'static str {
    match self {
      Self::Green => "Green",
      Self::Amber => "Amber",
      Self::Red => "Red",
    }
  }
}

/// Structured deviation facts plus a templated sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
  pub risk_level:        RiskLevel,
  pub significant_count: usize,
  pub deltas:            Vec<MetricDelta>,
  pub summary:           String,
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

/// Z-score of `observed` against `baseline`; zero when the SD is zero.
pub fn z_score(baseline: MetricBaseline, observed: f64) -> f64 {
  let diff = baseline.mean - observed;
  if baseline.sd > 0.0 { diff.abs() / baseline.sd } else { 0.0 }
}

/// Score a single metric. Returns `None` when the deviation is not significant.
pub fn score_metric(
  metric_type: MetricType,
  baseline: MetricBaseline,
  observed: f64,
) -> Option<MetricDelta> {
  let diff = baseline.mean - observed;
  let z = z_score(baseline, observed);
  if z <= SIGNIFICANCE_THRESHOLD {
    return None;
  }

  let direction = if diff > 0.0 { Direction::Down } else { Direction::Up };
  let magnitude = diff.abs();

  Some(MetricDelta {
    metric_type,
    direction,
    magnitude,
    value: format_value(metric_type, magnitude),
    unit: unit_label(metric_type, direction).to_owned(),
    z_score: z,
  })
}

/// Score every metric that has both a baseline and an observed value.
pub fn score_observation(
  observation: &DailyObservation,
  baseline: &BaselineMetrics,
) -> Vec<MetricDelta> {
  MetricType::ALL
    .iter()
    .filter_map(|&metric| {
      let base = baseline.metric(metric)?;
      let observed = observation.value(metric)?;
      score_metric(metric, base, observed)
    })
    .collect()
}

/// Bundle deltas with the risk tier and compose the summary sentence.
pub fn explain(risk_level: RiskLevel, deltas: Vec<MetricDelta>) -> Explanation {
  let significant_count = deltas.len();
  let summary = if deltas.is_empty() {
    format!(
      "{} risk: no significant deviations from your personal baseline.",
      risk_level.title()
    )
  } else {
    let parts: Vec<String> = deltas
      .iter()
      .map(|d| format!("{} {} {}", metric_label(d.metric_type), d.value, d.unit))
      .collect();
    let noun = if significant_count == 1 { "metric" } else { "metrics" };
    format!(
      "{} risk: {significant_count} {noun} deviated significantly from your personal baseline ({}).",
      risk_level.title(),
      parts.join(", ")
    )
  };

  Explanation { risk_level, significant_count, deltas, summary }
}

// ─── Labels ──────────────────────────────────────────────────────────────────

fn unit_label(metric: MetricType, direction: Direction) -> &'static str {
  match (metric, direction) {
    (MetricType::SleepHours, Direction::Down) => "hours below normal",
    (MetricType::SleepHours, Direction::Up) => "hours above normal",
    (MetricType::Steps, Direction::Down) => "steps below average",
    (MetricType::Steps, Direction::Up) => "steps above average",
    (MetricType::ScreenUnlocks, Direction::Down) => "unlocks below average",
    (MetricType::ScreenUnlocks, Direction::Up) => "unlocks above average",
  }
}

fn metric_label(metric: MetricType) -> &'static str {
  match metric {
    MetricType::SleepHours => "sleep",
    MetricType::Steps => "steps",
    MetricType::ScreenUnlocks => "screen unlocks",
  }
}

fn format_value(metric: MetricType, magnitude: f64) -> String {
  match metric {
    MetricType::SleepHours => format!("{magnitude:.1}"),
    MetricType::Steps | MetricType::ScreenUnlocks => {
      group_thousands(magnitude.round() as i64)
    }
  }
}

/// `1700` → `"1,700"`.
fn group_thousands(n: i64) -> String {
  let digits = n.unsigned_abs().to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
  if n < 0 {
    out.push('-');
  }
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};
  use uuid::Uuid;

  use super::*;

  fn baseline_with(
    sleep: Option<MetricBaseline>,
    steps: Option<MetricBaseline>,
    unlocks: Option<MetricBaseline>,
  ) -> BaselineMetrics {
    BaselineMetrics {
      user_id: Uuid::nil(),
      sleep,
      steps,
      screen_unlocks: unlocks,
      calculation_method: crate::CALCULATION_METHOD.to_owned(),
      window_days: 60,
      medication_changes_detected: false,
      updated_at: Utc::now(),
    }
  }

  fn observation(sleep: Option<f64>, steps: Option<f64>, unlocks: Option<f64>) -> DailyObservation {
    DailyObservation {
      user_id:        Uuid::nil(),
      date:           NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
      sleep_hours:    sleep,
      steps,
      screen_unlocks: unlocks,
    }
  }

  #[test]
  fn short_sleep_is_down_in_hours() {
    let delta = score_metric(
      MetricType::SleepHours,
      MetricBaseline { mean: 8.2, sd: 0.6 },
      5.3,
    )
    .unwrap();
    assert!((delta.z_score - 4.8333).abs() < 1e-3);
    assert_eq!(delta.direction, Direction::Down);
    assert_eq!(delta.value, "2.9");
    assert_eq!(delta.unit, "hours below normal");
  }

  #[test]
  fn extra_steps_are_up_with_grouping() {
    let delta = score_metric(
      MetricType::Steps,
      MetricBaseline { mean: 7500.0, sd: 1200.0 },
      9200.0,
    )
    .unwrap();
    assert!((delta.z_score - 1.4167).abs() < 1e-3);
    assert_eq!(delta.direction, Direction::Up);
    assert_eq!(delta.value, "1,700");
    assert_eq!(delta.unit, "steps above average");
  }

  #[test]
  fn within_one_sd_is_not_significant() {
    let base = MetricBaseline { mean: 7500.0, sd: 1200.0 };
    assert!(score_metric(MetricType::Steps, base, 8100.0).is_none());
    // Exactly one SD away is still not significant.
    assert!(score_metric(MetricType::Steps, base, 8700.0).is_none());
  }

  #[test]
  fn zero_sd_never_flags() {
    let base = MetricBaseline { mean: 50.0, sd: 0.0 };
    assert_eq!(z_score(base, 500.0), 0.0);
    assert!(score_metric(MetricType::ScreenUnlocks, base, 500.0).is_none());
  }

  #[test]
  fn observation_skips_missing_baselines_and_values() {
    let baseline = baseline_with(
      Some(MetricBaseline { mean: 8.2, sd: 0.6 }),
      None,
      Some(MetricBaseline { mean: 60.0, sd: 10.0 }),
    );
    let obs = observation(Some(5.3), Some(20_000.0), None);
    let deltas = score_observation(&obs, &baseline);
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].metric_type, MetricType::SleepHours);
  }

  #[test]
  fn explanation_carries_count_and_direction() {
    let baseline = baseline_with(
      Some(MetricBaseline { mean: 8.2, sd: 0.6 }),
      Some(MetricBaseline { mean: 7500.0, sd: 1200.0 }),
      Some(MetricBaseline { mean: 60.0, sd: 10.0 }),
    );
    let obs = observation(Some(5.3), Some(9200.0), Some(65.0));
    let explanation = explain(RiskLevel::Red, score_observation(&obs, &baseline));

    assert_eq!(explanation.significant_count, 2);
    assert_eq!(explanation.deltas[0].direction, Direction::Down);
    assert_eq!(explanation.deltas[1].direction, Direction::Up);
    assert_eq!(
      explanation.summary,
      "Red risk: 2 metrics deviated significantly from your personal baseline \
       (sleep 2.9 hours below normal, steps 1,700 steps above average)."
    );
  }

  #[test]
  fn explanation_without_deltas() {
    let explanation = explain(RiskLevel::Green, vec![]);
    assert_eq!(explanation.significant_count, 0);
    assert!(explanation.summary.starts_with("Green risk: no significant"));
  }

  #[test]
  fn unlock_values_are_rounded_integers() {
    let delta = score_metric(
      MetricType::ScreenUnlocks,
      MetricBaseline { mean: 40.0, sd: 5.0 },
      52.4,
    )
    .unwrap();
    assert_eq!(delta.value, "12");
    assert_eq!(delta.unit, "unlocks above average");
  }

  #[test]
  fn thousands_grouping() {
    assert_eq!(group_thousands(0), "0");
    assert_eq!(group_thousands(999), "999");
    assert_eq!(group_thousands(1000), "1,000");
    assert_eq!(group_thousands(1234567), "1,234,567");
    assert_eq!(group_thousands(-4200), "-4,200");
  }

  #[test]
  fn risk_level_parses_lowercase() {
    assert_eq!(RiskLevel::parse("amber").unwrap(), RiskLevel::Amber);
    assert!(RiskLevel::parse("purple").is_err());
  }
}
