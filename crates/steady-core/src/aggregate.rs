//! Daily aggregation of raw samples.
//!
//! Samples are bucketed by metric and by the calendar day they fall on in the
//! user's local time, then averaged. Non-finite values are dropped before
//! bucketing. Metrics with no samples are simply absent from the output.

use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};

use crate::metric::{DailyAggregate, MetricType, RawSample};

/// Daily aggregates keyed by metric; each list is sorted by date.
pub type DailySeries = BTreeMap<MetricType, Vec<DailyAggregate>>;

/// Average same-day samples per metric. `offset` defines the local calendar.
pub fn aggregate_daily(samples: &[RawSample], offset: FixedOffset) -> DailySeries {
  let mut buckets: BTreeMap<MetricType, BTreeMap<NaiveDate, (f64, u32)>> =
    BTreeMap::new();

  for sample in samples.iter().filter(|s| s.value.is_finite()) {
    let date = sample.recorded_at.with_timezone(&offset).date_naive();
    let (sum, count) = buckets
      .entry(sample.metric_type)
      .or_default()
      .entry(date)
      .or_insert((0.0, 0));
    *sum += sample.value;
    *count += 1;
  }

  buckets
    .into_iter()
    .map(|(metric_type, days)| {
      let series = days
        .into_iter()
        .map(|(date, (sum, count))| DailyAggregate {
          metric_type,
          date,
          average_value: sum / f64::from(count),
        })
        .collect();
      (metric_type, series)
    })
    .collect()
}
