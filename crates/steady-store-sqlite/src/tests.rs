//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use steady_core::{
  CALCULATION_METHOD,
  baseline::{BaselineMetrics, MetricBaseline, ReplaceOutcome},
  medication::NewMedication,
  metric::{MetricType, NewSample},
  observation::DailyObservation,
  store::BaselineStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

fn baseline(user_id: Uuid, sleep_mean: f64, updated_at: DateTime<Utc>) -> BaselineMetrics {
  BaselineMetrics {
    user_id,
    sleep: Some(MetricBaseline { mean: sleep_mean, sd: 0.7 }),
    steps: Some(MetricBaseline { mean: 8200.0, sd: 1500.0 }),
    screen_unlocks: None,
    calculation_method: CALCULATION_METHOD.to_owned(),
    window_days: 60,
    medication_changes_detected: false,
    updated_at,
  }
}

// ─── Samples ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn samples_since_filters_by_user_and_time() {
  let s = store().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();

  s.record_sample(NewSample::new(alice, MetricType::Steps, 4000.0, at(1, 9)))
    .await
    .unwrap();
  s.record_sample(NewSample::new(alice, MetricType::Steps, 6000.0, at(10, 9)))
    .await
    .unwrap();
  s.record_sample(NewSample::new(alice, MetricType::SleepHours, 7.5, at(12, 7)))
    .await
    .unwrap();
  s.record_sample(NewSample::new(bob, MetricType::Steps, 9000.0, at(12, 9)))
    .await
    .unwrap();

  let samples = s.samples_since(alice, at(5, 0)).await.unwrap();
  assert_eq!(samples.len(), 2);
  assert!(samples.iter().all(|x| x.user_id == alice));
  assert_eq!(samples[0].value, 6000.0);
  assert_eq!(samples[1].metric_type, MetricType::SleepHours);
  assert_eq!(samples[1].recorded_at, at(12, 7));
}

#[tokio::test]
async fn sampled_users_are_distinct() {
  let s = store().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();
  for day in 1..=3 {
    s.record_sample(NewSample::new(alice, MetricType::Steps, 1.0, at(day, 9)))
      .await
      .unwrap();
  }
  s.record_sample(NewSample::new(bob, MetricType::Steps, 1.0, at(1, 9)))
    .await
    .unwrap();

  let mut users = s.list_sampled_users().await.unwrap();
  users.sort();
  let mut expected = vec![alice, bob];
  expected.sort();
  assert_eq!(users, expected);
}

// ─── Medications ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn medications_since_respects_horizon() {
  let s = store().await;
  let user = Uuid::new_v4();
  for (name, day) in [("lithium", 2), ("quetiapine", 20)] {
    s.record_medication(NewMedication {
      user_id:    user,
      name:       name.into(),
      created_at: at(day, 12),
    })
    .await
    .unwrap();
  }

  let recent = s.medications_since(user, at(10, 0)).await.unwrap();
  assert_eq!(recent.len(), 1);
  assert_eq!(recent[0].name, "quetiapine");

  let none = s.medications_since(Uuid::new_v4(), at(1, 0)).await.unwrap();
  assert!(none.is_empty());
}

// ─── Observations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn observation_upsert_and_get() {
  let s = store().await;
  let user = Uuid::new_v4();
  let date = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();

  s.record_observation(DailyObservation {
    user_id:        user,
    date,
    sleep_hours:    Some(6.0),
    steps:          None,
    screen_unlocks: Some(80.0),
  })
  .await
  .unwrap();
  s.record_observation(DailyObservation {
    user_id:        user,
    date,
    sleep_hours:    Some(5.5),
    steps:          Some(3000.0),
    screen_unlocks: Some(80.0),
  })
  .await
  .unwrap();

  let obs = s.get_observation(user, date).await.unwrap().unwrap();
  assert_eq!(obs.sleep_hours, Some(5.5));
  assert_eq!(obs.steps, Some(3000.0));

  let missing = s
    .get_observation(user, date + Duration::days(1))
    .await
    .unwrap();
  assert!(missing.is_none());
}

// ─── Baselines ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_baseline_writes_no_history() {
  let s = store().await;
  let user = Uuid::new_v4();

  let outcome = s
    .replace_baseline(baseline(user, 7.8, at(1, 0)), None, "initial".into())
    .await
    .unwrap();
  assert_eq!(outcome, ReplaceOutcome::Replaced { archived: None });

  let stored = s.get_baseline(user).await.unwrap().unwrap();
  assert_eq!(stored, baseline(user, 7.8, at(1, 0)));
  assert!(stored.screen_unlocks.is_none());
  assert!(s.baseline_history(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn overwrite_archives_exactly_once() {
  let s = store().await;
  let user = Uuid::new_v4();
  let first = baseline(user, 7.8, at(1, 0));
  s.replace_baseline(first.clone(), None, "initial".into())
    .await
    .unwrap();

  let second = baseline(user, 6.9, at(31, 0));
  let outcome = s
    .replace_baseline(second.clone(), Some(first.clone()), "30-day window".into())
    .await
    .unwrap();

  let ReplaceOutcome::Replaced { archived: Some(entry) } = outcome else {
    panic!("expected an archived entry, got {outcome:?}");
  };
  assert_eq!(entry.snapshot, first);
  assert_eq!(entry.replaced_at, at(31, 0));

  let history = s.baseline_history(user).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].snapshot, first);
  assert_eq!(history[0].version_notes, "30-day window");
  assert_eq!(s.get_baseline(user).await.unwrap().unwrap(), second);
}

#[tokio::test]
async fn stale_previous_is_a_conflict() {
  let s = store().await;
  let user = Uuid::new_v4();
  let first = baseline(user, 7.8, at(1, 0));
  s.replace_baseline(first.clone(), None, "initial".into())
    .await
    .unwrap();
  let second = baseline(user, 7.1, at(2, 0));
  s.replace_baseline(second.clone(), Some(first.clone()), "refresh".into())
    .await
    .unwrap();

  // A writer that still believes `first` is current must not overwrite.
  let outcome = s
    .replace_baseline(baseline(user, 5.0, at(3, 0)), Some(first), "late".into())
    .await
    .unwrap();
  assert_eq!(
    outcome,
    ReplaceOutcome::Conflict { current_updated_at: Some(at(2, 0)) }
  );
  assert_eq!(s.get_baseline(user).await.unwrap().unwrap(), second);
  assert_eq!(s.baseline_history(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn creating_over_existing_row_is_a_conflict() {
  let s = store().await;
  let user = Uuid::new_v4();
  s.replace_baseline(baseline(user, 7.8, at(1, 0)), None, "initial".into())
    .await
    .unwrap();

  let outcome = s
    .replace_baseline(baseline(user, 6.0, at(2, 0)), None, "racing".into())
    .await
    .unwrap();
  assert!(matches!(outcome, ReplaceOutcome::Conflict { .. }));
}

#[tokio::test]
async fn list_baselines_returns_every_user() {
  let s = store().await;
  for day in [3, 1, 2] {
    s.replace_baseline(baseline(Uuid::new_v4(), 7.0, at(day, 0)), None, "initial".into())
      .await
      .unwrap();
  }
  let all = s.list_baselines().await.unwrap();
  assert_eq!(all.len(), 3);
  assert!(all.windows(2).all(|w| w[0].updated_at <= w[1].updated_at));
}

#[tokio::test]
async fn history_is_newest_first() {
  let s = store().await;
  let user = Uuid::new_v4();
  let mut previous = None;
  for day in 1..=3 {
    let next = baseline(user, 7.0 + f64::from(day) / 10.0, at(day, 0));
    s.replace_baseline(next.clone(), previous.take(), format!("run {day}"))
      .await
      .unwrap();
    previous = Some(next);
  }

  let history = s.baseline_history(user).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].version_notes, "run 3");
  assert_eq!(history[1].version_notes, "run 2");
}
