//! The `BaselineStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `steady-store-sqlite`).
//! The engine and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  baseline::{BaselineHistory, BaselineMetrics, ReplaceOutcome},
  medication::{MedicationRecord, NewMedication},
  metric::{NewSample, RawSample},
  observation::DailyObservation,
};

/// Abstraction over a Steady storage backend.
///
/// Raw samples, medication records, observations and baseline history are
/// append-only. The active baseline row is only ever changed through
/// [`BaselineStore::replace_baseline`], which archives the previous content in
/// the same transaction.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BaselineStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Inputs written by external collaborators ──────────────────────────

  /// Append a raw sensor sample.
  fn record_sample(
    &self,
    input: NewSample,
  ) -> impl Future<Output = Result<RawSample, Self::Error>> + Send + '_;

  /// Append a medication regimen record.
  fn record_medication(
    &self,
    input: NewMedication,
  ) -> impl Future<Output = Result<MedicationRecord, Self::Error>> + Send + '_;

  /// Store a day's observed summary, replacing any earlier one for that day.
  fn record_observation(
    &self,
    observation: DailyObservation,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// All samples for `user_id` recorded at or after `since`.
  fn samples_since(
    &self,
    user_id: Uuid,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<RawSample>, Self::Error>> + Send + '_;

  /// All medication records for `user_id` created at or after `since`.
  fn medications_since(
    &self,
    user_id: Uuid,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<MedicationRecord>, Self::Error>> + Send + '_;

  /// The observation for `user_id` on `date`, if any.
  fn get_observation(
    &self,
    user_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<DailyObservation>, Self::Error>> + Send + '_;

  /// Users that have at least one raw sample.
  fn list_sampled_users(
    &self,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Baselines ─────────────────────────────────────────────────────────

  /// The active baseline for `user_id`. Returns `None` if never computed.
  fn get_baseline(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<BaselineMetrics>, Self::Error>> + Send + '_;

  /// Every active baseline row.
  fn list_baselines(
    &self,
  ) -> impl Future<Output = Result<Vec<BaselineMetrics>, Self::Error>> + Send + '_;

  /// Archived baselines for `user_id`, newest first.
  fn baseline_history(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<BaselineHistory>, Self::Error>> + Send + '_;

  /// Archive `previous` and upsert `next`, atomically.
  ///
  /// `previous` is the row the caller read before computing `next` (`None` if
  /// the user had no baseline yet). If the stored row's `updated_at` no longer
  /// matches it, nothing is written and [`ReplaceOutcome::Conflict`] is
  /// returned. Otherwise exactly one history entry is appended when
  /// `previous` is `Some`, then `next` becomes the active row.
  fn replace_baseline(
    &self,
    next: BaselineMetrics,
    previous: Option<BaselineMetrics>,
    version_notes: String,
  ) -> impl Future<Output = Result<ReplaceOutcome, Self::Error>> + Send + '_;
}
