//! [`SqliteStore`]: the SQLite implementation of [`BaselineStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use steady_core::{
  baseline::{BaselineHistory, BaselineMetrics, ReplaceOutcome},
  medication::{MedicationRecord, NewMedication},
  metric::{MetricType, NewSample, RawSample},
  observation::DailyObservation,
  store::BaselineStore,
};

use crate::{
  Result,
  encode::{
    BASELINE_COLUMNS, RawBaseline, RawHistory, RawMedication, RawObservation,
    RawSampleRow, decode_dt, decode_uuid, encode_date, encode_dt, encode_uuid,
    split_pair,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Steady baseline store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// `'sleep_hours', 'steps', 'screen_unlocks'`; samples of any other metric
/// type are ignored by the engine.
fn known_metrics_sql() -> String {
  MetricType::ALL
    .iter()
    .map(|m| format!("'{}'", m.as_str()))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── BaselineStore impl ──────────────────────────────────────────────────────

impl BaselineStore for SqliteStore {
  type Error = crate::Error;

  // ── Inputs ────────────────────────────────────────────────────────────────

  async fn record_sample(&self, input: NewSample) -> Result<RawSample> {
    let sample = RawSample {
      sample_id:   Uuid::new_v4(),
      user_id:     input.user_id,
      metric_type: input.metric_type,
      value:       input.value,
      recorded_at: input.recorded_at,
    };

    let id_str     = encode_uuid(sample.sample_id);
    let user_str   = encode_uuid(sample.user_id);
    let metric_str = sample.metric_type.as_str();
    let value      = sample.value;
    let at_str     = encode_dt(sample.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO raw_samples (sample_id, user_id, metric_type, value, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, user_str, metric_str, value, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(sample)
  }

  async fn record_medication(&self, input: NewMedication) -> Result<MedicationRecord> {
    let record = MedicationRecord {
      medication_id: Uuid::new_v4(),
      user_id:       input.user_id,
      name:          input.name,
      created_at:    input.created_at,
    };

    let id_str   = encode_uuid(record.medication_id);
    let user_str = encode_uuid(record.user_id);
    let name     = record.name.clone();
    let at_str   = encode_dt(record.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO medications (medication_id, user_id, name, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, user_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn record_observation(&self, observation: DailyObservation) -> Result<()> {
    let user_str = encode_uuid(observation.user_id);
    let date_str = encode_date(observation.date);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO daily_observations (user_id, date, sleep_hours, steps, screen_unlocks)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (user_id, date) DO UPDATE SET
             sleep_hours    = excluded.sleep_hours,
             steps          = excluded.steps,
             screen_unlocks = excluded.screen_unlocks",
          rusqlite::params![
            user_str,
            date_str,
            observation.sleep_hours,
            observation.steps,
            observation.screen_unlocks,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn samples_since(
    &self,
    user_id: Uuid,
    since:   DateTime<Utc>,
  ) -> Result<Vec<RawSample>> {
    let user_str  = encode_uuid(user_id);
    let since_str = encode_dt(since);
    let sql = format!(
      "SELECT sample_id, user_id, metric_type, value, recorded_at
       FROM raw_samples
       WHERE user_id = ?1
         AND recorded_at >= ?2
         AND metric_type IN ({})
       ORDER BY recorded_at",
      known_metrics_sql()
    );

    let raws: Vec<RawSampleRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, since_str], |row| {
            Ok(RawSampleRow {
              sample_id:   row.get(0)?,
              user_id:     row.get(1)?,
              metric_type: row.get(2)?,
              value:       row.get(3)?,
              recorded_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSampleRow::into_sample).collect()
  }

  async fn medications_since(
    &self,
    user_id: Uuid,
    since:   DateTime<Utc>,
  ) -> Result<Vec<MedicationRecord>> {
    let user_str  = encode_uuid(user_id);
    let since_str = encode_dt(since);

    let raws: Vec<RawMedication> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT medication_id, user_id, name, created_at
           FROM medications
           WHERE user_id = ?1 AND created_at >= ?2
           ORDER BY created_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, since_str], |row| {
            Ok(RawMedication {
              medication_id: row.get(0)?,
              user_id:       row.get(1)?,
              name:          row.get(2)?,
              created_at:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMedication::into_medication).collect()
  }

  async fn get_observation(
    &self,
    user_id: Uuid,
    date:    NaiveDate,
  ) -> Result<Option<DailyObservation>> {
    let user_str = encode_uuid(user_id);
    let date_str = encode_date(date);

    let raw: Option<RawObservation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, date, sleep_hours, steps, screen_unlocks
               FROM daily_observations
               WHERE user_id = ?1 AND date = ?2",
              rusqlite::params![user_str, date_str],
              |row| {
                Ok(RawObservation {
                  user_id:        row.get(0)?,
                  date:           row.get(1)?,
                  sleep_hours:    row.get(2)?,
                  steps:          row.get(3)?,
                  screen_unlocks: row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawObservation::into_observation).transpose()
  }

  async fn list_sampled_users(&self) -> Result<Vec<Uuid>> {
    let ids: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT DISTINCT user_id FROM raw_samples ORDER BY user_id")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  // ── Baselines ─────────────────────────────────────────────────────────────

  async fn get_baseline(&self, user_id: Uuid) -> Result<Option<BaselineMetrics>> {
    let user_str = encode_uuid(user_id);
    let sql = format!("SELECT {BASELINE_COLUMNS} FROM baseline_metrics WHERE user_id = ?1");

    let raw: Option<RawBaseline> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![user_str], RawBaseline::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBaseline::into_baseline).transpose()
  }

  async fn list_baselines(&self) -> Result<Vec<BaselineMetrics>> {
    let sql = format!("SELECT {BASELINE_COLUMNS} FROM baseline_metrics ORDER BY updated_at");

    let raws: Vec<RawBaseline> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawBaseline::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBaseline::into_baseline).collect()
  }

  async fn baseline_history(&self, user_id: Uuid) -> Result<Vec<BaselineHistory>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT history_id, user_id, snapshot_json, replaced_at, version_notes
           FROM baseline_history
           WHERE user_id = ?1
           ORDER BY replaced_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawHistory {
              history_id:    row.get(0)?,
              user_id:       row.get(1)?,
              snapshot_json: row.get(2)?,
              replaced_at:   row.get(3)?,
              version_notes: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_history).collect()
  }

  async fn replace_baseline(
    &self,
    next:          BaselineMetrics,
    previous:      Option<BaselineMetrics>,
    version_notes: String,
  ) -> Result<ReplaceOutcome> {
    let expected_str = previous.as_ref().map(|p| encode_dt(p.updated_at));

    let archived = previous.map(|snapshot| BaselineHistory {
      history_id: Uuid::new_v4(),
      user_id: next.user_id,
      snapshot,
      replaced_at: next.updated_at,
      version_notes,
    });
    let history_row = archived
      .as_ref()
      .map(|h| -> Result<[String; 5]> {
        Ok([
          encode_uuid(h.history_id),
          encode_uuid(h.user_id),
          serde_json::to_string(&h.snapshot)?,
          encode_dt(h.replaced_at),
          h.version_notes.clone(),
        ])
      })
      .transpose()?;

    let user_str                    = encode_uuid(next.user_id);
    let (sleep_mean, sleep_sd)      = split_pair(next.sleep);
    let (steps_mean, steps_sd)      = split_pair(next.steps);
    let (unlocks_mean, unlocks_sd)  = split_pair(next.screen_unlocks);
    let method                      = next.calculation_method.clone();
    let window_days                 = next.window_days;
    let medication_changes_detected = next.medication_changes_detected;
    let updated_str                 = encode_dt(next.updated_at);

    // `Some(current)` means the optimistic check failed.
    let conflict: Option<Option<String>> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: Option<String> = tx
          .query_row(
            "SELECT updated_at FROM baseline_metrics WHERE user_id = ?1",
            rusqlite::params![user_str],
            |r| r.get(0),
          )
          .optional()?;
        if current != expected_str {
          return Ok(Some(current));
        }

        if let Some([history_id, user_id, snapshot_json, replaced_at, notes]) = history_row {
          tx.execute(
            "INSERT INTO baseline_history
               (history_id, user_id, snapshot_json, replaced_at, version_notes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![history_id, user_id, snapshot_json, replaced_at, notes],
          )?;
        }

        tx.execute(
          "INSERT INTO baseline_metrics (
             user_id, sleep_mean, sleep_sd, steps_mean, steps_sd,
             unlocks_mean, unlocks_sd, calculation_method, window_days,
             medication_changes_detected, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
           ON CONFLICT (user_id) DO UPDATE SET
             sleep_mean                  = excluded.sleep_mean,
             sleep_sd                    = excluded.sleep_sd,
             steps_mean                  = excluded.steps_mean,
             steps_sd                    = excluded.steps_sd,
             unlocks_mean                = excluded.unlocks_mean,
             unlocks_sd                  = excluded.unlocks_sd,
             calculation_method          = excluded.calculation_method,
             window_days                 = excluded.window_days,
             medication_changes_detected = excluded.medication_changes_detected,
             updated_at                  = excluded.updated_at",
          rusqlite::params![
            user_str,
            sleep_mean,
            sleep_sd,
            steps_mean,
            steps_sd,
            unlocks_mean,
            unlocks_sd,
            method,
            window_days,
            medication_changes_detected,
            updated_str,
          ],
        )?;

        tx.commit()?;
        Ok(None)
      })
      .await?;

    match conflict {
      Some(current) => Ok(ReplaceOutcome::Conflict {
        current_updated_at: current.as_deref().map(decode_dt).transpose()?,
      }),
      None => Ok(ReplaceOutcome::Replaced { archived }),
    }
  }
}
