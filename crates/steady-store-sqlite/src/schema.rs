//! SQL schema for the Steady SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Raw sensor samples; written by the ingestion collaborator, never updated.
CREATE TABLE IF NOT EXISTS raw_samples (
    sample_id    TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,
    metric_type  TEXT NOT NULL,   -- 'sleep_hours' | 'steps' | 'screen_unlocks'
    value        REAL NOT NULL,
    recorded_at  TEXT NOT NULL    -- RFC 3339 UTC, fixed microsecond precision
);

CREATE TABLE IF NOT EXISTS medications (
    medication_id TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    name          TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS daily_observations (
    user_id        TEXT NOT NULL,
    date           TEXT NOT NULL,  -- YYYY-MM-DD
    sleep_hours    REAL,
    steps          REAL,
    screen_unlocks REAL,
    PRIMARY KEY (user_id, date)
);

-- One active baseline per user. Each mean/sd pair is both set or both NULL.
CREATE TABLE IF NOT EXISTS baseline_metrics (
    user_id                     TEXT PRIMARY KEY,
    sleep_mean                  REAL,
    sleep_sd                    REAL,
    steps_mean                  REAL,
    steps_sd                    REAL,
    unlocks_mean                REAL,
    unlocks_sd                  REAL,
    calculation_method          TEXT NOT NULL,
    window_days                 INTEGER NOT NULL,
    medication_changes_detected INTEGER NOT NULL,
    updated_at                  TEXT NOT NULL,
    CHECK ((sleep_mean   IS NULL) = (sleep_sd   IS NULL)),
    CHECK ((steps_mean   IS NULL) = (steps_sd   IS NULL)),
    CHECK ((unlocks_mean IS NULL) = (unlocks_sd IS NULL))
);

-- Strictly append-only; one row per overwrite of baseline_metrics.
CREATE TABLE IF NOT EXISTS baseline_history (
    history_id    TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    snapshot_json TEXT NOT NULL,
    replaced_at   TEXT NOT NULL,
    version_notes TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS raw_samples_user_idx ON raw_samples(user_id, recorded_at);
CREATE INDEX IF NOT EXISTS medications_user_idx ON medications(user_id, created_at);
CREATE INDEX IF NOT EXISTS history_user_idx     ON baseline_history(user_id, replaced_at);

PRAGMA user_version = 1;
";
