//! Medication regimen records.
//!
//! Only the creation timestamp matters to the engine: a record created inside
//! the lookback horizon marks a possible shift in the user's distribution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRecord {
  pub medication_id: Uuid,
  pub user_id:       Uuid,
  pub name:          String,
  pub created_at:    DateTime<Utc>,
}

/// Input for recording a regimen change; the store assigns `medication_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedication {
  pub user_id:    Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}
