//! Lookback window selection.
//!
//! A medication regimen change inside the maximum lookback horizon may shift
//! the user's sleep and activity distribution, so the window contracts to
//! avoid mixing pre- and post-change data.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::medication::MedicationRecord;

/// Window lengths used by [`select_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowParams {
  /// Lookback used when no confound is present; also the confound horizon.
  pub max_window_days:      u32,
  /// Lookback used when a confound is present.
  pub confound_window_days: u32,
}

impl Default for WindowParams {
  fn default() -> Self {
    Self { max_window_days: 60, confound_window_days: 30 }
  }
}

/// The window chosen for one recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSelection {
  pub window_days:                 u32,
  pub medication_changes_detected: bool,
  /// Number of medication records inside the horizon.
  pub confounds:                   usize,
}

pub fn select_window(
  medications: &[MedicationRecord],
  now: DateTime<Utc>,
  params: &WindowParams,
) -> WindowSelection {
  let horizon = now - Duration::days(i64::from(params.max_window_days));
  let confounds = medications
    .iter()
    .filter(|m| m.created_at >= horizon && m.created_at <= now)
    .count();

  if confounds > 0 {
    WindowSelection {
      window_days: params.confound_window_days,
      medication_changes_detected: true,
      confounds,
    }
  } else {
    WindowSelection {
      window_days: params.max_window_days,
      medication_changes_detected: false,
      confounds,
    }
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn med(days_ago: i64, now: DateTime<Utc>) -> MedicationRecord {
    MedicationRecord {
      medication_id: Uuid::new_v4(),
      user_id:       Uuid::nil(),
      name:          "sertraline".into(),
      created_at:    now - Duration::days(days_ago),
    }
  }

  #[test]
  fn no_medication_uses_full_window() {
    let sel = select_window(&[], Utc::now(), &WindowParams::default());
    assert_eq!(sel.window_days, 60);
    assert!(!sel.medication_changes_detected);
  }

  #[test]
  fn recent_medication_contracts_window() {
    let now = Utc::now();
    let sel = select_window(&[med(10, now)], now, &WindowParams::default());
    assert_eq!(sel.window_days, 30);
    assert!(sel.medication_changes_detected);
    assert_eq!(sel.confounds, 1);
  }

  #[test]
  fn medication_outside_horizon_is_ignored() {
    let now = Utc::now();
    let sel = select_window(&[med(61, now), med(120, now)], now, &WindowParams::default());
    assert_eq!(sel.window_days, 60);
    assert!(!sel.medication_changes_detected);
    assert_eq!(sel.confounds, 0);
  }

  #[test]
  fn magnitude_does_not_matter() {
    let now = Utc::now();
    let many: Vec<_> = (1..=5).map(|d| med(d, now)).collect();
    let sel = select_window(&many, now, &WindowParams::default());
    assert_eq!(sel.window_days, 30);
    assert_eq!(sel.confounds, 5);
  }
}
