//! A user's observed summary for a single day, the input to deviation scoring.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metric::MetricType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
  pub user_id:        Uuid,
  pub date:           NaiveDate,
  pub sleep_hours:    Option<f64>,
  pub steps:          Option<f64>,
  pub screen_unlocks: Option<f64>,
}

impl DailyObservation {
  pub fn value(&self, metric: MetricType) -> Option<f64> {
    match metric {
      MetricType::SleepHours => self.sleep_hours,
      MetricType::Steps => self.steps,
      MetricType::ScreenUnlocks => self.screen_unlocks,
    }
  }
}
