//! Eligibility selection and the batch worker pool.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use steady_core::store::BaselineStore;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
  Engine, Error, RecomputeOutcome, Result,
  error::store_err,
};

/// Which users a run should consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeRequest {
  /// Recompute this user regardless of how fresh their baseline is.
  Forced(Uuid),
  /// Recompute every user whose baseline is due.
  Batch,
}

impl From<Option<Uuid>> for RecomputeRequest {
  fn from(user_id: Option<Uuid>) -> Self {
    user_id.map_or(Self::Batch, Self::Forced)
  }
}

/// Tally of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
  /// Users selected for recomputation.
  pub eligible: usize,
  /// Users whose baseline was written.
  pub updated:  usize,
  /// Users skipped for lack of data.
  pub skipped:  usize,
  /// Users whose recomputation failed.
  pub failed:   usize,
}

impl<S> Engine<S>
where
  S: BaselineStore + 'static,
{
  /// Resolve `request` to the list of users to recompute.
  pub async fn select_users(
    &self,
    request: RecomputeRequest,
    now: DateTime<Utc>,
  ) -> Result<Vec<Uuid>> {
    if let RecomputeRequest::Forced(user_id) = request {
      return Ok(vec![user_id]);
    }

    let config = self.config();
    let baselines = self.store().list_baselines().await.map_err(store_err)?;

    let mut users: Vec<Uuid> = baselines
      .iter()
      .filter(|b| b.is_due(now, config.refresh_interval_days))
      .map(|b| b.user_id)
      .collect();

    if config.include_new_users {
      let known: HashSet<Uuid> = baselines.iter().map(|b| b.user_id).collect();
      let sampled = self.store().list_sampled_users().await.map_err(store_err)?;
      users.extend(sampled.into_iter().filter(|u| !known.contains(u)));
    }

    Ok(users)
  }

  /// Select users for `request` and recompute each on the worker pool.
  ///
  /// Only a failure to select users is returned as an error; per-user
  /// failures are logged and counted in [`RunSummary::failed`].
  pub async fn run(
    &self,
    request: RecomputeRequest,
    now: DateTime<Utc>,
  ) -> Result<RunSummary> {
    let users = self.select_users(request, now).await?;
    let mut summary = RunSummary { eligible: users.len(), ..Default::default() };
    info!(eligible = users.len(), ?request, "baseline run started");

    let permits = Arc::new(Semaphore::new(self.config().workers));
    let mut tasks = JoinSet::new();
    let mut task_users = HashMap::with_capacity(users.len());

    for user_id in users {
      let permit = Arc::clone(&permits)
        .acquire_owned()
        .await
        .map_err(|e| Error::Worker(e.to_string()))?;
      let engine = self.clone();
      let handle = tasks.spawn(async move {
        let _permit = permit;
        (user_id, engine.recompute_user(user_id, now).await)
      });
      task_users.insert(handle.id(), user_id);
    }

    while let Some(joined) = tasks.join_next_with_id().await {
      match joined {
        Ok((_, (_, Ok(RecomputeOutcome::Updated { .. })))) => summary.updated += 1,
        Ok((_, (_, Ok(RecomputeOutcome::InsufficientData)))) => summary.skipped += 1,
        Ok((_, (user_id, Err(e)))) => {
          warn!(user_id = %user_id, error = %e, "baseline recomputation failed");
          summary.failed += 1;
        }
        Err(e) => {
          // A panicked task never returned its user id.
          let user_id = task_users.get(&e.id()).copied().unwrap_or_default();
          error!(user_id = %user_id, error = %e, "baseline worker task aborted");
          summary.failed += 1;
        }
      }
    }

    info!(
      eligible = summary.eligible,
      updated = summary.updated,
      skipped = summary.skipped,
      failed = summary.failed,
      "baseline run finished"
    );
    Ok(summary)
  }
}
