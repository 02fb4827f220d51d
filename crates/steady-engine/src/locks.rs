//! Per-user advisory locks.
//!
//! Held for the whole of one user's recomputation so that a forced call and a
//! batch run cannot interleave their read → archive → upsert steps. The
//! store's optimistic `updated_at` check still guards writers in other
//! processes.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct UserLocks {
  inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl UserLocks {
  /// Wait for and take the lock for `user_id`.
  pub async fn lock(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
    let slot = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      // Entries only the map refers to are neither held nor awaited.
      map.retain(|_, m| Arc::strong_count(m) > 1);
      Arc::clone(map.entry(user_id).or_default())
    };
    slot.lock_owned().await
  }

  /// Number of users currently locked or being waited on.
  #[cfg(test)]
  fn active(&self) -> usize {
    let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    map.values().filter(|m| Arc::strong_count(m) > 1).count()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn same_user_is_exclusive() {
    let locks = UserLocks::default();
    let user = Uuid::new_v4();

    let guard = locks.lock(user).await;
    let contender = {
      let locks = locks.clone();
      tokio::spawn(async move { locks.lock(user).await; })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!contender.is_finished());

    drop(guard);
    tokio::time::timeout(Duration::from_secs(1), contender)
      .await
      .expect("contender acquires after release")
      .unwrap();
  }

  #[tokio::test]
  async fn different_users_do_not_block() {
    let locks = UserLocks::default();
    let _a = locks.lock(Uuid::new_v4()).await;
    let _b = tokio::time::timeout(Duration::from_secs(1), locks.lock(Uuid::new_v4()))
      .await
      .expect("independent lock");
    assert_eq!(locks.active(), 2);
  }

  #[tokio::test]
  async fn released_entries_are_pruned() {
    let locks = UserLocks::default();
    drop(locks.lock(Uuid::new_v4()).await);
    assert_eq!(locks.active(), 0);
    let _held = locks.lock(Uuid::new_v4()).await;
    assert_eq!(locks.inner.lock().unwrap().len(), 1);
  }
}
