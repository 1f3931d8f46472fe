//! Per-campaign mutual exclusion.
//!
//! Every turn for a campaign runs under that campaign's async mutex, so two
//! concurrent actions can never interleave on the same snapshot, prompt or
//! event numbers. Different campaigns proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use tracing::warn;
use uuid::Uuid;
use wayfarer_core::error::DomainError;

type LockMap = Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>;

fn poisoned(e: impl std::fmt::Display) -> DomainError {
    DomainError::Infrastructure(format!("lock registry poisoned: {e}"))
}

/// Registry of per-campaign async mutexes.
///
/// An entry lives only while some task holds or waits for it, so lookups of
/// unknown campaigns leave nothing behind.
#[derive(Debug, Default)]
pub struct CampaignLocks {
    locks: Arc<LockMap>,
}

/// Held for the duration of one turn.
#[derive(Debug)]
pub struct CampaignGuard {
    campaign_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    lock: Arc<tokio::sync::Mutex<()>>,
    registry: Arc<LockMap>,
}

impl Drop for CampaignGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let Ok(mut locks) = self.registry.lock() else {
            warn!(campaign_id = %self.campaign_id, "lock registry poisoned, entry kept");
            return;
        };
        // The registry and this guard hold the only references: nobody waits.
        let idle = locks
            .get(&self.campaign_id)
            .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2);
        if idle {
            locks.remove(&self.campaign_id);
        }
    }
}

impl CampaignLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `campaign_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the registry mutex is poisoned.
    pub async fn acquire(&self, campaign_id: Uuid) -> Result<CampaignGuard, DomainError> {
        let lock = {
            let mut locks = self.locks.lock().map_err(poisoned)?;
            Arc::clone(locks.entry(campaign_id).or_default())
        };
        let guard = Arc::clone(&lock).lock_owned().await;
        Ok(CampaignGuard {
            campaign_id,
            guard: Some(guard),
            lock,
            registry: Arc::clone(&self.locks),
        })
    }

    /// Number of campaigns with a registered lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().map_or(0, |locks| locks.len())
    }

    /// Whether no campaign has a registered lock.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
