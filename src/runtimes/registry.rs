//! The run registry: the one cross-run mutable resource.
//!
//! An entry's existence means "running"; deleting it is the cancellation
//! signal. Each run only touches its own key, so no cross-run coordination
//! is needed beyond the map lock.

use std::sync::Mutex;

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::streaming::StopFlag;

/// Key-value run tracking. External stores (Redis and friends) implement
/// this trait; [`InMemoryRunRegistry`] covers single-process deployments
/// and tests.
#[async_trait]
pub trait RunRegistry: Send + Sync {
    /// Record a new running run.
    async fn register(&self, run_id: &str, stop: StopFlag);

    /// Whether the run's entry still exists.
    async fn is_running(&self, run_id: &str) -> bool;

    /// Cancel a run: delete its entry and trip its stop flag. Idempotent;
    /// cancelling an unknown or finished run is not an error.
    async fn cancel(&self, run_id: &str);

    /// Remove the entry on normal completion without tripping the flag.
    async fn remove(&self, run_id: &str);
}

/// Process-local registry backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryRunRegistry {
    entries: Mutex<FxHashMap<String, StopFlag>>,
}

impl InMemoryRunRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunRegistry for InMemoryRunRegistry {
    async fn register(&self, run_id: &str, stop: StopFlag) {
        self.entries
            .lock()
            .expect("run registry lock poisoned")
            .insert(run_id.to_string(), stop);
    }

    async fn is_running(&self, run_id: &str) -> bool {
        self.entries
            .lock()
            .expect("run registry lock poisoned")
            .contains_key(run_id)
    }

    async fn cancel(&self, run_id: &str) {
        let removed = self
            .entries
            .lock()
            .expect("run registry lock poisoned")
            .remove(run_id);
        if let Some(stop) = removed {
            tracing::info!(%run_id, "run cancelled");
            stop.stop();
        }
    }

    async fn remove(&self, run_id: &str) {
        self.entries
            .lock()
            .expect("run registry lock poisoned")
            .remove(run_id);
    }
}
