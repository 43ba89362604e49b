use std::sync::Arc;

use shared::domain::{total_salary, SpyCat, SpyCatId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    api::SpyCatApi,
    events::{EventSink, Notice},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Idle,
    Loading,
    Ready,
    Error(String),
}

/// Read-only copy of the held list handed to renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub status: ListStatus,
    pub cats: Vec<SpyCat>,
}

impl ListSnapshot {
    pub fn total_salary(&self) -> f64 {
        total_salary(&self.cats)
    }

    pub fn find(&self, id: SpyCatId) -> Option<&SpyCat> {
        self.cats.iter().find(|cat| cat.id == id)
    }

    pub fn can_retry(&self) -> bool {
        matches!(self.status, ListStatus::Error(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    Failed,
    /// A newer refresh was issued while this one was in flight.
    Superseded,
}

struct StoreState {
    status: ListStatus,
    cats: Vec<SpyCat>,
    generation: u64,
}

/// Owns the canonical list. The list only changes by wholesale replacement
/// from a completed `list_all`.
pub struct EntityStore {
    api: Arc<dyn SpyCatApi>,
    events: EventSink,
    inner: Mutex<StoreState>,
}

impl EntityStore {
    pub fn new(api: Arc<dyn SpyCatApi>, events: EventSink) -> Arc<Self> {
        Arc::new(Self {
            api,
            events,
            inner: Mutex::new(StoreState {
                status: ListStatus::Idle,
                cats: Vec::new(),
                generation: 0,
            }),
        })
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let generation = {
            let mut guard = self.inner.lock().await;
            guard.generation += 1;
            guard.status = ListStatus::Loading;
            guard.generation
        };
        debug!(generation, "fetching spy cats");

        let result = self.api.list_all().await;

        let mut guard = self.inner.lock().await;
        if guard.generation != generation {
            debug!(
                generation,
                latest = guard.generation,
                "discarding superseded list response"
            );
            return RefreshOutcome::Superseded;
        }

        match result {
            Ok(cats) => {
                info!(count = cats.len(), "spy cat list replaced");
                let count = cats.len();
                guard.cats = cats;
                guard.status = ListStatus::Ready;
                drop(guard);
                self.events.list_replaced(count);
                RefreshOutcome::Applied
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch spy cats");
                guard.cats.clear();
                guard.status = ListStatus::Error(err.message.clone());
                drop(guard);
                self.events.notify(Notice::error(err.message));
                RefreshOutcome::Failed
            }
        }
    }

    /// Retry affordance of the error panel; re-issues the same fetch.
    pub async fn retry(&self) -> RefreshOutcome {
        self.refresh().await
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        let guard = self.inner.lock().await;
        ListSnapshot {
            status: guard.status.clone(),
            cats: guard.cats.clone(),
        }
    }

    pub async fn status(&self) -> ListStatus {
        self.inner.lock().await.status.clone()
    }

    pub fn refresh_handle(self: &Arc<Self>) -> RefreshHandle {
        RefreshHandle {
            store: Arc::clone(self),
        }
    }
}

/// Callback handle given to mutation flows so they can request a full
/// resynchronization without touching the list themselves.
#[derive(Clone)]
pub struct RefreshHandle {
    store: Arc<EntityStore>,
}

impl RefreshHandle {
    pub async fn request(&self) -> RefreshOutcome {
        self.store.refresh().await
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
