//! Per-card salary editing and deletion.
//!
//! Each rendered card owns a small state machine keyed by its id. Cards never
//! share a lock: one card's in-flight request only disables that card.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use shared::{
    domain::{SpyCat, SpyCatId, SpyCatUpdate},
    error::ServiceError,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    api::SpyCatApi,
    events::{EventSink, Notice},
    store::RefreshHandle,
};

pub const INVALID_SALARY_NOTICE: &str = "Please enter a valid salary";
pub const SALARY_UPDATED_NOTICE: &str = "Salary updated successfully!";
pub const DELETED_NOTICE: &str = "Spy cat deleted successfully!";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this spy cat?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    Viewing,
    Editing { draft: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub mode: EditMode,
    pub busy: bool,
}

impl ItemSnapshot {
    pub fn viewing() -> Self {
        Self {
            mode: EditMode::Viewing,
            busy: false,
        }
    }

    pub fn controls_enabled(&self) -> bool {
        !self.busy
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.mode {
            EditMode::Editing { draft } => Some(draft),
            EditMode::Viewing => None,
        }
    }
}

/// The explicit "are you sure" step in front of a delete.
///
/// Called synchronously from inside the async delete flow, so it runs on an
/// executor thread. Implementations must answer quickly; prompts that wait on
/// a human should collect the answer up front (see `spawn_blocking`) and hand
/// over a precomputed decision.
pub trait ConfirmDelete: Send + Sync {
    fn confirm(&self, cat: SpyCatId, prompt: &str) -> bool;
}

impl<F> ConfirmDelete for F
where
    F: Fn(SpyCatId, &str) -> bool + Send + Sync,
{
    fn confirm(&self, cat: SpyCatId, prompt: &str) -> bool {
        self(cat, prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("spy cat {0} is busy with another request")]
    Busy(SpyCatId),
    #[error("spy cat {0} is not being edited")]
    NotEditing(SpyCatId),
    #[error("spy cat {0} is being edited")]
    Editing(SpyCatId),
    #[error("Please enter a valid salary")]
    InvalidSalary,
    #[error("{0}")]
    Service(#[from] ServiceError),
}

/// Parses a salary draft. Only finite values above zero pass.
pub fn parse_salary_draft(draft: &str) -> Option<f64> {
    draft
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

pub struct ItemEditController {
    api: Arc<dyn SpyCatApi>,
    refresh: RefreshHandle,
    events: EventSink,
    items: Mutex<HashMap<SpyCatId, ItemSnapshot>>,
}

impl ItemEditController {
    pub fn new(api: Arc<dyn SpyCatApi>, refresh: RefreshHandle, events: EventSink) -> Self {
        Self {
            api,
            refresh,
            events,
            items: Mutex::new(HashMap::new()),
        }
    }

    /// Mounts state for newly rendered cards and drops state for cards that
    /// are gone from the list.
    pub async fn sync(&self, cats: &[SpyCat]) {
        let live: HashSet<SpyCatId> = cats.iter().map(|cat| cat.id).collect();
        let mut items = self.items.lock().await;
        items.retain(|id, _| {
            let keep = live.contains(id);
            if !keep {
                debug!(id = %id, "unmounting card state");
            }
            keep
        });
        for id in live {
            items.entry(id).or_insert_with(ItemSnapshot::viewing);
        }
    }

    pub async fn snapshot(&self, id: SpyCatId) -> ItemSnapshot {
        self.items
            .lock()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_else(ItemSnapshot::viewing)
    }

    pub async fn begin_edit(&self, cat: &SpyCat) -> Result<(), ItemError> {
        let mut items = self.items.lock().await;
        let item = items.entry(cat.id).or_insert_with(ItemSnapshot::viewing);
        if item.busy {
            return Err(ItemError::Busy(cat.id));
        }
        if item.mode == EditMode::Viewing {
            item.mode = EditMode::Editing {
                draft: cat.salary.to_string(),
            };
        }
        Ok(())
    }

    pub async fn set_draft(&self, id: SpyCatId, text: impl Into<String>) -> Result<(), ItemError> {
        let mut items = self.items.lock().await;
        let item = items.entry(id).or_insert_with(ItemSnapshot::viewing);
        if item.busy {
            return Err(ItemError::Busy(id));
        }
        match &mut item.mode {
            EditMode::Editing { draft } => {
                *draft = text.into();
                Ok(())
            }
            EditMode::Viewing => Err(ItemError::NotEditing(id)),
        }
    }

    /// Throws the draft away. The entity itself is untouched.
    pub async fn cancel(&self, id: SpyCatId) -> Result<(), ItemError> {
        let mut items = self.items.lock().await;
        let item = items.entry(id).or_insert_with(ItemSnapshot::viewing);
        if item.busy {
            return Err(ItemError::Busy(id));
        }
        item.mode = EditMode::Viewing;
        Ok(())
    }

    pub async fn save(&self, id: SpyCatId) -> Result<SpyCat, ItemError> {
        let salary = {
            let mut items = self.items.lock().await;
            let item = items.entry(id).or_insert_with(ItemSnapshot::viewing);
            if item.busy {
                return Err(ItemError::Busy(id));
            }
            let EditMode::Editing { draft } = &item.mode else {
                return Err(ItemError::NotEditing(id));
            };
            let parsed = parse_salary_draft(draft);
            if parsed.is_some() {
                item.busy = true;
            }
            parsed
        };
        let Some(salary) = salary else {
            debug!(id = %id, "rejected salary draft locally");
            self.events.notify(Notice::error(INVALID_SALARY_NOTICE));
            return Err(ItemError::InvalidSalary);
        };

        let result = self.api.update_salary(id, SpyCatUpdate { salary }).await;

        {
            let mut items = self.items.lock().await;
            if let Some(item) = items.get_mut(&id) {
                item.busy = false;
                if result.is_ok() {
                    item.mode = EditMode::Viewing;
                }
            }
        }

        match result {
            Ok(updated) => {
                info!(id = %id, salary = updated.salary, "salary updated");
                self.events.notify(Notice::success(SALARY_UPDATED_NOTICE));
                self.refresh.request().await;
                Ok(updated)
            }
            Err(err) => {
                warn!(id = %id, error = %err, "salary update failed");
                self.events.notify(Notice::error(err.message.clone()));
                Err(err.into())
            }
        }
    }

    pub async fn delete(
        &self,
        id: SpyCatId,
        confirm: &dyn ConfirmDelete,
    ) -> Result<DeleteOutcome, ItemError> {
        {
            let items = self.items.lock().await;
            if let Some(item) = items.get(&id) {
                if item.busy {
                    return Err(ItemError::Busy(id));
                }
                if item.mode != EditMode::Viewing {
                    return Err(ItemError::Editing(id));
                }
            }
        }

        if !confirm.confirm(id, DELETE_PROMPT) {
            debug!(id = %id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        {
            let mut items = self.items.lock().await;
            let item = items.entry(id).or_insert_with(ItemSnapshot::viewing);
            if item.busy {
                return Err(ItemError::Busy(id));
            }
            // The card may have entered editing while the prompt was open.
            if item.mode != EditMode::Viewing {
                debug!(id = %id, "delete dropped; card entered editing during confirmation");
                return Err(ItemError::Editing(id));
            }
            item.busy = true;
        }

        let result = self.api.delete(id).await;

        if let Some(item) = self.items.lock().await.get_mut(&id) {
            item.busy = false;
        }

        match result {
            Ok(()) => {
                info!(id = %id, "spy cat deleted");
                self.events.notify(Notice::success(DELETED_NOTICE));
                self.refresh.request().await;
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                warn!(id = %id, error = %err, "spy cat delete failed");
                self.events.notify(Notice::error(err.message.clone()));
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/item_edit_tests.rs"]
mod tests;
