use std::sync::Arc;

use shared::{
    domain::{SpyCat, SpyCatId},
    error::{ServiceError, ServiceErrorKind},
};
use tokio::sync::broadcast;

use crate::{
    api::SpyCatApi,
    creation::{CreationError, CreationFlow, CreationSnapshot, FormField},
    events::{DashboardEvent, EventSink},
    item_edit::{ConfirmDelete, DeleteOutcome, ItemEditController, ItemError, ItemSnapshot},
    store::{EntityStore, ListStatus, RefreshOutcome},
};

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub cat: SpyCat,
    pub item: ItemSnapshot,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub status: ListStatus,
    pub cards: Vec<CardView>,
    pub total_salary: f64,
    pub modal: CreationSnapshot,
}

impl DashboardView {
    pub fn count(&self) -> usize {
        self.cards.len()
    }

    pub fn show_retry(&self) -> bool {
        matches!(self.status, ListStatus::Error(_))
    }

    /// Ready with nothing to show; the renderer offers "add your first".
    pub fn is_empty(&self) -> bool {
        self.status == ListStatus::Ready && self.cards.is_empty()
    }

    pub fn card(&self, id: SpyCatId) -> Option<&CardView> {
        self.cards.iter().find(|card| card.cat.id == id)
    }
}

/// Owns the list, the creation modal and every card's edit state.
pub struct Dashboard {
    api: Arc<dyn SpyCatApi>,
    store: Arc<EntityStore>,
    creation: CreationFlow,
    items: ItemEditController,
    events: EventSink,
}

impl Dashboard {
    pub fn new(api: Arc<dyn SpyCatApi>) -> Self {
        let events = EventSink::new();
        let store = EntityStore::new(Arc::clone(&api), events.clone());
        let creation = CreationFlow::new(Arc::clone(&api), store.refresh_handle(), events.clone());
        let items = ItemEditController::new(Arc::clone(&api), store.refresh_handle(), events.clone());
        Self {
            api,
            store,
            creation,
            items,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub async fn mount(&self) -> RefreshOutcome {
        self.store.refresh().await
    }

    pub async fn retry(&self) -> RefreshOutcome {
        self.store.retry().await
    }

    /// Renders the current state. Cards that left the list lose their edit
    /// state; new cards start in viewing.
    pub async fn view(&self) -> DashboardView {
        let list = self.store.snapshot().await;
        self.items.sync(&list.cats).await;

        let mut cards = Vec::with_capacity(list.cats.len());
        for cat in &list.cats {
            cards.push(CardView {
                item: self.items.snapshot(cat.id).await,
                cat: cat.clone(),
            });
        }

        DashboardView {
            total_salary: list.total_salary(),
            status: list.status,
            cards,
            modal: self.creation.snapshot().await,
        }
    }

    pub async fn get_one(&self, id: SpyCatId) -> Result<SpyCat, ServiceError> {
        self.api.get_one(id).await
    }

    pub async fn open_creation(&self) {
        self.creation.open().await;
    }

    pub async fn cancel_creation(&self) -> Result<(), CreationError> {
        self.creation.cancel().await
    }

    pub async fn set_creation_field(
        &self,
        field: FormField,
        value: impl Into<String>,
    ) -> Result<(), CreationError> {
        self.creation.set_field(field, value).await
    }

    pub async fn submit_creation(&self) -> Result<SpyCat, CreationError> {
        self.creation.submit().await
    }

    pub async fn begin_edit(&self, id: SpyCatId) -> Result<(), ItemError> {
        let list = self.store.snapshot().await;
        let cat = list.find(id).ok_or_else(|| missing_card(id))?;
        self.items.begin_edit(cat).await
    }

    pub async fn set_salary_draft(
        &self,
        id: SpyCatId,
        draft: impl Into<String>,
    ) -> Result<(), ItemError> {
        self.items.set_draft(id, draft).await
    }

    pub async fn cancel_edit(&self, id: SpyCatId) -> Result<(), ItemError> {
        self.items.cancel(id).await
    }

    pub async fn save_salary(&self, id: SpyCatId) -> Result<SpyCat, ItemError> {
        self.items.save(id).await
    }

    pub async fn delete(
        &self,
        id: SpyCatId,
        confirm: &dyn ConfirmDelete,
    ) -> Result<DeleteOutcome, ItemError> {
        self.items.delete(id, confirm).await
    }
}

fn missing_card(id: SpyCatId) -> ItemError {
    ItemError::Service(ServiceError::new(
        ServiceErrorKind::NotFound,
        format!("Spy cat {id} is not in the current list"),
    ))
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
