use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use async_trait::async_trait;
use shared::{
    domain::{SpyCat, SpyCatCreate, SpyCatId, SpyCatUpdate},
    error::{ServiceError, ServiceErrorKind},
};
use tokio::sync::{oneshot, Mutex};

use crate::{api::SpyCatApi, events::DashboardEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Default)]
struct FakeState {
    cats: Vec<SpyCat>,
    next_id: i64,
    calls: HashMap<Op, usize>,
    failures: HashMap<Op, ServiceError>,
    gates: HashMap<Op, VecDeque<oneshot::Receiver<()>>>,
    sent_updates: Vec<(SpyCatId, SpyCatUpdate)>,
}

/// In-memory roster standing in for the remote service.
#[derive(Clone, Default)]
pub struct FakeSpyCatApi {
    state: Arc<Mutex<FakeState>>,
}

pub fn cat(id: i64, name: &str, salary: f64) -> SpyCat {
    SpyCat {
        id: SpyCatId(id),
        name: name.to_string(),
        breed: "Siamese".to_string(),
        years_of_experience: 3,
        salary,
    }
}

pub fn server_error(message: &str) -> ServiceError {
    ServiceError {
        kind: ServiceErrorKind::Server,
        status: Some(500),
        message: message.to_string(),
    }
}

impl FakeSpyCatApi {
    pub fn with_cats(cats: Vec<SpyCat>) -> Self {
        let next_id = cats.iter().map(|c| c.id.0).max().unwrap_or(0) + 1;
        let fake = Self::default();
        {
            let mut state = fake.state.try_lock().expect("fresh state");
            state.cats = cats;
            state.next_id = next_id;
        }
        fake
    }

    pub async fn calls(&self, op: Op) -> usize {
        self.state.lock().await.calls.get(&op).copied().unwrap_or(0)
    }

    pub async fn fail(&self, op: Op, err: ServiceError) {
        self.state.lock().await.failures.insert(op, err);
    }

    pub async fn recover(&self, op: Op) {
        self.state.lock().await.failures.remove(&op);
    }

    /// Holds the next call of `op` until the returned sender fires.
    pub async fn gate(&self, op: Op) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .await
            .gates
            .entry(op)
            .or_default()
            .push_back(rx);
        tx
    }

    pub async fn set_cats(&self, cats: Vec<SpyCat>) {
        self.state.lock().await.cats = cats;
    }

    pub async fn cats(&self) -> Vec<SpyCat> {
        self.state.lock().await.cats.clone()
    }

    pub async fn sent_updates(&self) -> Vec<(SpyCatId, SpyCatUpdate)> {
        self.state.lock().await.sent_updates.clone()
    }

    async fn enter(&self, op: Op) -> Result<(), ServiceError> {
        let gate = {
            let mut state = self.state.lock().await;
            *state.calls.entry(op).or_default() += 1;
            state.gates.get_mut(&op).and_then(VecDeque::pop_front)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match self.state.lock().await.failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn not_found() -> ServiceError {
    ServiceError {
        kind: ServiceErrorKind::NotFound,
        status: Some(404),
        message: "Spy cat not found".to_string(),
    }
}

#[async_trait]
impl SpyCatApi for FakeSpyCatApi {
    async fn list_all(&self) -> Result<Vec<SpyCat>, ServiceError> {
        let cats = self.cats().await;
        self.enter(Op::List).await?;
        Ok(cats)
    }

    async fn get_one(&self, id: SpyCatId) -> Result<SpyCat, ServiceError> {
        self.enter(Op::Get).await?;
        let state = self.state.lock().await;
        state
            .cats
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn create(&self, draft: &SpyCatCreate) -> Result<SpyCat, ServiceError> {
        self.enter(Op::Create).await?;
        let mut state = self.state.lock().await;
        let id = SpyCatId(state.next_id.max(1));
        state.next_id = id.0 + 1;
        let created = SpyCat {
            id,
            name: draft.name.clone(),
            breed: draft.breed.clone(),
            years_of_experience: draft.years_of_experience,
            salary: draft.salary,
        };
        state.cats.push(created.clone());
        Ok(created)
    }

    async fn update_salary(
        &self,
        id: SpyCatId,
        update: SpyCatUpdate,
    ) -> Result<SpyCat, ServiceError> {
        self.enter(Op::Update).await?;
        let mut state = self.state.lock().await;
        state.sent_updates.push((id, update));
        let cat = state
            .cats
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(not_found)?;
        cat.salary = update.salary;
        Ok(cat.clone())
    }

    async fn delete(&self, id: SpyCatId) -> Result<(), ServiceError> {
        self.enter(Op::Delete).await?;
        let mut state = self.state.lock().await;
        let before = state.cats.len();
        state.cats.retain(|c| c.id != id);
        if state.cats.len() == before {
            return Err(not_found());
        }
        Ok(())
    }
}

pub fn drain_notices(
    rx: &mut tokio::sync::broadcast::Receiver<DashboardEvent>,
) -> Vec<crate::events::Notice> {
    let mut notices = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let DashboardEvent::Notice(notice) = event {
            notices.push(notice);
        }
    }
    notices
}
