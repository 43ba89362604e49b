//! Client-side synchronization layer for the spy cat roster dashboard.
//!
//! [`api`] talks to the remote service, [`store`] holds the list,
//! [`creation`] and [`item_edit`] run the mutation flows and [`dashboard`]
//! ties them into one view-model.

pub mod api;
pub mod config;
pub mod creation;
pub mod dashboard;
pub mod events;
pub mod item_edit;
pub mod store;

pub use api::{HttpSpyCatApi, SpyCatApi};
pub use config::{load_settings, Settings};
pub use dashboard::{CardView, Dashboard, DashboardView};
pub use events::{DashboardEvent, Notice, NoticeLevel};
pub use item_edit::{ConfirmDelete, DeleteOutcome};
pub use store::{ListStatus, RefreshOutcome};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
