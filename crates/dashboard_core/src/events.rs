//! One-shot notifications published to whatever renders the dashboard.

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    Notice(Notice),
    ListReplaced { count: usize },
}

#[derive(Clone)]
pub struct EventSink {
    events: broadcast::Sender<DashboardEvent>,
}

impl EventSink {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn notify(&self, notice: Notice) {
        let _ = self.events.send(DashboardEvent::Notice(notice));
    }

    pub fn list_replaced(&self, count: usize) {
        let _ = self.events.send(DashboardEvent::ListReplaced { count });
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}
