//! Shared application state for API handlers

use std::sync::Arc;

use crate::supervisor::Supervisor;

use super::EventBus;

/// State handed to every HTTP and WebSocket handler
pub struct AppState {
    pub supervisor: Arc<Supervisor>,
}

impl AppState {
    pub fn new(supervisor: Arc<Supervisor>) -> Self {
        Self { supervisor }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        self.supervisor.bus()
    }
}
