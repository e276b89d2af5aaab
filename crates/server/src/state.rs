use std::sync::Arc;

use ticketdesk_core::{
    AccessPolicy, Config, EventHandle, PanelRegistry, PanelStore, SanitizedConfig, TicketEvent,
    TicketManager,
};

/// Shared application state
pub struct AppState {
    config: Config,
    manager: Arc<TicketManager>,
    panels: Arc<PanelRegistry>,
    panel_store: PanelStore,
    events: Option<EventHandle>,
}

impl AppState {
    pub fn new(
        config: Config,
        manager: Arc<TicketManager>,
        panels: Arc<PanelRegistry>,
        panel_store: PanelStore,
        events: Option<EventHandle>,
    ) -> Self {
        Self {
            config,
            manager,
            panels,
            panel_store,
            events,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn manager(&self) -> &TicketManager {
        &self.manager
    }

    pub fn access(&self) -> &AccessPolicy {
        self.manager.access()
    }

    pub fn panels(&self) -> &PanelRegistry {
        &self.panels
    }

    pub fn panel_store(&self) -> &PanelStore {
        &self.panel_store
    }

    /// Emit an event without waiting on the writer.
    pub fn emit(&self, event: TicketEvent) {
        if let Some(ref events) = self.events {
            events.try_emit(event);
        }
    }
}
