use tokio::sync::RwLock;

use super::{PanelConfig, TicketPreset};

/// Lookup over static and dynamic panels.
pub struct PanelRegistry {
    static_panels: Vec<PanelConfig>,
    dynamic_panels: RwLock<Vec<PanelConfig>>,
}

impl PanelRegistry {
    pub fn new(static_panels: Vec<PanelConfig>) -> Self {
        Self {
            static_panels,
            dynamic_panels: RwLock::new(Vec::new()),
        }
    }

    /// Replace the dynamic panel set, typically after a store change.
    pub async fn set_dynamic(&self, panels: Vec<PanelConfig>) {
        *self.dynamic_panels.write().await = panels;
    }

    pub async fn panel(&self, id: &str) -> Option<PanelConfig> {
        let dynamic = self.dynamic_panels.read().await;
        dynamic
            .iter()
            .chain(self.static_panels.iter())
            .find(|p| p.id == id)
            .cloned()
    }

    /// Every visible panel; a dynamic panel hides the static one with its id.
    pub async fn panels(&self) -> Vec<PanelConfig> {
        let dynamic = self.dynamic_panels.read().await;
        let mut all: Vec<PanelConfig> = dynamic.clone();
        all.extend(
            self.static_panels
                .iter()
                .filter(|s| !dynamic.iter().any(|d| d.id == s.id))
                .cloned(),
        );
        all
    }

    pub async fn button_preset(&self, button_id: &str) -> Option<TicketPreset> {
        let dynamic = self.dynamic_panels.read().await;
        dynamic
            .iter()
            .chain(self.static_panels.iter())
            .flat_map(|p| p.buttons.iter())
            .find(|b| b.id == button_id)
            .map(TicketPreset::from)
    }

    pub async fn select_preset(&self, select_id: &str, value: &str) -> Option<TicketPreset> {
        let dynamic = self.dynamic_panels.read().await;
        let select = dynamic
            .iter()
            .chain(self.static_panels.iter())
            .flat_map(|p| p.selects.iter())
            .find(|s| s.id == select_id)?;
        select
            .options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.to_preset(select_id))
    }
}
