//! Ticket panels: the buttons and select menus users open tickets from.
//!
//! Panels come from two places: static ones in the config file and dynamic
//! ones saved as JSON under `<data_dir>/panels/`. A dynamic panel shadows a
//! static one with the same id.

mod registry;
mod store;
mod types;

pub use registry::PanelRegistry;
pub use store::PanelStore;
pub use types::{ButtonPreset, ButtonStyle, PanelConfig, PanelTheme, SelectOption, SelectPreset, TicketPreset};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("invalid panel id: {0:?}")]
    InvalidId(String),

    #[error("panel IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid panel file: {0}")]
    Json(#[from] serde_json::Error),
}
