pub mod access;
pub mod audit;
pub mod config;
pub mod gateway;
pub mod index;
pub mod lifecycle;
pub mod lock;
pub mod metrics;
pub mod panel;
pub mod rate_limiter;
pub mod testing;
pub mod transcript;

pub use access::{AccessPolicy, MemberCapabilities};
pub use audit::{create_event_log, EventHandle, EventWriter, FileEventLog, TicketEvent};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use gateway::{ChannelGateway, DiscordGateway, GatewayError};
pub use index::{create_index_queue, IndexHandle, IndexWriter, JsonIndexStore, TicketRecord};
pub use lifecycle::{
    CloseRequest, CloseTrigger, InactivitySweeper, LifecycleSettings, SweeperSettings, TicketError,
    TicketManager, UserRef,
};
pub use lock::CreationLock;
pub use panel::{PanelRegistry, PanelStore};
pub use rate_limiter::RateLimiter;
pub use transcript::TranscriptStore;
