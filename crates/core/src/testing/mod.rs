//! Testing utilities and mock implementations.
//!
//! This module provides in-memory stand-ins for the chat platform, the
//! index document and the event log, so the lifecycle can be exercised
//! without Discord or a real data directory layout.
//!
//! # Example
//!
//! ```rust,ignore
//! use ticketdesk_core::testing::fixtures::manager_fixture;
//!
//! let dir = tempfile::TempDir::new()?;
//! let fixture = manager_fixture(dir.path());
//!
//! let created = fixture.manager.create_ticket(&alice, None).await?;
//! let calls = fixture.gateway.calls().await;
//! ```

mod mock_event_sink;
mod mock_gateway;
mod mock_index_store;

pub use mock_event_sink::MemoryEventSink;
pub use mock_gateway::{GatewayCall, MockGateway};
pub use mock_index_store::MemoryIndexStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use super::{MemoryEventSink, MemoryIndexStore, MockGateway};
    use crate::access::AccessPolicy;
    use crate::audit::{create_event_log, EventHandle, EventSink};
    use crate::gateway::{ChannelGateway, ChannelInfo, ChannelKind};
    use crate::index::{create_index_queue, IndexStore};
    use crate::lifecycle::{LifecycleSettings, TicketManager};
    use crate::lock::{CreationLock, LockSettings};
    use crate::transcript::TranscriptStore;

    pub const GUILD_ID: &str = "100";
    pub const TICKET_CATEGORY: &str = "300";
    /// Text channel inside the ticket category.
    pub const LOBBY_CHANNEL: &str = "301";
    pub const ARCHIVE_CATEGORY: &str = "400";
    /// Text channel inside the archive category.
    pub const ARCHIVE_LOG_CHANNEL: &str = "401";
    pub const STAFF_ROLE: &str = "500";

    /// A category channel.
    pub fn category(id: &str, name: &str) -> ChannelInfo {
        ChannelInfo {
            id: id.to_string(),
            name: name.to_string(),
            kind: ChannelKind::Category,
            parent_id: None,
        }
    }

    /// A text channel under `parent_id`.
    pub fn text_channel(id: &str, name: &str, parent_id: Option<&str>) -> ChannelInfo {
        ChannelInfo {
            id: id.to_string(),
            name: name.to_string(),
            kind: ChannelKind::Text,
            parent_id: parent_id.map(str::to_string),
        }
    }

    /// Guild with a ticket category, an archive category and a text channel in each.
    pub fn guild() -> MockGateway {
        MockGateway::with_channels(vec![
            category(TICKET_CATEGORY, "Tickets"),
            text_channel(LOBBY_CHANNEL, "open-a-ticket", Some(TICKET_CATEGORY)),
            category(ARCHIVE_CATEGORY, "Archive"),
            text_channel(ARCHIVE_LOG_CHANNEL, "ticket-log", Some(ARCHIVE_CATEGORY)),
        ])
    }

    /// Lifecycle settings pointing at [`guild`]'s channels.
    pub fn settings() -> LifecycleSettings {
        LifecycleSettings {
            guild_id: GUILD_ID.to_string(),
            ticket_category_id: Some(TICKET_CATEGORY.to_string()),
            archive_target_id: Some(ARCHIVE_CATEGORY.to_string()),
            rate_limit: Duration::from_secs(5 * 60),
            welcome_message: "Thanks for reaching out. Staff will be with you shortly.".to_string(),
            closed_message: "This ticket has been closed.".to_string(),
            close_button_label: "Close ticket".to_string(),
            embed_color: 0x5865f2,
            footer_text: "ticketdesk".to_string(),
            instance_id: "test".to_string(),
        }
    }

    /// Fast-retrying lock settings.
    pub fn lock_settings() -> LockSettings {
        LockSettings {
            stale_after: Duration::from_secs(10),
            max_attempts: 20,
            backoff_min: Duration::from_millis(1),
            backoff_max: Duration::from_millis(5),
        }
    }

    /// Event handle plus the sink its writer appends to.
    pub struct TestEvents {
        pub handle: EventHandle,
        pub sink: Arc<MemoryEventSink>,
    }

    impl TestEvents {
        /// Spawn an event writer over a fresh in-memory sink.
        pub fn spawn() -> Self {
            let sink = Arc::new(MemoryEventSink::new());
            let (handle, writer) =
                create_event_log(Arc::clone(&sink) as Arc<dyn EventSink>, 256);
            tokio::spawn(writer.run());
            Self { handle, sink }
        }

        /// Wait until the writer has taken every queued event.
        pub async fn flushed(&self) {
            for _ in 0..200 {
                if self.handle.pending() == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            tokio::task::yield_now().await;
        }
    }

    pub struct ManagerFixture {
        pub manager: Arc<TicketManager>,
        pub gateway: Arc<MockGateway>,
        pub store: Arc<MemoryIndexStore>,
        pub events: TestEvents,
    }

    /// A manager over [`guild`] with an in-memory index, writing
    /// transcripts and the lock under `data_dir`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn manager_fixture(data_dir: &Path) -> ManagerFixture {
        manager_fixture_with(data_dir, settings())
    }

    pub fn manager_fixture_with(data_dir: &Path, settings: LifecycleSettings) -> ManagerFixture {
        let gateway = Arc::new(guild());
        let store = Arc::new(MemoryIndexStore::new());
        let (index, writer) = create_index_queue(Arc::clone(&store) as Arc<dyn IndexStore>, 64);
        tokio::spawn(writer.run());
        let events = TestEvents::spawn();

        let manager = TicketManager::new(
            settings,
            index,
            Arc::clone(&gateway) as Arc<dyn ChannelGateway>,
            TranscriptStore::new(data_dir),
            CreationLock::in_data_dir(data_dir, lock_settings()),
            Arc::new(AccessPolicy::new(vec![STAFF_ROLE.to_string()])),
            Some(events.handle.clone()),
        );

        ManagerFixture {
            manager: Arc::new(manager),
            gateway,
            store,
            events,
        }
    }
}
