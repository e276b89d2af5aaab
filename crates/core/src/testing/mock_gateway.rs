//! Mock channel gateway for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::gateway::{
    ChannelGateway, ChannelInfo, ChannelKind, ChannelMessage, CreateChannelRequest, GatewayError,
    OutgoingMessage, PermissionOverwrite,
};

/// A recorded gateway call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    GetChannel { channel_id: String },
    FindTextChannel { name: String },
    CreateChannel { name: String },
    Rename { channel_id: String, name: String },
    SetParent { channel_id: String, parent_id: String },
    EditPermission { channel_id: String, overwrite: PermissionOverwrite },
    DeletePermission { channel_id: String, target_id: String },
    FetchMessages { channel_id: String },
    SendMessage { channel_id: String },
    ClearComponents { channel_id: String, message_id: String },
}

/// Mock implementation of the ChannelGateway trait.
///
/// Keeps an in-memory guild:
/// - Channels with their overwrites and history
/// - Messages sent by the bot, per channel
/// - Every call, in order
/// - One-shot failures per operation and a switch to fail every send
/// - Optional latency per operation
///
/// # Example
///
/// ```rust,ignore
/// let gateway = MockGateway::with_channels(vec![category("300", "Tickets")]);
/// gateway.fail_once("set_parent", GatewayError::Timeout).await;
///
/// // ...close a ticket...
///
/// let calls = gateway.calls().await;
/// ```
#[derive(Debug, Default)]
pub struct MockGateway {
    channels: Arc<RwLock<HashMap<String, ChannelInfo>>>,
    overwrites: Arc<RwLock<HashMap<String, Vec<PermissionOverwrite>>>>,
    /// Oldest first.
    history: Arc<RwLock<HashMap<String, Vec<ChannelMessage>>>>,
    sent: Arc<RwLock<Vec<(String, OutgoingMessage)>>>,
    created: Arc<RwLock<Vec<CreateChannelRequest>>>,
    calls: Arc<RwLock<Vec<GatewayCall>>>,
    /// Errors returned once by the named operation.
    fail_once: Arc<RwLock<HashMap<String, GatewayError>>>,
    fail_sends: Arc<RwLock<bool>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    next_id: Arc<RwLock<u64>>,
}

impl MockGateway {
    /// Create an empty mock guild.
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(RwLock::new(10_000)),
            ..Default::default()
        }
    }

    /// Create a mock guild that already has `channels`.
    pub fn with_channels(channels: Vec<ChannelInfo>) -> Self {
        let gateway = Self::new();
        let map = channels.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            channels: Arc::new(RwLock::new(map)),
            ..gateway
        }
    }

    pub async fn add_channel(&self, channel: ChannelInfo) {
        self.channels
            .write()
            .await
            .insert(channel.id.clone(), channel);
    }

    /// Simulate a channel deleted out of band.
    pub async fn remove_channel(&self, channel_id: &str) {
        self.channels.write().await.remove(channel_id);
        self.history.write().await.remove(channel_id);
    }

    pub async fn channel(&self, channel_id: &str) -> Option<ChannelInfo> {
        self.channels.read().await.get(channel_id).cloned()
    }

    /// Append a message to a channel's history as if a user posted it.
    pub async fn push_history(&self, channel_id: &str, message: ChannelMessage) {
        self.history
            .write()
            .await
            .entry(channel_id.to_string())
            .or_default()
            .push(message);
    }

    /// Current overwrites of a channel.
    pub async fn overwrites(&self, channel_id: &str) -> Vec<PermissionOverwrite> {
        self.overwrites
            .read()
            .await
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Messages the bot posted in a channel, oldest first.
    pub async fn sent_messages(&self, channel_id: &str) -> Vec<OutgoingMessage> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|(id, _)| id == channel_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub async fn created_channels(&self) -> Vec<CreateChannelRequest> {
        self.created.read().await.clone()
    }

    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.calls.read().await.clone()
    }

    /// Make the next call to `operation` fail with `error`.
    pub async fn fail_once(&self, operation: &str, error: GatewayError) {
        self.fail_once
            .write()
            .await
            .insert(operation.to_string(), error);
    }

    /// Make every send fail until switched off.
    pub async fn fail_sends(&self, fail: bool) {
        *self.fail_sends.write().await = fail;
    }

    /// Make every call to `operation` take at least `latency`.
    pub async fn delay(&self, operation: &str, latency: Duration) {
        self.delays
            .write()
            .await
            .insert(operation.to_string(), latency);
    }

    async fn record(&self, call: GatewayCall, operation: &str) -> Result<(), GatewayError> {
        self.calls.write().await.push(call);
        let latency = self.delays.read().await.get(operation).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.fail_once.write().await.remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn next_id(&self) -> String {
        let mut next = self.next_id.write().await;
        *next += 1;
        next.to_string()
    }

    async fn require(&self, channel_id: &str) -> Result<(), GatewayError> {
        if self.channels.read().await.contains_key(channel_id) {
            Ok(())
        } else {
            Err(GatewayError::NotFound(format!("channel {}", channel_id)))
        }
    }
}

#[async_trait]
impl ChannelGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_channel(&self, channel_id: &str) -> Result<Option<ChannelInfo>, GatewayError> {
        self.record(
            GatewayCall::GetChannel {
                channel_id: channel_id.to_string(),
            },
            "get_channel",
        )
        .await?;
        Ok(self.channel(channel_id).await)
    }

    async fn find_text_channel_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ChannelInfo>, GatewayError> {
        self.record(
            GatewayCall::FindTextChannel {
                name: name.to_string(),
            },
            "find_text_channel_by_name",
        )
        .await?;
        Ok(self
            .channels
            .read()
            .await
            .values()
            .find(|c| c.kind == ChannelKind::Text && c.name == name)
            .cloned())
    }

    async fn create_text_channel(
        &self,
        request: CreateChannelRequest,
    ) -> Result<ChannelInfo, GatewayError> {
        self.record(
            GatewayCall::CreateChannel {
                name: request.name.clone(),
            },
            "create_text_channel",
        )
        .await?;

        let channel = ChannelInfo {
            id: self.next_id().await,
            name: request.name.clone(),
            kind: ChannelKind::Text,
            parent_id: request.parent_id.clone(),
        };
        self.overwrites
            .write()
            .await
            .insert(channel.id.clone(), request.overwrites.clone());
        self.created.write().await.push(request);
        self.add_channel(channel.clone()).await;
        Ok(channel)
    }

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), GatewayError> {
        self.record(
            GatewayCall::Rename {
                channel_id: channel_id.to_string(),
                name: name.to_string(),
            },
            "rename_channel",
        )
        .await?;
        self.require(channel_id).await?;
        if let Some(channel) = self.channels.write().await.get_mut(channel_id) {
            channel.name = name.to_string();
        }
        Ok(())
    }

    async fn set_parent(&self, channel_id: &str, parent_id: &str) -> Result<(), GatewayError> {
        self.record(
            GatewayCall::SetParent {
                channel_id: channel_id.to_string(),
                parent_id: parent_id.to_string(),
            },
            "set_parent",
        )
        .await?;
        self.require(channel_id).await?;
        if let Some(channel) = self.channels.write().await.get_mut(channel_id) {
            channel.parent_id = Some(parent_id.to_string());
        }
        Ok(())
    }

    async fn edit_permission(
        &self,
        channel_id: &str,
        overwrite: PermissionOverwrite,
    ) -> Result<(), GatewayError> {
        self.record(
            GatewayCall::EditPermission {
                channel_id: channel_id.to_string(),
                overwrite: overwrite.clone(),
            },
            "edit_permission",
        )
        .await?;
        self.require(channel_id).await?;
        let mut overwrites = self.overwrites.write().await;
        let list = overwrites.entry(channel_id.to_string()).or_default();
        list.retain(|o| o.target_id != overwrite.target_id);
        list.push(overwrite);
        Ok(())
    }

    async fn delete_permission(
        &self,
        channel_id: &str,
        target_id: &str,
    ) -> Result<(), GatewayError> {
        self.record(
            GatewayCall::DeletePermission {
                channel_id: channel_id.to_string(),
                target_id: target_id.to_string(),
            },
            "delete_permission",
        )
        .await?;
        self.require(channel_id).await?;
        if let Some(list) = self.overwrites.write().await.get_mut(channel_id) {
            list.retain(|o| o.target_id != target_id);
        }
        Ok(())
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        before: Option<&str>,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, GatewayError> {
        self.record(
            GatewayCall::FetchMessages {
                channel_id: channel_id.to_string(),
            },
            "fetch_messages",
        )
        .await?;
        self.require(channel_id).await?;

        let history = self.history.read().await;
        let all = history.get(channel_id).map(Vec::as_slice).unwrap_or(&[]);
        let end = match before {
            Some(id) => all.iter().position(|m| m.id == id).unwrap_or(0),
            None => all.len(),
        };
        Ok(all[..end]
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: OutgoingMessage,
    ) -> Result<String, GatewayError> {
        self.record(
            GatewayCall::SendMessage {
                channel_id: channel_id.to_string(),
            },
            "send_message",
        )
        .await?;
        if *self.fail_sends.read().await {
            return Err(GatewayError::Api {
                status: 403,
                message: "Missing Permissions".to_string(),
            });
        }
        self.require(channel_id).await?;

        self.sent
            .write()
            .await
            .push((channel_id.to_string(), message));
        Ok(self.next_id().await)
    }

    async fn clear_components(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), GatewayError> {
        self.record(
            GatewayCall::ClearComponents {
                channel_id: channel_id.to_string(),
                message_id: message_id.to_string(),
            },
            "clear_components",
        )
        .await?;
        self.require(channel_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn text(id: &str, name: &str) -> ChannelInfo {
        ChannelInfo {
            id: id.to_string(),
            name: name.to_string(),
            kind: ChannelKind::Text,
            parent_id: None,
        }
    }

    fn message(id: &str) -> ChannelMessage {
        ChannelMessage {
            id: id.to_string(),
            author_id: "1".to_string(),
            author_tag: "user".to_string(),
            content: id.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_fetch_messages_pages_newest_first() {
        let gateway = MockGateway::with_channels(vec![text("c", "general")]);
        for id in ["a", "b", "c", "d", "e"] {
            gateway.push_history("c", message(id)).await;
        }

        let first = gateway.fetch_messages("c", None, 2).await.unwrap();
        let ids: Vec<&str> = first.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["e", "d"]);

        let second = gateway.fetch_messages("c", Some("d"), 2).await.unwrap();
        let ids: Vec<&str> = second.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_fail_once_applies_to_one_call() {
        let gateway = MockGateway::with_channels(vec![text("c", "general")]);
        gateway.fail_once("get_channel", GatewayError::Timeout).await;

        assert!(gateway.get_channel("c").await.is_err());
        assert!(gateway.get_channel("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delay_slows_only_the_named_operation() {
        let gateway = MockGateway::with_channels(vec![text("c", "general")]);
        gateway
            .delay("get_channel", Duration::from_millis(40))
            .await;

        let started = std::time::Instant::now();
        gateway.fetch_messages("c", None, 10).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(40));

        gateway.get_channel("c").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_edit_permission_replaces_by_target() {
        use crate::gateway::Permissions;

        let gateway = MockGateway::with_channels(vec![text("c", "general")]);
        gateway
            .edit_permission(
                "c",
                PermissionOverwrite::role("r", Permissions::VIEW_CHANNEL, Permissions::NONE),
            )
            .await
            .unwrap();
        gateway
            .edit_permission(
                "c",
                PermissionOverwrite::role("r", Permissions::NONE, Permissions::VIEW_CHANNEL),
            )
            .await
            .unwrap();

        let overwrites = gateway.overwrites("c").await;
        assert_eq!(overwrites.len(), 1);
        assert_eq!(overwrites[0].deny, Permissions::VIEW_CHANNEL);
    }
}
