//! Trait definitions for the channel gateway.

use async_trait::async_trait;

use super::error::GatewayError;
use super::types::{
    ChannelInfo, ChannelMessage, CreateChannelRequest, OutgoingMessage, PermissionOverwrite,
};

/// Raw channel and message operations on the chat platform.
///
/// Implementations are thin IO wrappers; every call is a suspension point.
#[async_trait]
pub trait ChannelGateway: Send + Sync {
    /// Returns the name of this gateway implementation.
    fn name(&self) -> &str;

    /// Fetch a channel. `Ok(None)` when it does not exist.
    async fn get_channel(&self, channel_id: &str) -> Result<Option<ChannelInfo>, GatewayError>;

    /// Find a text channel in the guild by exact name.
    async fn find_text_channel_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ChannelInfo>, GatewayError>;

    /// Create a text channel with the given overwrites. Returns the new channel.
    async fn create_text_channel(
        &self,
        request: CreateChannelRequest,
    ) -> Result<ChannelInfo, GatewayError>;

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), GatewayError>;

    async fn set_parent(&self, channel_id: &str, parent_id: &str) -> Result<(), GatewayError>;

    /// Create or replace a permission overwrite.
    async fn edit_permission(
        &self,
        channel_id: &str,
        overwrite: PermissionOverwrite,
    ) -> Result<(), GatewayError>;

    /// Delete a permission overwrite. Deleting a missing overwrite is not an error.
    async fn delete_permission(&self, channel_id: &str, target_id: &str)
        -> Result<(), GatewayError>;

    /// Fetch one page of history, newest first, strictly older than `before`.
    async fn fetch_messages(
        &self,
        channel_id: &str,
        before: Option<&str>,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, GatewayError>;

    /// Post a message. Returns the new message id.
    async fn send_message(
        &self,
        channel_id: &str,
        message: OutgoingMessage,
    ) -> Result<String, GatewayError>;

    /// Remove interactive components (buttons, menus) from a message.
    async fn clear_components(&self, channel_id: &str, message_id: &str)
        -> Result<(), GatewayError>;
}
