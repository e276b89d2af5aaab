//! Channel gateway: the raw channel/message operations the lifecycle
//! manager delegates to the chat platform.

mod discord;
mod error;
mod permissions;
mod traits;
mod types;

pub use discord::DiscordGateway;
pub use error::GatewayError;
pub use permissions::Permissions;
pub use traits::ChannelGateway;
pub use types::{
    Attachment, ChannelInfo, ChannelKind, ChannelMessage, CreateChannelRequest, Embed,
    OutgoingMessage, OverwriteKind, PermissionOverwrite, CLOSE_BUTTON_ID,
};
