//! Discord REST implementation of the channel gateway.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::DiscordConfig;
use crate::metrics;

use super::{
    ChannelGateway, ChannelInfo, ChannelKind, ChannelMessage, CreateChannelRequest, GatewayError,
    OutgoingMessage, PermissionOverwrite, CLOSE_BUTTON_ID,
};

/// Discord REST client scoped to one guild.
pub struct DiscordGateway {
    client: Client,
    config: DiscordConfig,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    parent_id: Option<String>,
}

impl From<RawChannel> for ChannelInfo {
    fn from(raw: RawChannel) -> Self {
        Self {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            kind: ChannelKind::from_discord(raw.kind),
            parent_id: raw.parent_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
    username: String,
    #[serde(default)]
    discriminator: Option<String>,
}

impl RawUser {
    /// `name#1234` for legacy accounts, plain username otherwise.
    fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if d != "0" && !d.is_empty() => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    #[serde(default)]
    content: String,
    timestamp: DateTime<Utc>,
    author: RawUser,
}

impl From<RawMessage> for ChannelMessage {
    fn from(raw: RawMessage) -> Self {
        Self {
            author_tag: raw.author.tag(),
            author_id: raw.author.id,
            id: raw.id,
            content: raw.content,
            created_at: raw.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRateLimit {
    retry_after: f64,
}

#[derive(Debug, Deserialize)]
struct RawCreated {
    id: String,
}

fn overwrite_payload(overwrite: &PermissionOverwrite) -> Value {
    json!({
        "id": overwrite.target_id,
        "type": overwrite.kind.as_discord(),
        "allow": overwrite.allow.to_string(),
        "deny": overwrite.deny.to_string(),
    })
}

fn message_payload(message: &OutgoingMessage) -> Value {
    let mut payload = json!({});
    if let Some(content) = &message.content {
        payload["content"] = json!(content);
    }
    if let Some(embed) = &message.embed {
        let mut e = json!({
            "title": embed.title,
            "description": embed.description,
            "color": embed.color,
            "timestamp": Utc::now().to_rfc3339(),
        });
        if let Some(footer) = &embed.footer {
            e["footer"] = json!({ "text": footer });
        }
        payload["embeds"] = json!([e]);
    }
    if let Some(label) = &message.close_button {
        // action row (1) holding one danger-styled (4) button (2)
        payload["components"] = json!([{
            "type": 1,
            "components": [{
                "type": 2,
                "style": 4,
                "label": label,
                "custom_id": CLOSE_BUTTON_ID,
            }],
        }]);
    }
    if let Some(attachment) = &message.attachment {
        payload["attachments"] = json!([{ "id": 0, "filename": attachment.filename }]);
    }
    payload
}

impl DiscordGateway {
    /// Create a new Discord gateway.
    pub fn new(config: DiscordConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(concat!("ticketdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.api_base_url.trim_end_matches('/')
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url(), endpoint)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("Bot {}", self.config.token))
    }

    /// Send a request and turn non-success statuses into errors.
    async fn execute(
        &self,
        operation: &str,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<Response, GatewayError> {
        let result = self.send_checked(builder, what).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(GatewayError::NotFound(_)) => "not_found",
            Err(_) => "failure",
        };
        metrics::GATEWAY_REQUESTS
            .with_label_values(&[operation, outcome])
            .inc();
        result
    }

    async fn send_checked(&self, builder: RequestBuilder, what: &str) -> Result<Response, GatewayError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(what.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .json::<RawRateLimit>()
                .await
                .map(|r| (r.retry_after * 1000.0) as u64)
                .unwrap_or(1000);
            warn!("Discord rate limit hit on {}, retry after {}ms", what, retry_after_ms);
            return Err(GatewayError::RateLimited { retry_after_ms });
        }

        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        })
    }

    async fn patch_channel(
        &self,
        operation: &str,
        channel_id: &str,
        body: Value,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("/channels/{}", channel_id));
        self.execute(operation, self.client.patch(&url).json(&body), &format!("channel {}", channel_id))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelGateway for DiscordGateway {
    fn name(&self) -> &str {
        "discord"
    }

    async fn get_channel(&self, channel_id: &str) -> Result<Option<ChannelInfo>, GatewayError> {
        let url = self.url(&format!("/channels/{}", channel_id));
        match self
            .execute("get_channel", self.client.get(&url), &format!("channel {}", channel_id))
            .await
        {
            Ok(response) => {
                let raw: RawChannel = response.json().await?;
                Ok(Some(raw.into()))
            }
            Err(GatewayError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_text_channel_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ChannelInfo>, GatewayError> {
        let url = self.url(&format!("/guilds/{}/channels", self.config.guild_id));
        let channels: Vec<RawChannel> = self
            .execute("find_text_channel_by_name", self.client.get(&url), "guild channels")
            .await?
            .json()
            .await?;

        Ok(channels
            .into_iter()
            .map(ChannelInfo::from)
            .find(|c| c.kind == ChannelKind::Text && c.name == name))
    }

    async fn create_text_channel(
        &self,
        request: CreateChannelRequest,
    ) -> Result<ChannelInfo, GatewayError> {
        let url = self.url(&format!("/guilds/{}/channels", self.config.guild_id));
        let overwrites: Vec<Value> = request.overwrites.iter().map(overwrite_payload).collect();
        let mut body = json!({
            "name": request.name,
            "type": 0,
            "permission_overwrites": overwrites,
        });
        if let Some(parent_id) = &request.parent_id {
            body["parent_id"] = json!(parent_id);
        }

        let raw: RawChannel = self
            .execute("create_text_channel", self.client.post(&url).json(&body), "guild channels")
            .await?
            .json()
            .await?;
        debug!("Created channel {} ({})", raw.id, request.name);
        Ok(raw.into())
    }

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), GatewayError> {
        self.patch_channel("rename_channel", channel_id, json!({ "name": name })).await
    }

    async fn set_parent(&self, channel_id: &str, parent_id: &str) -> Result<(), GatewayError> {
        self.patch_channel("set_parent", channel_id, json!({ "parent_id": parent_id }))
            .await
    }

    async fn edit_permission(
        &self,
        channel_id: &str,
        overwrite: PermissionOverwrite,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!(
            "/channels/{}/permissions/{}",
            channel_id, overwrite.target_id
        ));
        let body = json!({
            "type": overwrite.kind.as_discord(),
            "allow": overwrite.allow.to_string(),
            "deny": overwrite.deny.to_string(),
        });
        self.execute("edit_permission", self.client.put(&url).json(&body), &format!("channel {}", channel_id))
            .await?;
        Ok(())
    }

    async fn delete_permission(
        &self,
        channel_id: &str,
        target_id: &str,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("/channels/{}/permissions/{}", channel_id, target_id));
        match self
            .execute("delete_permission", self.client.delete(&url), &format!("overwrite {}", target_id))
            .await
        {
            Ok(_) | Err(GatewayError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        before: Option<&str>,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, GatewayError> {
        let url = self.url(&format!("/channels/{}/messages", channel_id));
        let mut query = vec![("limit", limit.clamp(1, 100).to_string())];
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }

        let raw: Vec<RawMessage> = self
            .execute(
                "fetch_messages",
                self.client.get(&url).query(&query),
                &format!("channel {}", channel_id),
            )
            .await?
            .json()
            .await?;
        Ok(raw.into_iter().map(ChannelMessage::from).collect())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: OutgoingMessage,
    ) -> Result<String, GatewayError> {
        let url = self.url(&format!("/channels/{}/messages", channel_id));
        let payload = message_payload(&message);

        let builder = match message.attachment {
            Some(attachment) => {
                let part = multipart::Part::bytes(attachment.data)
                    .file_name(attachment.filename)
                    .mime_str(&attachment.content_type)
                    .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
                let form = multipart::Form::new()
                    .text("payload_json", payload.to_string())
                    .part("files[0]", part);
                self.client.post(&url).multipart(form)
            }
            None => self.client.post(&url).json(&payload),
        };

        let created: RawCreated = self
            .execute("send_message", builder, &format!("channel {}", channel_id))
            .await?
            .json()
            .await?;
        Ok(created.id)
    }

    async fn clear_components(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("/channels/{}/messages/{}", channel_id, message_id));
        self.execute(
            "clear_components",
            self.client.patch(&url).json(&json!({ "components": [] })),
            &format!("message {}", message_id),
        )
        .await?;
        Ok(())
    }
}
