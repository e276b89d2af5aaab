use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::panel::PanelConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tickets: TicketsConfig,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub panels: Vec<PanelConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Discord connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordConfig {
    /// Bot token used for REST calls.
    #[serde(default)]
    pub token: String,
    /// Guild (server) the bot manages. Also the id of its @everyone role.
    pub guild_id: String,
    /// Discord REST base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// The bot's own user id. Used as the executor of automatic closures.
    #[serde(default)]
    pub bot_user_id: Option<String>,
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Ticket lifecycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TicketsConfig {
    /// Category (or a channel inside it) where new tickets are created.
    #[serde(default)]
    pub ticket_category_id: Option<String>,
    /// Category or text channel for archived tickets. A text channel also
    /// receives a notification with the transcript attached.
    #[serde(default)]
    pub archive_category_id: Option<String>,
    #[serde(default)]
    pub staff_role_ids: Vec<String>,
    /// Cooldown between two ticket openings by the same user.
    #[serde(default = "default_rate_limit_minutes")]
    pub rate_limit_minutes: u64,
    /// Tickets idle for longer than this are closed automatically.
    /// 0 disables the inactivity sweeper.
    #[serde(default = "default_inactivity_timeout_hours")]
    pub inactivity_timeout_hours: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            ticket_category_id: None,
            archive_category_id: None,
            staff_role_ids: Vec::new(),
            rate_limit_minutes: default_rate_limit_minutes(),
            inactivity_timeout_hours: default_inactivity_timeout_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_rate_limit_minutes() -> u64 {
    10
}

fn default_inactivity_timeout_hours() -> u64 {
    72
}

fn default_sweep_interval_secs() -> u64 {
    300 // 5 minutes
}

/// Cross-process creation lock configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LockConfig {
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_min_ms")]
    pub backoff_min_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            stale_after_ms: default_stale_after_ms(),
            max_attempts: default_max_attempts(),
            backoff_min_ms: default_backoff_min_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

fn default_stale_after_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_backoff_min_ms() -> u64 {
    50
}

fn default_backoff_max_ms() -> u64 {
    200
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root for the index, lock file, transcripts, panels and event log.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// User-facing message texts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagesConfig {
    #[serde(default = "default_ticket_welcome")]
    pub ticket_welcome: String,
    #[serde(default = "default_ticket_closed")]
    pub ticket_closed: String,
    #[serde(default = "default_close_button_label")]
    pub close_button_label: String,
    #[serde(default = "default_auto_close_reason")]
    pub auto_close_reason: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            ticket_welcome: default_ticket_welcome(),
            ticket_closed: default_ticket_closed(),
            close_button_label: default_close_button_label(),
            auto_close_reason: default_auto_close_reason(),
        }
    }
}

fn default_ticket_welcome() -> String {
    "Thanks for reaching out. A staff member will be with you shortly.".to_string()
}

fn default_ticket_closed() -> String {
    "This ticket has been closed.".to_string()
}

fn default_close_button_label() -> String {
    "Close Ticket".to_string()
}

fn default_auto_close_reason() -> String {
    "Closed automatically after inactivity".to_string()
}

/// Embed styling shared by bot messages
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThemeConfig {
    #[serde(default = "default_color")]
    pub color: u32,
    #[serde(default)]
    pub footer_text: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
            footer_text: String::new(),
        }
    }
}

fn default_color() -> u32 {
    0x5865F2
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub discord: SanitizedDiscordConfig,
    pub tickets: TicketsConfig,
    pub lock: LockConfig,
    pub storage: StorageConfig,
    pub panel_count: usize,
}

/// Sanitized Discord config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDiscordConfig {
    pub guild_id: String,
    pub api_base_url: String,
    pub token_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            discord: SanitizedDiscordConfig {
                guild_id: config.discord.guild_id.clone(),
                api_base_url: config.discord.api_base_url.clone(),
                token_configured: !config.discord.token.is_empty(),
                timeout_secs: config.discord.timeout_secs,
            },
            tickets: config.tickets.clone(),
            lock: config.lock.clone(),
            storage: config.storage.clone(),
            panel_count: config.panels.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[discord]
guild_id = "123456789012345678"
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.discord.guild_id, "123456789012345678");
        assert_eq!(config.discord.api_base_url, "https://discord.com/api/v10");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.tickets.rate_limit_minutes, 10);
        assert_eq!(config.tickets.sweep_interval_secs, 300);
        assert_eq!(config.lock.stale_after_ms, 10_000);
        assert_eq!(config.lock.max_attempts, 10);
        assert_eq!(config.storage.data_dir.to_str().unwrap(), "data");
        assert!(config.panels.is_empty());
    }

    #[test]
    fn test_deserialize_missing_discord_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_tickets_section() {
        let toml = r#"
[discord]
guild_id = "123456789012345678"

[tickets]
ticket_category_id = "200000000000000001"
archive_category_id = "200000000000000002"
staff_role_ids = ["300000000000000001", "300000000000000002"]
rate_limit_minutes = 5
inactivity_timeout_hours = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.tickets.ticket_category_id.as_deref(),
            Some("200000000000000001")
        );
        assert_eq!(config.tickets.staff_role_ids.len(), 2);
        assert_eq!(config.tickets.rate_limit_minutes, 5);
        assert_eq!(config.tickets.inactivity_timeout_hours, 0);
        // untouched default
        assert_eq!(config.tickets.sweep_interval_secs, 300);
    }

    #[test]
    fn test_deserialize_panels() {
        let toml = r#"
[discord]
guild_id = "123456789012345678"

[[panels]]
id = "main"

[[panels.buttons]]
id = "support"
label = "Support"
welcome_message = "Describe your problem"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.panels.len(), 1);
        assert_eq!(config.panels[0].buttons[0].id, "support");
        assert_eq!(
            config.panels[0].buttons[0].welcome_message.as_deref(),
            Some("Describe your problem")
        );
    }

    #[test]
    fn test_sanitized_config_hides_token() {
        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.discord.token = "secret-token".to_string();

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.discord.token_configured);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-token"));
    }

    #[test]
    fn test_sanitized_config_without_token() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(!sanitized.discord.token_configured);
        assert_eq!(sanitized.panel_count, 0);
    }
}
