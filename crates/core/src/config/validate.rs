use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Whether `value` looks like a Discord snowflake: 17-20 digits, not all zeros.
pub fn is_valid_snowflake(value: &str) -> bool {
    (17..=20).contains(&value.len())
        && value.bytes().all(|b| b.is_ascii_digit())
        && value.bytes().any(|b| b != b'0')
}

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Guild id is a snowflake
/// - Lock retry settings are usable
/// - Panel ids are unique
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if !is_valid_snowflake(&config.discord.guild_id) {
        return Err(ConfigError::ValidationError(format!(
            "discord.guild_id is not a valid id: {:?}",
            config.discord.guild_id
        )));
    }

    if config.lock.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "lock.max_attempts cannot be 0".to_string(),
        ));
    }

    if config.lock.backoff_min_ms > config.lock.backoff_max_ms {
        return Err(ConfigError::ValidationError(format!(
            "lock.backoff_min_ms ({}) is greater than lock.backoff_max_ms ({})",
            config.lock.backoff_min_ms, config.lock.backoff_max_ms
        )));
    }

    let mut seen = HashSet::new();
    for panel in &config.panels {
        if !seen.insert(panel.id.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate panel id: {}",
                panel.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[discord]
guild_id = "123456789012345678"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_bad_guild_id_fails() {
        let mut config = valid_config();
        config.discord.guild_id = "not-a-guild".to_string();
        assert!(validate_config(&config).is_err());

        config.discord.guild_id = "00000000000000000".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_inverted_backoff_fails() {
        let mut config = valid_config();
        config.lock.backoff_min_ms = 500;
        config.lock.backoff_max_ms = 100;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_attempts_fails() {
        let mut config = valid_config();
        config.lock.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_panel_ids_fails() {
        let config = load_config_from_str(
            r#"
[discord]
guild_id = "123456789012345678"

[[panels]]
id = "main"

[[panels]]
id = "main"
"#,
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate panel id"));
    }

    #[test]
    fn test_is_valid_snowflake() {
        assert!(is_valid_snowflake("123456789012345678"));
        assert!(is_valid_snowflake("12345678901234567"));
        assert!(!is_valid_snowflake("1234"));
        assert!(!is_valid_snowflake("123456789012345678901"));
        assert!(!is_valid_snowflake("12345678901234567a"));
        assert!(!is_valid_snowflake("000000000000000000"));
    }
}
