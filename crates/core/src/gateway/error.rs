//! Error types for the channel gateway.

use thiserror::Error;

/// Errors returned by a [`ChannelGateway`](super::ChannelGateway).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The channel, message or overwrite does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Could not reach the API.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The API rejected the call.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The API asked us to slow down.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ConnectionFailed(_) | Self::RateLimited { .. }
        ) || matches!(self, Self::Api { status, .. } if *status >= 500)
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Api {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(GatewayError::Timeout.is_retryable());
        assert!(GatewayError::RateLimited { retry_after_ms: 10 }.is_retryable());
        assert!(GatewayError::Api {
            status: 502,
            message: "bad gateway".to_string()
        }
        .is_retryable());
        assert!(!GatewayError::Api {
            status: 403,
            message: "missing access".to_string()
        }
        .is_retryable());
        assert!(!GatewayError::NotFound("channel 1".to_string()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = GatewayError::Api {
            status: 403,
            message: "Missing Permissions".to_string(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 403): Missing Permissions");
    }
}
