use std::time::Duration;

/// Failures of a completion call: network, auth, quota, or a malformed reply.
///
/// Every variant reaches the caller unmodified. Nothing in this crate retries.
#[derive(Clone, Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("provider overloaded")]
    ProviderOverloaded,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("timeout after {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::ProviderOverloaded => "provider_overloaded",
            Self::NetworkError(_) => "network_error",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Timeout(_) => "timeout",
        }
    }

    /// A one-line explanation suitable for showing to the person chatting.
    pub fn user_hint(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "the API key was rejected",
            Self::RateLimited { .. } => "the service is rate limiting requests, wait a moment",
            Self::ProviderOverloaded | Self::ServerError { .. } => {
                "the service is having trouble right now"
            }
            Self::NetworkError(_) | Self::Timeout(_) => "the service could not be reached",
            Self::InvalidRequest(_) | Self::InvalidResponse(_) => "the request could not be completed",
        }
    }

    /// Classify an HTTP status code into the appropriate error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            400 | 404 | 422 => Self::InvalidRequest(body),
            429 => Self::RateLimited { retry_after: None },
            503 | 529 => Self::ProviderOverloaded,
            500..=599 => Self::ServerError { status, body },
            _ => Self::InvalidRequest(format!("unexpected status {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_mapping() {
        assert!(matches!(
            GatewayError::from_status(401, "unauthorized".into()),
            GatewayError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            GatewayError::from_status(403, "forbidden".into()),
            GatewayError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            GatewayError::from_status(400, "bad request".into()),
            GatewayError::InvalidRequest(_)
        ));
        assert!(matches!(
            GatewayError::from_status(429, "slow down".into()),
            GatewayError::RateLimited { retry_after: None }
        ));
        assert!(matches!(
            GatewayError::from_status(503, "unavailable".into()),
            GatewayError::ProviderOverloaded
        ));
        assert!(matches!(
            GatewayError::from_status(502, "bad gateway".into()),
            GatewayError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn unexpected_status_keeps_code_in_message() {
        let err = GatewayError::from_status(418, "teapot".into());
        assert_eq!(err.to_string(), "invalid request: unexpected status 418: teapot");
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(GatewayError::ProviderOverloaded.error_kind(), "provider_overloaded");
        assert_eq!(
            GatewayError::RateLimited { retry_after: None }.error_kind(),
            "rate_limited"
        );
        assert_eq!(
            GatewayError::Timeout(Duration::from_secs(30)).error_kind(),
            "timeout"
        );
    }

    #[test]
    fn display_includes_detail() {
        let err = GatewayError::ServerError { status: 500, body: "boom".into() };
        assert_eq!(err.to_string(), "server error 500: boom");
        assert_eq!(err.user_hint(), "the service is having trouble right now");
    }
}
