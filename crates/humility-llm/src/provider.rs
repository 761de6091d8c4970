use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use humility_core::errors::GatewayError;
use humility_core::messages::Message;
use humility_core::provider::{CompletionClient, CompletionOptions};
use humility_core::security::ApiKey;

use crate::converter;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for an OpenAI-compatible Chat Completions endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: ApiKey,
    /// API root without a trailing `/chat/completions`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Single-shot (non-streaming) Chat Completions client.
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn classify_send_error(&self, err: &reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.config.request_timeout)
        } else {
            GatewayError::NetworkError(err.to_string())
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(
        skip(self, messages, options),
        fields(model = %options.model, temperature = options.temperature, messages = messages.len())
    )]
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        let body = converter::build_request_body(messages, options);

        let resp = self
            .client
            .post(self.config.endpoint())
            .header(AUTHORIZATION, self.config.api_key.bearer())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_send_error(&e))?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = retry_after(&resp);
            let text = resp.text().await.unwrap_or_default();
            let error = match GatewayError::from_status(status.as_u16(), text) {
                GatewayError::RateLimited { .. } => GatewayError::RateLimited { retry_after },
                other => other,
            };
            warn!(status = status.as_u16(), error_kind = error.error_kind(), "completion request failed");
            return Err(error);
        }

        let text = resp.text().await.map_err(|e| self.classify_send_error(&e))?;
        let reply = converter::extract_reply(&text)?;
        debug!(chars = reply.len(), "completion received");
        Ok(reply)
    }
}

/// `Retry-After` in whole seconds, when present. Reported only; never acted on.
fn retry_after(resp: &reqwest::Response) -> Option<Duration> {
    resp.headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        let config = OpenAiConfig::new(ApiKey::new("sk-test")).with_base_url(server.uri());
        OpenAiProvider::new(config).unwrap()
    }

    fn transcript() -> Vec<Message> {
        vec![Message::system("persona"), Message::user("Hello")]
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let config = OpenAiConfig::new(ApiKey::new("k")).with_base_url("http://localhost:9/v1/");
        assert_eq!(config.endpoint(), "http://localhost:9/v1/chat/completions");
    }

    #[tokio::test]
    async fn sends_transcript_and_returns_reply() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "temperature": 0.9,
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "Hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Hi there!"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let reply = provider
            .complete(&transcript(), &CompletionOptions::new("gpt-3.5-turbo", 0.9))
            .await
            .unwrap();
        assert_eq!(reply, "Hi there!");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Incorrect API key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(&transcript(), &CompletionOptions::new("m", 0.9))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AuthenticationFailed(ref body) if body == "Incorrect API key"));
    }

    #[tokio::test]
    async fn rate_limit_reports_retry_after_without_retrying() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(&transcript(), &CompletionOptions::new("m", 0.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(7)
        ));
    }

    #[tokio::test]
    async fn server_error_keeps_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(&transcript(), &CompletionOptions::new("m", 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ServerError { status: 500, .. }));
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(&transcript(), &CompletionOptions::new("m", 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let config = OpenAiConfig::new(ApiKey::new("k")).with_base_url("http://127.0.0.1:1");
        let provider = OpenAiProvider::new(config).unwrap();
        let err = provider
            .complete(&transcript(), &CompletionOptions::new("m", 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NetworkError(_)));
    }
}
