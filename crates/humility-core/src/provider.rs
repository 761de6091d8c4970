use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::messages::Message;

/// Sampling parameters for a single completion call.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    /// 0.0 (deterministic) to 1.0 (most varied).
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn new(model: impl Into<String>, temperature: f64) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_tokens: None,
        }
    }
}

/// A remote model that turns an ordered message list into one new reply.
///
/// Implementations must not retry: a failure is returned as-is.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, GatewayError>;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        (**self).complete(messages, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl CompletionClient for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            messages: &[Message],
            options: &CompletionOptions,
        ) -> Result<String, GatewayError> {
            let last = messages.last().map(Message::content).unwrap_or_default();
            Ok(format!("{}@{}: {last}", options.model, options.temperature))
        }
    }

    #[test]
    fn options_constructor_leaves_max_tokens_unset() {
        let opts = CompletionOptions::new("gpt-3.5-turbo", 0.9);
        assert_eq!(opts.model, "gpt-3.5-turbo");
        assert_eq!(opts.temperature, 0.9);
        assert!(opts.max_tokens.is_none());
    }

    #[tokio::test]
    async fn arc_delegates_to_inner_client() {
        let client: Arc<dyn CompletionClient> = Arc::new(Echo);
        let reply = client
            .complete(&[Message::user("ping")], &CompletionOptions::new("m", 0.0))
            .await
            .unwrap();
        assert_eq!(client.name(), "echo");
        assert_eq!(reply, "m@0: ping");
    }
}
