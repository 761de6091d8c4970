use serde::Deserialize;
use serde_json::{json, Value};

use humility_core::errors::GatewayError;
use humility_core::messages::Message;
use humility_core::provider::CompletionOptions;

/// Build a Chat Completions request body. Streaming is never requested.
pub fn build_request_body(messages: &[Message], options: &CompletionOptions) -> Value {
    let mut body = json!({
        "model": options.model,
        "messages": messages,
        "temperature": options.temperature,
    });

    if let Some(max) = options.max_tokens {
        body["max_tokens"] = json!(max);
    }

    body
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the first choice's text out of a Chat Completions response body.
pub fn extract_reply(body: &str) -> Result<String, GatewayError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("malformed body: {e}")))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::InvalidResponse("response has no choices".into()))?;

    choice
        .message
        .content
        .ok_or_else(|| GatewayError::InvalidResponse("first choice has no content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_messages_in_order() {
        let messages = vec![Message::system("persona"), Message::user("Hello")];
        let body = build_request_body(&messages, &CompletionOptions::new("gpt-3.5-turbo", 0.9));

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["temperature"], 0.9);
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "persona"}));
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "Hello"}));
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn body_includes_max_tokens_when_set() {
        let mut opts = CompletionOptions::new("m", 0.0);
        opts.max_tokens = Some(512);
        let body = build_request_body(&[], &opts);
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["temperature"], 0.0);
    }

    #[test]
    fn extracts_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hi there!"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        }"#;
        assert_eq!(extract_reply(body).unwrap(), "Hi there!");
    }

    #[test]
    fn empty_choices_is_invalid_response() {
        let err = extract_reply(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[test]
    fn null_content_is_invalid_response() {
        let err =
            extract_reply(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#)
                .unwrap_err();
        assert!(err.to_string().contains("no content"));
    }

    #[test]
    fn non_json_is_invalid_response() {
        let err = extract_reply("<html>gateway</html>").unwrap_err();
        assert_eq!(err.error_kind(), "invalid_response");
    }
}
