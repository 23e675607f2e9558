use std::fmt;

use async_trait::async_trait;
use bp_core::{ApiError, ChatMessage, Error, LanguageModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Config;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// OpenAI-compatible chat completions client that rotates over its key ring
/// when a key is rate limited.
pub struct GroqModel {
    client: Client,
    config: Config,
}

impl GroqModel {
    pub fn new(config: Config) -> Result<Self> {
        if config.keys.is_empty() {
            return Err(Error::Config("at least one model API key is required".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn send(&self, key: &str, request: &ChatRequest<'_>) -> std::result::Result<String, ApiError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| ApiError::Upstream {
            status: status.as_u16(),
            message: format!("malformed completion: {}", e),
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ApiError::Upstream {
                status: status.as_u16(),
                message: "completion has no choices".to_string(),
            })
    }
}

impl fmt::Debug for GroqModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqModel")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl LanguageModel for GroqModel {
    fn name(&self) -> &str {
        "Groq"
    }

    async fn chat(&self, messages: &[ChatMessage], json_reply: bool) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model_name,
            messages,
            temperature: self.config.temperature,
            response_format: json_reply.then_some(ResponseFormat { kind: "json_object" }),
        };

        let key_count = self.config.keys.len();
        for attempt in 0..key_count {
            let Some(index) = self.config.rotation.key_for_attempt(attempt, key_count) else {
                break;
            };
            let Some(key) = self.config.keys.get(index) else {
                break;
            };
            debug!("chat completion attempt {} with key #{}", attempt + 1, index + 1);

            match self.send(key, &request).await {
                Ok(content) => return Ok(content),
                Err(ApiError::RateLimited) => {
                    warn!("⏳ Model key #{} is rate limited, rotating", index + 1);
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(ApiError::RateLimited.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyRing, RotationPolicy};
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    fn model(server: &MockServer, keys: &[&str]) -> GroqModel {
        let config = Config {
            keys: KeyRing::new(keys.iter().map(|k| Some(k.to_string()))),
            base_url: server.uri(),
            ..Config::default()
        };
        GroqModel::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_chat_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer primary"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "response_format": { "type": "json_object" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"ok\":true}")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = model(&server, &["primary", "secondary"])
            .chat(&[ChatMessage::user("hello")], true)
            .await
            .unwrap();
        assert_eq!(reply, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_rate_limit_rotates_to_next_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer primary"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secondary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("from secondary")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = model(&server, &["primary", "secondary"])
            .chat(&[ChatMessage::user("hello")], false)
            .await
            .unwrap();
        assert_eq!(reply, "from secondary");
    }

    #[tokio::test]
    async fn test_all_keys_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":{"code":"rate_limit_exceeded"}}"#),
            )
            .expect(2)
            .mount(&server)
            .await;

        let err = model(&server, &["primary", "secondary"])
            .chat(&[ChatMessage::user("hello")], false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::RateLimited)));
    }

    #[tokio::test]
    async fn test_auth_failure_does_not_rotate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = model(&server, &["primary", "secondary"])
            .chat(&[ChatMessage::user("hello")], false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Auth { status: 401 })));
    }

    #[derive(Debug)]
    struct LastFirst;

    impl RotationPolicy for LastFirst {
        fn key_for_attempt(&self, attempt: usize, key_count: usize) -> Option<usize> {
            (attempt < key_count).then(|| key_count - 1 - attempt)
        }
    }

    #[tokio::test]
    async fn test_rotation_policy_is_pluggable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secondary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config {
            keys: KeyRing::new([Some("primary".to_string()), Some("secondary".to_string())]),
            base_url: server.uri(),
            rotation: Arc::new(LastFirst),
            ..Config::default()
        };
        let reply = GroqModel::new(config)
            .unwrap()
            .chat(&[ChatMessage::user("hello")], false)
            .await
            .unwrap();
        assert_eq!(reply, "ok");
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = Config::with_keys(KeyRing::new([Some("sk-secret".to_string())]));
        let model = GroqModel::new(config).unwrap();
        assert!(!format!("{:?}", model).contains("sk-secret"));
    }
}
