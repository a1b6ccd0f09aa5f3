//! 补全客户端实现

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::ai::{ChatMessage, CompletionClient, CompletionRequest};
use crate::error::{AppError, Result};
use crate::models::MessageRole;

/// OpenAI 兼容的 `/chat/completions` 客户端
pub struct OpenAiCompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiCompletionClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            "Requesting completion: model={}, messages={}",
            self.model,
            request.messages.len()
        );

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::AiService(format!(
                "completion request failed with {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::AiService("No response from AI".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "openai"
    }
}

/// 离线开发用的回声后端
pub struct EchoCompletionClient;

#[async_trait]
impl CompletionClient for EchoCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let question = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.trim())
            .ok_or_else(|| AppError::AiService("No response from AI".to_string()))?;

        Ok(format!(
            "Let's work through \"{}\" together. What do you already know about it?",
            question
        ))
    }

    fn backend_name(&self) -> &'static str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                ChatMessage::system("You are an AI tutor."),
                ChatMessage::user("What is a prime number?"),
            ],
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    #[tokio::test]
    async fn test_openai_client_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "tutor-model",
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "You are an AI tutor."},
                    {"role": "user", "content": "What is a prime number?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Can you think of a number only divisible by 1 and itself?"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new(
            &format!("{}/v1/", server.uri()),
            "sk-test",
            "tutor-model",
            5,
        )
        .unwrap();
        let answer = client.complete(request()).await.unwrap();
        assert_eq!(answer, "Can you think of a number only divisible by 1 and itself?");
    }

    #[tokio::test]
    async fn test_openai_client_maps_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new(&server.uri(), "", "m", 5).unwrap();
        let err = client.complete(request()).await.unwrap_err();
        assert!(matches!(err, AppError::AiService(ref msg) if msg.contains("overloaded")));
    }

    #[tokio::test]
    async fn test_openai_client_rejects_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new(&server.uri(), "", "m", 5).unwrap();
        let err = client.complete(request()).await.unwrap_err();
        assert!(matches!(err, AppError::AiService(_)));
    }

    #[tokio::test]
    async fn test_echo_client_quotes_last_user_message() {
        let answer = EchoCompletionClient.complete(request()).await.unwrap();
        assert!(answer.contains("What is a prime number?"));
    }
}
