//! AI 补全服务模块
//!
//! 对第三方聊天补全接口的抽象。导师服务只依赖 [`CompletionClient`]，
//! 具体后端由配置选择。

pub mod completion;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::config::AiConfig;
use crate::error::{AppError, Result};
use crate::models::MessageRole;

pub use completion::{EchoCompletionClient, OpenAiCompletionClient};

/// 发送给模型的一条消息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

/// 补全请求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// 聊天补全客户端
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// 返回模型生成的文本；没有内容时返回错误
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    /// 后端名称
    fn backend_name(&self) -> &'static str;
}

/// 根据配置创建补全客户端
pub fn create_completion_client(config: &AiConfig) -> Result<Box<dyn CompletionClient>> {
    match config.backend.as_str() {
        "openai" => {
            let client = OpenAiCompletionClient::new(
                &config.base_url,
                &config.api_key,
                &config.model,
                config.timeout,
            )?;
            Ok(Box::new(client))
        }
        "echo" => Ok(Box::new(EchoCompletionClient)),
        other => Err(AppError::Config(format!("Unknown AI backend: {}", other))),
    }
}
