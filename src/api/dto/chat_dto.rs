//! AI 导师 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Conversation, Message, MessageRole};
use crate::services::{ChatReply, ConversationDetail, ConversationSummary};

/// 对话请求
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub conversation_id: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
}

/// 对话响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    pub conversation_title: String,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            response: reply.response,
            conversation_id: reply.conversation_id,
            conversation_title: reply.conversation_title,
        }
    }
}

/// 会话响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub title: String,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
}

impl From<&Conversation> for ConversationResponse {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id.clone(),
            title: c.title.clone(),
            subject: c.subject.clone(),
            topic: c.topic.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
            message_count: None,
        }
    }
}

impl From<&ConversationSummary> for ConversationResponse {
    fn from(summary: &ConversationSummary) -> Self {
        Self {
            message_count: Some(summary.message_count),
            ..Self::from(&summary.conversation)
        }
    }
}

/// 会话列表响应
#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationResponse>,
}

/// 消息响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageResponse {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.clone(),
            role: m.role,
            content: m.content.clone(),
            created_at: m.created_at,
        }
    }
}

/// 会话详情响应
#[derive(Debug, Serialize)]
pub struct ConversationDetailResponse {
    pub conversation: ConversationResponse,
    pub messages: Vec<MessageResponse>,
}

impl From<&ConversationDetail> for ConversationDetailResponse {
    fn from(detail: &ConversationDetail) -> Self {
        Self {
            conversation: ConversationResponse::from(&detail.conversation),
            messages: detail.messages.iter().map(MessageResponse::from).collect(),
        }
    }
}

/// 删除响应
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}
