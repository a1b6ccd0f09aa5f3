use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 标题最多保留的字符数
pub const TITLE_MAX_CHARS: usize = 50;

/// 消息角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// 系统提示
    System,
    /// 学生
    User,
    /// AI 导师
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// AI 导师会话
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    /// 会话唯一标识
    pub id: String,
    /// 所属用户
    pub user_id: String,
    /// 标题
    pub title: String,
    /// 学科
    pub subject: Option<String>,
    /// 主题
    pub topic: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 最后活跃时间
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// 以首条消息创建会话
    pub fn new(user_id: &str, first_message: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title_from_message(first_message),
            subject: None,
            topic: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 设置学科与主题
    pub fn with_context(mut self, subject: Option<String>, topic: Option<String>) -> Self {
        self.subject = subject;
        self.topic = topic;
        self
    }

    /// 更新最后活跃时间
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// 会话中的一条消息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(conversation_id: &str, role: MessageRole, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// 由消息生成会话标题：前 50 个字符，超出时追加 `...`
pub fn title_from_message(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
