//! AI 导师服务
//!
//! 一次对话请求：读取历史、拼装提示词、调用补全服务、保存双方消息。

pub mod prompt;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ai::{ChatMessage, CompletionClient, CompletionRequest};
use crate::error::{AppError, Result};
use crate::models::{Conversation, Message, MessageRole, title_from_message};
use crate::storage::repository::{
    ConversationRepository, ProfileRepository, Repositories, UserRepository,
};

pub use prompt::{PromptContext, build_system_prompt};

/// 会话列表的最大返回数量
pub const CONVERSATION_LIST_LIMIT: usize = 50;

/// 会话不存在或不属于当前用户
pub const CONVERSATION_NOT_FOUND_MESSAGE: &str = "Conversation not found";

/// 对话请求
#[derive(Debug, Clone)]
pub struct ChatInput {
    pub user_id: String,
    pub message: String,
    pub conversation_id: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
}

/// 对话结果
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: String,
    pub conversation_title: String,
}

/// 会话及其消息数量
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub message_count: u64,
}

/// 会话及其全部消息
#[derive(Debug, Clone)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// 补全参数
#[derive(Debug, Clone, Copy)]
pub struct CompletionSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// AI 导师服务 trait
#[async_trait]
pub trait TutorService: Send + Sync {
    /// 发送一条消息并获取导师回复
    async fn chat(&self, input: ChatInput) -> Result<ChatReply>;

    /// 列出用户的会话，最近活跃的在前
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>>;

    /// 获取用户自己的会话
    async fn get_conversation(&self, user_id: &str, id: &str) -> Result<ConversationDetail>;

    /// 删除用户自己的会话
    async fn delete_conversation(&self, user_id: &str, id: &str) -> Result<()>;
}

/// AI 导师服务实现
pub struct TutorServiceImpl {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    conversations: Arc<dyn ConversationRepository>,
    client: Arc<dyn CompletionClient>,
    settings: CompletionSettings,
}

impl TutorServiceImpl {
    /// 创建新的服务实例
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        conversations: Arc<dyn ConversationRepository>,
        client: Arc<dyn CompletionClient>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            users,
            profiles,
            conversations,
            client,
            settings,
        }
    }

    /// 复用用户自己的会话；ID 缺失、不存在或属于他人时新建
    async fn open_conversation(
        &self,
        input: &ChatInput,
        subject: Option<&str>,
        topic: Option<&str>,
    ) -> Result<(Conversation, Vec<Message>)> {
        if let Some(id) = input.conversation_id.as_deref() {
            match self.conversations.get_by_id(id).await? {
                Some(conversation) if conversation.user_id == input.user_id => {
                    let history = self.conversations.list_messages(id).await?;
                    return Ok((conversation, history));
                }
                Some(_) => warn!(
                    "User {} referenced conversation {} owned by another user",
                    input.user_id, id
                ),
                None => debug!("Conversation {} not found, starting a new one", id),
            }
        }

        let conversation = Conversation::new(&input.user_id, &input.message)
            .with_context(subject.map(str::to_string), topic.map(str::to_string));
        let conversation = self.conversations.create(&conversation).await?;
        Ok((conversation, Vec::new()))
    }

    /// 获取属于用户的会话
    async fn owned_conversation(&self, user_id: &str, id: &str) -> Result<Conversation> {
        self.conversations
            .get_by_id(id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(CONVERSATION_NOT_FOUND_MESSAGE.to_string()))
    }
}

/// 空白字符串视为未提供
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait]
impl TutorService for TutorServiceImpl {
    async fn chat(&self, input: ChatInput) -> Result<ChatReply> {
        let user = self
            .users
            .get_by_id(&input.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let profile = self.profiles.get_by_user_id(&user.id).await?;

        let subject = non_empty(input.subject.as_deref());
        let topic = non_empty(input.topic.as_deref());
        let (mut conversation, history) = self.open_conversation(&input, subject, topic).await?;

        self.conversations
            .add_message(&Message::new(&conversation.id, MessageRole::User, &input.message))
            .await?;

        let system_prompt = build_system_prompt(&PromptContext {
            user_name: &user.name,
            role: user.role,
            grade_level: profile.as_ref().and_then(|p| p.grade_level()),
            subject: subject.or(conversation.subject.as_deref()),
            topic: topic.or(conversation.topic.as_deref()),
        });

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(
            history
                .iter()
                .map(|m| ChatMessage::new(m.role, m.content.clone())),
        );
        messages.push(ChatMessage::user(input.message.clone()));

        debug!(
            "Sending {} messages for conversation {}",
            messages.len(),
            conversation.id
        );

        let response = self
            .client
            .complete(CompletionRequest {
                messages,
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
            })
            .await
            .map_err(|e| {
                warn!(
                    "Completion failed for conversation {}: {}",
                    conversation.id, e
                );
                match e {
                    AppError::AiService(msg) => AppError::AiService(msg),
                    other => AppError::AiService(other.to_string()),
                }
            })?;

        self.conversations
            .add_message(&Message::new(
                &conversation.id,
                MessageRole::Assistant,
                &response,
            ))
            .await?;

        if history.is_empty() {
            conversation.title = title_from_message(&input.message);
        }
        conversation.touch();
        let conversation = self
            .conversations
            .update(&conversation)
            .await?
            .unwrap_or(conversation);

        info!(
            "Tutor replied in conversation {} for user {}",
            conversation.id, user.id
        );

        Ok(ChatReply {
            response,
            conversation_id: conversation.id,
            conversation_title: conversation.title,
        })
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        let conversations = self
            .conversations
            .list_by_user(user_id, CONVERSATION_LIST_LIMIT, 0)
            .await?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let message_count = self.conversations.count_messages(&conversation.id).await?;
            summaries.push(ConversationSummary {
                conversation,
                message_count,
            });
        }
        Ok(summaries)
    }

    async fn get_conversation(&self, user_id: &str, id: &str) -> Result<ConversationDetail> {
        let conversation = self.owned_conversation(user_id, id).await?;
        let messages = self.conversations.list_messages(id).await?;
        Ok(ConversationDetail {
            conversation,
            messages,
        })
    }

    async fn delete_conversation(&self, user_id: &str, id: &str) -> Result<()> {
        self.owned_conversation(user_id, id).await?;
        self.conversations.delete(id).await?;
        info!("Deleted conversation {} for user {}", id, user_id);
        Ok(())
    }
}

/// 创建 AI 导师服务
pub fn create_tutor_service(
    repositories: &Repositories,
    client: Arc<dyn CompletionClient>,
    settings: CompletionSettings,
) -> Box<dyn TutorService> {
    Box::new(TutorServiceImpl::new(
        repositories.users.clone(),
        repositories.profiles.clone(),
        repositories.conversations.clone(),
        client,
        settings,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GradeLevel, StudentProfile, User, UserProfile, UserRole};
    use crate::storage::StorageFactory;
    use parking_lot::Mutex;

    /// 记录请求并按预设返回的补全客户端
    struct ScriptedClient {
        reply: Option<String>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            self.requests.lock().push(request);
            self.reply
                .clone()
                .ok_or_else(|| AppError::AiService("No response from AI".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "scripted"
        }
    }

    async fn setup(client: Arc<ScriptedClient>) -> (Repositories, Box<dyn TutorService>, User) {
        let repositories = StorageFactory::memory();
        let user = User::new("asha@example.com", "hash".into(), "Asha", UserRole::Student);
        repositories.users.create(&user).await.unwrap();
        repositories
            .profiles
            .create(&UserProfile::Student(StudentProfile::new(
                &user.id,
                GradeLevel::Primary5,
            )))
            .await
            .unwrap();

        let service = create_tutor_service(&repositories, client, CompletionSettings::default());
        (repositories, service, user)
    }

    fn input(user: &User, message: &str, conversation_id: Option<&str>) -> ChatInput {
        ChatInput {
            user_id: user.id.clone(),
            message: message.to_string(),
            conversation_id: conversation_id.map(str::to_string),
            subject: Some("Science".into()),
            topic: None,
        }
    }

    #[tokio::test]
    async fn test_first_chat_creates_conversation() {
        let client = ScriptedClient::replying("What do plants need to grow?");
        let (repositories, service, user) = setup(client.clone()).await;
        let message = "Explain photosynthesis to me in simple words please, with an example";

        let reply = service.chat(input(&user, message, None)).await.unwrap();
        assert_eq!(reply.response, "What do plants need to grow?");
        assert_eq!(
            reply.conversation_title,
            "Explain photosynthesis to me in simple words pleas..."
        );

        let messages = repositories
            .conversations
            .list_messages(&reply.conversation_id)
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);

        let requests = client.requests.lock();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.messages[0].role, MessageRole::System);
        assert!(sent.messages[0].content.contains("Grade level: Primary 5"));
        assert!(sent.messages[0].content.contains("Current subject: Science"));
        assert_eq!(sent.messages[1].content, message);
        assert_eq!(sent.max_tokens, 1000);
    }

    #[tokio::test]
    async fn test_follow_up_sends_history() {
        let client = ScriptedClient::replying("Good question!");
        let (_, service, user) = setup(client.clone()).await;

        let first = service.chat(input(&user, "What is a cell?", None)).await.unwrap();
        let second = service
            .chat(input(&user, "And a nucleus?", Some(&first.conversation_id)))
            .await
            .unwrap();
        assert_eq!(second.conversation_id, first.conversation_id);
        assert_eq!(second.conversation_title, "What is a cell?");

        let requests = client.requests.lock();
        let roles: Vec<MessageRole> = requests[1].messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
        assert_eq!(requests[1].messages[1].content, "What is a cell?");
        assert_eq!(requests[1].messages[3].content, "And a nucleus?");
    }

    #[tokio::test]
    async fn test_foreign_conversation_is_not_reused() {
        let client = ScriptedClient::replying("Sure.");
        let (repositories, service, user) = setup(client).await;

        let other = User::new("other@example.com", "hash".into(), "Other", UserRole::Teacher);
        repositories.users.create(&other).await.unwrap();
        let theirs = service.chat(input(&other, "Private question", None)).await.unwrap();

        let mine = service
            .chat(input(&user, "Hello", Some(&theirs.conversation_id)))
            .await
            .unwrap();
        assert_ne!(mine.conversation_id, theirs.conversation_id);
        assert_eq!(
            repositories
                .conversations
                .count_messages(&theirs.conversation_id)
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_ai_failure_keeps_user_message() {
        let (repositories, service, user) = setup(ScriptedClient::failing()).await;

        let err = service.chat(input(&user, "Help me", None)).await.unwrap_err();
        assert!(matches!(err, AppError::AiService(_)));

        let conversations = repositories
            .conversations
            .list_by_user(&user.id, 10, 0)
            .await
            .unwrap();
        assert_eq!(conversations.len(), 1);
        let messages = repositories
            .conversations
            .list_messages(&conversations[0].id)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Help me");
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (_, service, _) = setup(ScriptedClient::replying("hi")).await;
        let err = service
            .chat(ChatInput {
                user_id: "ghost".into(),
                message: "hi".into(),
                conversation_id: None,
                subject: None,
                topic: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "User not found"));
    }

    #[tokio::test]
    async fn test_conversation_management_is_owner_only() {
        let (repositories, service, user) = setup(ScriptedClient::replying("ok")).await;
        let reply = service.chat(input(&user, "Hi", None)).await.unwrap();

        let summaries = service.list_conversations(&user.id).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].message_count, 2);

        let detail = service.get_conversation(&user.id, &reply.conversation_id).await.unwrap();
        assert_eq!(detail.messages.len(), 2);

        assert!(matches!(
            service.get_conversation("someone-else", &reply.conversation_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_conversation("someone-else", &reply.conversation_id).await,
            Err(AppError::NotFound(_))
        ));

        service.delete_conversation(&user.id, &reply.conversation_id).await.unwrap();
        assert!(repositories
            .conversations
            .get_by_id(&reply.conversation_id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            repositories.conversations.count_messages(&reply.conversation_id).await.unwrap(),
            0
        );
    }
}
