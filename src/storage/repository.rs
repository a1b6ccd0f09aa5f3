//! 仓储 trait
//!
//! 服务层只依赖这里的 trait，存储后端（内存 / SurrealDB）各自实现。

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{
    Assignment, Conversation, Message, SubjectProgress, User, UserProfile,
};

/// 用户仓储
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户；邮箱已存在时返回 `AppError::Conflict`
    async fn create(&self, user: &User) -> Result<User>;

    /// 根据 ID 获取用户
    async fn get_by_id(&self, id: &str) -> Result<Option<User>>;

    /// 根据邮箱获取用户（邮箱需已规范化）
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// 删除用户
    async fn delete(&self, id: &str) -> Result<bool>;

    /// 统计数量
    async fn count(&self) -> Result<u64>;
}

/// 角色档案仓储（按 user_id 一对一）
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// 创建档案
    async fn create(&self, profile: &UserProfile) -> Result<UserProfile>;

    /// 根据用户 ID 获取档案
    async fn get_by_user_id(&self, user_id: &str) -> Result<Option<UserProfile>>;
}

/// AI 导师会话仓储，消息归属于会话
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// 创建会话
    async fn create(&self, conversation: &Conversation) -> Result<Conversation>;

    /// 根据 ID 获取会话
    async fn get_by_id(&self, id: &str) -> Result<Option<Conversation>>;

    /// 更新会话
    async fn update(&self, conversation: &Conversation) -> Result<Option<Conversation>>;

    /// 删除会话及其全部消息
    async fn delete(&self, id: &str) -> Result<bool>;

    /// 按用户列出会话，最近活跃的在前
    async fn list_by_user(&self, user_id: &str, limit: usize, start: usize)
    -> Result<Vec<Conversation>>;

    /// 按用户统计会话数量
    async fn count_by_user(&self, user_id: &str) -> Result<u64>;

    /// 追加消息
    async fn add_message(&self, message: &Message) -> Result<Message>;

    /// 列出会话消息，按创建顺序
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// 统计会话消息数量
    async fn count_messages(&self, conversation_id: &str) -> Result<u64>;
}

/// 学习进度与作业仓储
#[async_trait]
pub trait LearningRepository: Send + Sync {
    /// 按 (student_id, subject) 插入或更新进度，已有记录保留原 ID
    async fn upsert_progress(&self, progress: &SubjectProgress) -> Result<SubjectProgress>;

    /// 列出学生的学科进度，按学科名排序
    async fn list_progress(&self, student_id: &str) -> Result<Vec<SubjectProgress>>;

    /// 创建作业
    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment>;

    /// 根据 ID 获取作业
    async fn get_assignment(&self, id: &str) -> Result<Option<Assignment>>;

    /// 更新作业
    async fn update_assignment(&self, assignment: &Assignment) -> Result<Option<Assignment>>;

    /// 列出学生的作业，按截止日期排序
    async fn list_assignments(&self, student_id: &str) -> Result<Vec<Assignment>>;
}

/// 存储健康检查
#[async_trait]
pub trait StorageHealth: Send + Sync {
    /// 后端名称
    fn backend_name(&self) -> &'static str;

    /// 检查存储是否可用
    async fn ping(&self) -> Result<()>;
}

/// 一组共享同一后端的仓储
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub learning: Arc<dyn LearningRepository>,
    pub health: Arc<dyn StorageHealth>,
}

impl Repositories {
    /// 由同时实现全部仓储 trait 的后端构建
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserRepository
            + ProfileRepository
            + ConversationRepository
            + LearningRepository
            + StorageHealth
            + 'static,
    {
        Self {
            users: backend.clone(),
            profiles: backend.clone(),
            conversations: backend.clone(),
            learning: backend.clone(),
            health: backend,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories")
            .field("backend", &self.health.backend_name())
            .finish()
    }
}
