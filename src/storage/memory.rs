//! 内存存储后端
//!
//! 所有表放在同一把读写锁后面，邮箱唯一性检查与插入在一次写锁内完成。
//! 用于开发环境和测试，进程退出后数据丢失。

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{
    Assignment, Conversation, Message, SubjectProgress, User, UserProfile,
};
use crate::storage::repository::{
    ConversationRepository, LearningRepository, ProfileRepository, StorageHealth, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    /// email -> user id
    emails: HashMap<String, String>,
    profiles: HashMap<String, UserProfile>,
    conversations: HashMap<String, Conversation>,
    /// conversation id -> 按插入顺序排列的消息
    messages: HashMap<String, Vec<Message>>,
    progress: HashMap<(String, String), SubjectProgress>,
    assignments: HashMap<String, Assignment>,
}

/// 进程内存储
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<User> {
        let mut tables = self.tables.write();
        if tables.emails.contains_key(&user.email) {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        if tables.users.contains_key(&user.id) {
            return Err(AppError::Database(format!("Duplicate user id: {}", user.id)));
        }
        tables.emails.insert(user.email.clone(), user.id.clone());
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.users.remove(id) {
            Some(user) => {
                tables.emails.remove(&user.email);
                tables.profiles.remove(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables.read().users.len() as u64)
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn create(&self, profile: &UserProfile) -> Result<UserProfile> {
        let mut tables = self.tables.write();
        let user_id = profile.user_id().to_string();
        if !tables.users.contains_key(&user_id) {
            return Err(AppError::Database(format!(
                "Profile references unknown user: {}",
                user_id
            )));
        }
        if tables.profiles.contains_key(&user_id) {
            return Err(AppError::Conflict(format!(
                "Profile already exists for user: {}",
                user_id
            )));
        }
        tables.profiles.insert(user_id, profile.clone());
        Ok(profile.clone())
    }

    async fn get_by_user_id(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.tables.read().profiles.get(user_id).cloned())
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation> {
        let mut tables = self.tables.write();
        tables
            .conversations
            .insert(conversation.id.clone(), conversation.clone());
        tables.messages.entry(conversation.id.clone()).or_default();
        Ok(conversation.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Conversation>> {
        Ok(self.tables.read().conversations.get(id).cloned())
    }

    async fn update(&self, conversation: &Conversation) -> Result<Option<Conversation>> {
        let mut tables = self.tables.write();
        match tables.conversations.get_mut(&conversation.id) {
            Some(existing) => {
                *existing = conversation.clone();
                Ok(Some(conversation.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.write();
        tables.messages.remove(id);
        Ok(tables.conversations.remove(id).is_some())
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
        start: usize,
    ) -> Result<Vec<Conversation>> {
        let tables = self.tables.read();
        let mut conversations: Vec<Conversation> = tables
            .conversations
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations.into_iter().skip(start).take(limit).collect())
    }

    async fn count_by_user(&self, user_id: &str) -> Result<u64> {
        Ok(self
            .tables
            .read()
            .conversations
            .values()
            .filter(|c| c.user_id == user_id)
            .count() as u64)
    }

    async fn add_message(&self, message: &Message) -> Result<Message> {
        let mut tables = self.tables.write();
        if !tables.conversations.contains_key(&message.conversation_id) {
            return Err(AppError::NotFound(format!(
                "Conversation not found: {}",
                message.conversation_id
            )));
        }
        tables
            .messages
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message.clone());
        Ok(message.clone())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .tables
            .read()
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn count_messages(&self, conversation_id: &str) -> Result<u64> {
        Ok(self
            .tables
            .read()
            .messages
            .get(conversation_id)
            .map(|m| m.len() as u64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl LearningRepository for MemoryStore {
    async fn upsert_progress(&self, progress: &SubjectProgress) -> Result<SubjectProgress> {
        let mut tables = self.tables.write();
        let key = (progress.student_id.clone(), progress.subject.to_lowercase());
        let stored = match tables.progress.get(&key) {
            Some(existing) => SubjectProgress {
                id: existing.id.clone(),
                ..progress.clone()
            },
            None => progress.clone(),
        };
        tables.progress.insert(key, stored.clone());
        Ok(stored)
    }

    async fn list_progress(&self, student_id: &str) -> Result<Vec<SubjectProgress>> {
        let tables = self.tables.read();
        let mut items: Vec<SubjectProgress> = tables
            .progress
            .values()
            .filter(|p| p.student_id == student_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.subject.cmp(&b.subject));
        Ok(items)
    }

    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment> {
        self.tables
            .write()
            .assignments
            .insert(assignment.id.clone(), assignment.clone());
        Ok(assignment.clone())
    }

    async fn get_assignment(&self, id: &str) -> Result<Option<Assignment>> {
        Ok(self.tables.read().assignments.get(id).cloned())
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<Option<Assignment>> {
        let mut tables = self.tables.write();
        match tables.assignments.get_mut(&assignment.id) {
            Some(existing) => {
                *existing = assignment.clone();
                Ok(Some(assignment.clone()))
            }
            None => Ok(None),
        }
    }

    async fn list_assignments(&self, student_id: &str) -> Result<Vec<Assignment>> {
        let tables = self.tables.read();
        let mut items: Vec<Assignment> = tables
            .assignments
            .values()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.title.cmp(&b.title)));
        Ok(items)
    }
}

#[async_trait]
impl StorageHealth for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
