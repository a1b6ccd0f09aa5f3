//! SurrealDB 仓储实现
//!
//! 记录 ID 即实体 ID（`user:<uuid>`），写入时从内容中去掉 `id` 字段，
//! 读取时用 `record::id(id)` 还原为字符串。

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use surrealdb::{Surreal, engine::any::Any};

use crate::error::{AppError, Result};
use crate::models::{
    Assignment, Conversation, Message, SubjectProgress, User, UserProfile,
};
use crate::storage::repository::{
    ConversationRepository, LearningRepository, ProfileRepository, StorageHealth, UserRepository,
};
use crate::storage::surrealdb::SurrealPool;

const USER_FIELDS: &str = "record::id(id) AS id, email, password_hash, name, role, avatar, \
                           date_of_birth, phone, address, created_at, updated_at";
const CONVERSATION_FIELDS: &str =
    "record::id(id) AS id, user_id, title, subject, topic, created_at, updated_at";
const MESSAGE_FIELDS: &str = "record::id(id) AS id, conversation_id, role, content, created_at";
const PROGRESS_FIELDS: &str =
    "record::id(id) AS id, student_id, subject, progress, grade, updated_at";
const ASSIGNMENT_FIELDS: &str = "record::id(id) AS id, student_id, title, subject, due_date, \
                                 status, created_by, created_at";

#[derive(Deserialize)]
struct CountRow {
    count: u64,
}

#[derive(Serialize, Deserialize)]
struct ProfileRow {
    profile: UserProfile,
}

/// 参与 `ORDER BY` 的时间字段
const TIMESTAMP_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// 把实体序列化为记录内容（去掉 `id`）
///
/// 时间字段统一写成纳秒精度的 RFC 3339，字符串顺序与时间顺序一致。
fn content_of<T: Serialize>(entity: &T) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(entity)?;
    if let Some(object) = value.as_object_mut() {
        object.remove("id");
        for field in TIMESTAMP_FIELDS {
            let fixed = object
                .get(field)
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| fixed_width_timestamp(t.with_timezone(&Utc)));
            if let Some(fixed) = fixed {
                object.insert(field.to_string(), serde_json::Value::String(fixed));
            }
        }
    }
    Ok(value)
}

fn fixed_width_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// 唯一索引冲突时 SurrealDB 返回 "... already contains ..."
fn map_write_error(e: surrealdb::Error, conflict_message: &str) -> AppError {
    let text = e.to_string();
    if text.contains("already contains") {
        AppError::Conflict(conflict_message.to_string())
    } else {
        AppError::Database(text)
    }
}

/// SurrealDB 仓储
#[derive(Clone)]
pub struct SurrealRepository {
    pool: SurrealPool,
    db: Surreal<Any>,
}

impl SurrealRepository {
    pub fn new(pool: SurrealPool) -> Self {
        let db = pool.inner();
        Self { pool, db }
    }

    async fn insert<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        entity: &T,
        conflict_message: &str,
    ) -> Result<()> {
        let content = content_of(entity)?;
        self.insert_content(table, id, content, conflict_message).await
    }

    async fn insert_content(
        &self,
        table: &str,
        id: &str,
        content: serde_json::Value,
        conflict_message: &str,
    ) -> Result<()> {
        self.db
            .query("CREATE type::thing($tb, $id) CONTENT $content RETURN NONE")
            .bind(("tb", table.to_string()))
            .bind(("id", id.to_string()))
            .bind(("content", content))
            .await?
            .check()
            .map_err(|e| map_write_error(e, conflict_message))?;
        Ok(())
    }

    /// 覆盖已有记录；记录不存在时返回 false
    async fn replace<T: Serialize>(&self, table: &str, id: &str, entity: &T) -> Result<bool> {
        if !self.exists(table, id).await? {
            return Ok(false);
        }
        let content = content_of(entity)?;
        self.replace_content(table, id, content).await?;
        Ok(true)
    }

    async fn replace_content(&self, table: &str, id: &str, content: serde_json::Value) -> Result<()> {
        self.db
            .query("UPDATE type::thing($tb, $id) CONTENT $content RETURN NONE")
            .bind(("tb", table.to_string()))
            .bind(("id", id.to_string()))
            .bind(("content", content))
            .await?
            .check()?;
        Ok(())
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        fields: &str,
        table: &str,
        id: &str,
    ) -> Result<Option<T>> {
        let mut response = self
            .db
            .query(format!("SELECT {} FROM type::thing($tb, $id)", fields))
            .bind(("tb", table.to_string()))
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<T> = response.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn exists(&self, table: &str, id: &str) -> Result<bool> {
        let mut response = self
            .db
            .query("SELECT VALUE record::id(id) FROM type::thing($tb, $id)")
            .bind(("tb", table.to_string()))
            .bind(("id", id.to_string()))
            .await?;
        let ids: Vec<String> = response.take(0)?;
        Ok(!ids.is_empty())
    }

    async fn remove(&self, table: &str, id: &str) -> Result<bool> {
        if !self.exists(table, id).await? {
            return Ok(false);
        }
        self.db
            .query("DELETE type::thing($tb, $id)")
            .bind(("tb", table.to_string()))
            .bind(("id", id.to_string()))
            .await?
            .check()?;
        Ok(true)
    }

    async fn count_where(&self, table: &str, field: &str, value: &str) -> Result<u64> {
        let mut response = self
            .db
            .query(format!(
                "SELECT count() FROM type::table($tb) WHERE {} = $value GROUP ALL",
                field
            ))
            .bind(("tb", table.to_string()))
            .bind(("value", value.to_string()))
            .await?;
        let rows: Vec<CountRow> = response.take(0)?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }
}

#[async_trait]
impl UserRepository for SurrealRepository {
    async fn create(&self, user: &User) -> Result<User> {
        self.insert("user", &user.id, user, "User with this email already exists")
            .await?;
        Ok(user.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        self.select_one(USER_FIELDS, "user", id).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut response = self
            .db
            .query(format!("SELECT {} FROM user WHERE email = $email LIMIT 1", USER_FIELDS))
            .bind(("email", email.to_string()))
            .await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users.into_iter().next())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.remove("user", id).await?;
        if removed {
            self.remove("profile", id).await?;
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<u64> {
        let mut response = self.db.query("SELECT count() FROM user GROUP ALL").await?;
        let rows: Vec<CountRow> = response.take(0)?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }
}

#[async_trait]
impl ProfileRepository for SurrealRepository {
    async fn create(&self, profile: &UserProfile) -> Result<UserProfile> {
        let row = ProfileRow {
            profile: profile.clone(),
        };
        self.insert_content(
            "profile",
            profile.user_id(),
            serde_json::to_value(&row)?,
            "Profile already exists",
        )
        .await?;
        Ok(profile.clone())
    }

    async fn get_by_user_id(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let row: Option<ProfileRow> = self.select_one("profile", "profile", user_id).await?;
        Ok(row.map(|r| r.profile))
    }
}

#[async_trait]
impl ConversationRepository for SurrealRepository {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation> {
        self.insert(
            "conversation",
            &conversation.id,
            conversation,
            "Conversation already exists",
        )
        .await?;
        Ok(conversation.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Conversation>> {
        self.select_one(CONVERSATION_FIELDS, "conversation", id).await
    }

    async fn update(&self, conversation: &Conversation) -> Result<Option<Conversation>> {
        let updated = self
            .replace("conversation", &conversation.id, conversation)
            .await?;
        Ok(updated.then(|| conversation.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if !self.exists("conversation", id).await? {
            return Ok(false);
        }
        self.db
            .query("DELETE message WHERE conversation_id = $id; DELETE type::thing('conversation', $id);")
            .bind(("id", id.to_string()))
            .await?
            .check()?;
        Ok(true)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
        start: usize,
    ) -> Result<Vec<Conversation>> {
        let mut response = self
            .db
            .query(format!(
                "SELECT {} FROM conversation WHERE user_id = $user_id \
                 ORDER BY updated_at DESC LIMIT $limit START $start",
                CONVERSATION_FIELDS
            ))
            .bind(("user_id", user_id.to_string()))
            .bind(("limit", limit))
            .bind(("start", start))
            .await?;
        Ok(response.take(0)?)
    }

    async fn count_by_user(&self, user_id: &str) -> Result<u64> {
        self.count_where("conversation", "user_id", user_id).await
    }

    async fn add_message(&self, message: &Message) -> Result<Message> {
        if !self.exists("conversation", &message.conversation_id).await? {
            return Err(AppError::NotFound(format!(
                "Conversation not found: {}",
                message.conversation_id
            )));
        }
        self.insert("message", &message.id, message, "Message already exists")
            .await?;
        Ok(message.clone())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let mut response = self
            .db
            .query(format!(
                "SELECT {} FROM message WHERE conversation_id = $conversation_id \
                 ORDER BY created_at ASC",
                MESSAGE_FIELDS
            ))
            .bind(("conversation_id", conversation_id.to_string()))
            .await?;
        Ok(response.take(0)?)
    }

    async fn count_messages(&self, conversation_id: &str) -> Result<u64> {
        self.count_where("message", "conversation_id", conversation_id)
            .await
    }
}

#[async_trait]
impl LearningRepository for SurrealRepository {
    async fn upsert_progress(&self, progress: &SubjectProgress) -> Result<SubjectProgress> {
        let subject_key = progress.subject.to_lowercase();
        let mut response = self
            .db
            .query(
                "SELECT VALUE record::id(id) FROM progress \
                 WHERE student_id = $student_id AND subject_key = $subject_key LIMIT 1",
            )
            .bind(("student_id", progress.student_id.clone()))
            .bind(("subject_key", subject_key.clone()))
            .await?;
        let existing: Vec<String> = response.take(0)?;

        let stored = match existing.into_iter().next() {
            Some(id) => SubjectProgress {
                id,
                ..progress.clone()
            },
            None => progress.clone(),
        };

        let mut content = content_of(&stored)?;
        if let Some(object) = content.as_object_mut() {
            object.insert("subject_key".into(), serde_json::Value::String(subject_key));
        }

        if stored.id == progress.id {
            self.insert_content("progress", &stored.id, content, "Progress already exists")
                .await?;
        } else {
            self.replace_content("progress", &stored.id, content).await?;
        }
        Ok(stored)
    }

    async fn list_progress(&self, student_id: &str) -> Result<Vec<SubjectProgress>> {
        let mut response = self
            .db
            .query(format!(
                "SELECT {} FROM progress WHERE student_id = $student_id ORDER BY subject ASC",
                PROGRESS_FIELDS
            ))
            .bind(("student_id", student_id.to_string()))
            .await?;
        Ok(response.take(0)?)
    }

    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment> {
        self.insert(
            "assignment",
            &assignment.id,
            assignment,
            "Assignment already exists",
        )
        .await?;
        Ok(assignment.clone())
    }

    async fn get_assignment(&self, id: &str) -> Result<Option<Assignment>> {
        self.select_one(ASSIGNMENT_FIELDS, "assignment", id).await
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<Option<Assignment>> {
        let updated = self
            .replace("assignment", &assignment.id, assignment)
            .await?;
        Ok(updated.then(|| assignment.clone()))
    }

    async fn list_assignments(&self, student_id: &str) -> Result<Vec<Assignment>> {
        let mut response = self
            .db
            .query(format!(
                "SELECT {} FROM assignment WHERE student_id = $student_id \
                 ORDER BY due_date ASC, title ASC",
                ASSIGNMENT_FIELDS
            ))
            .bind(("student_id", student_id.to_string()))
            .await?;
        Ok(response.take(0)?)
    }
}

#[async_trait]
impl StorageHealth for SurrealRepository {
    fn backend_name(&self) -> &'static str {
        "surrealdb"
    }

    async fn ping(&self) -> Result<()> {
        self.pool.health().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    #[test]
    fn test_content_strips_id() {
        let user = User::new("a@b.in", "hash".into(), "A", UserRole::Teacher);
        let content = content_of(&user).unwrap();
        assert!(content.get("id").is_none());
        assert_eq!(content["email"], "a@b.in");
        assert_eq!(content["role"], "TEACHER");
    }

    #[test]
    fn test_timestamps_sort_as_strings() {
        let whole = DateTime::parse_from_rfc3339("2026-03-01T10:00:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = whole + chrono::Duration::milliseconds(100);

        let mut first = Message::new("c1", crate::models::MessageRole::User, "hi");
        first.created_at = whole;
        let mut second = first.clone();
        second.created_at = later;

        let a = content_of(&first).unwrap()["created_at"].as_str().unwrap().to_string();
        let b = content_of(&second).unwrap()["created_at"].as_str().unwrap().to_string();
        assert_eq!(a, "2026-03-01T10:00:05.000000000Z");
        assert!(a < b, "{} should sort before {}", a, b);

        let parsed: DateTime<Utc> = a.parse().unwrap();
        assert_eq!(parsed, whole);
    }
}
