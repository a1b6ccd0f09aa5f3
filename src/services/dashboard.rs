//! 仪表盘服务
//!
//! 学科进度、作业与最近的导师会话汇总。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{
    Assignment, AssignmentStatus, SubjectProgress, User, UserProfile, UserRole,
};
use crate::storage::repository::{
    ConversationRepository, LearningRepository, ProfileRepository, Repositories, UserRepository,
};

/// 仪表盘展示的最近会话数
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// 最近活动
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// 汇总统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub conversation_count: u64,
    /// 各学科进度的平均值（取整）
    pub average_progress: u8,
    pub pending_assignments: usize,
    pub completed_assignments: usize,
}

/// 仪表盘数据
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub user: User,
    pub profile: Option<UserProfile>,
    pub subjects: Vec<SubjectProgress>,
    pub upcoming_assignments: Vec<Assignment>,
    pub recent_activity: Vec<Activity>,
    pub stats: DashboardStats,
}

/// 进度更新
#[derive(Debug, Clone)]
pub struct ProgressInput {
    /// 缺省为当前用户
    pub student_id: Option<String>,
    pub subject: String,
    pub progress: i64,
    pub grade: Option<String>,
}

/// 布置作业
#[derive(Debug, Clone)]
pub struct AssignmentInput {
    /// 缺省为当前用户
    pub student_id: Option<String>,
    pub title: String,
    pub subject: String,
    pub due_date: NaiveDate,
}

/// 仪表盘服务 trait
#[async_trait]
pub trait DashboardService: Send + Sync {
    /// 当前用户的仪表盘
    async fn dashboard(&self, user: &User) -> Result<DashboardView>;

    /// 插入或更新学科进度
    async fn upsert_progress(&self, actor: &User, input: ProgressInput) -> Result<SubjectProgress>;

    /// 布置作业
    async fn create_assignment(&self, actor: &User, input: AssignmentInput) -> Result<Assignment>;

    /// 更新作业状态
    async fn update_assignment_status(
        &self,
        actor: &User,
        id: &str,
        status: AssignmentStatus,
    ) -> Result<Assignment>;
}

/// 仪表盘服务实现
pub struct DashboardServiceImpl {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    conversations: Arc<dyn ConversationRepository>,
    learning: Arc<dyn LearningRepository>,
}

impl DashboardServiceImpl {
    /// 创建新的服务实例
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        conversations: Arc<dyn ConversationRepository>,
        learning: Arc<dyn LearningRepository>,
    ) -> Self {
        Self {
            users,
            profiles,
            conversations,
            learning,
        }
    }

    /// 确定操作对象：默认本人，替他人操作需要教师、家长或管理员角色
    async fn resolve_student(&self, actor: &User, student_id: Option<&str>) -> Result<String> {
        let target_id = match student_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) if id != actor.id => {
                if !actor.role.can_manage_students() {
                    return Err(AppError::Authorization(
                        "Not allowed to manage other students".to_string(),
                    ));
                }
                id.to_string()
            }
            _ => actor.id.clone(),
        };

        let target = if target_id == actor.id {
            actor.clone()
        } else {
            self.users
                .get_by_id(&target_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?
        };

        if target.role != UserRole::Student {
            return Err(AppError::Validation(
                "Target user is not a student".to_string(),
            ));
        }
        Ok(target.id)
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

#[async_trait]
impl DashboardService for DashboardServiceImpl {
    async fn dashboard(&self, user: &User) -> Result<DashboardView> {
        let profile = self.profiles.get_by_user_id(&user.id).await?;
        let subjects = self.learning.list_progress(&user.id).await?;
        let assignments = self.learning.list_assignments(&user.id).await?;
        let conversations = self
            .conversations
            .list_by_user(&user.id, RECENT_ACTIVITY_LIMIT, 0)
            .await?;
        let conversation_count = self.conversations.count_by_user(&user.id).await?;

        let average_progress = if subjects.is_empty() {
            0
        } else {
            let total: u32 = subjects.iter().map(|s| u32::from(s.progress)).sum();
            (total as f64 / subjects.len() as f64).round() as u8
        };

        let (upcoming_assignments, completed): (Vec<Assignment>, Vec<Assignment>) =
            assignments.into_iter().partition(Assignment::is_open);

        let recent_activity = conversations
            .into_iter()
            .map(|c| Activity {
                description: format!("AI Tutor session on {}", c.title),
                id: c.id,
                timestamp: c.updated_at,
            })
            .collect();

        Ok(DashboardView {
            user: user.clone(),
            profile,
            stats: DashboardStats {
                conversation_count,
                average_progress,
                pending_assignments: upcoming_assignments.len(),
                completed_assignments: completed.len(),
            },
            subjects,
            upcoming_assignments,
            recent_activity,
        })
    }

    async fn upsert_progress(&self, actor: &User, input: ProgressInput) -> Result<SubjectProgress> {
        let subject = required(&input.subject, "Subject")?;
        if !(0..=100).contains(&input.progress) {
            return Err(AppError::Validation(
                "Progress must be between 0 and 100".to_string(),
            ));
        }

        let student_id = self
            .resolve_student(actor, input.student_id.as_deref())
            .await?;
        let grade = input
            .grade
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        let progress = SubjectProgress::new(&student_id, &subject, input.progress as u8, grade);
        let saved = self.learning.upsert_progress(&progress).await?;
        info!(
            "Progress for {} in {} set to {} by {}",
            student_id, saved.subject, saved.progress, actor.id
        );
        Ok(saved)
    }

    async fn create_assignment(&self, actor: &User, input: AssignmentInput) -> Result<Assignment> {
        let title = required(&input.title, "Title")?;
        let subject = required(&input.subject, "Subject")?;
        let student_id = self
            .resolve_student(actor, input.student_id.as_deref())
            .await?;

        let assignment = Assignment::new(&student_id, &title, &subject, input.due_date, &actor.id);
        let saved = self.learning.create_assignment(&assignment).await?;
        info!("Assignment {} created for {} by {}", saved.id, student_id, actor.id);
        Ok(saved)
    }

    async fn update_assignment_status(
        &self,
        actor: &User,
        id: &str,
        status: AssignmentStatus,
    ) -> Result<Assignment> {
        let not_found = || AppError::NotFound("Assignment not found".to_string());

        let mut assignment = self
            .learning
            .get_assignment(id)
            .await?
            .filter(|a| a.is_visible_to(&actor.id))
            .ok_or_else(not_found)?;

        assignment.status = status;
        self.learning
            .update_assignment(&assignment)
            .await?
            .ok_or_else(not_found)
    }
}

/// 创建仪表盘服务
pub fn create_dashboard_service(repositories: &Repositories) -> Box<dyn DashboardService> {
    Box::new(DashboardServiceImpl::new(
        repositories.users.clone(),
        repositories.profiles.clone(),
        repositories.conversations.clone(),
        repositories.learning.clone(),
    ))
}
