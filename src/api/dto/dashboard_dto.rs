//! 仪表盘 DTO

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::dto::auth_dto::{ProfileResponse, UserResponse};
use crate::api::dto::{MISSING_FIELDS_MESSAGE, non_empty, number_field};
use crate::error::{AppError, Result};
use crate::models::{Assignment, AssignmentStatus, SubjectProgress};
use crate::services::{Activity, AssignmentInput, DashboardStats, DashboardView, ProgressInput};

/// 学科进度响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgressResponse {
    pub id: String,
    pub student_id: String,
    pub subject: String,
    pub progress: u8,
    pub grade: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SubjectProgress> for SubjectProgressResponse {
    fn from(p: &SubjectProgress) -> Self {
        Self {
            id: p.id.clone(),
            student_id: p.student_id.clone(),
            subject: p.subject.clone(),
            progress: p.progress,
            grade: p.grade.clone(),
            updated_at: p.updated_at,
        }
    }
}

/// 作业响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub id: String,
    pub student_id: String,
    pub title: String,
    pub subject: String,
    pub due_date: NaiveDate,
    pub status: AssignmentStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Assignment> for AssignmentResponse {
    fn from(a: &Assignment) -> Self {
        Self {
            id: a.id.clone(),
            student_id: a.student_id.clone(),
            title: a.title.clone(),
            subject: a.subject.clone(),
            due_date: a.due_date,
            status: a.status,
            created_by: a.created_by.clone(),
            created_at: a.created_at,
        }
    }
}

/// 最近活动
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub id: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Activity> for ActivityResponse {
    fn from(a: &Activity) -> Self {
        Self {
            id: a.id.clone(),
            description: a.description.clone(),
            timestamp: a.timestamp,
        }
    }
}

/// 统计
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub conversation_count: u64,
    pub average_progress: u8,
    pub pending_assignments: usize,
    pub completed_assignments: usize,
}

impl From<&DashboardStats> for StatsResponse {
    fn from(s: &DashboardStats) -> Self {
        Self {
            conversation_count: s.conversation_count,
            average_progress: s.average_progress,
            pending_assignments: s.pending_assignments,
            completed_assignments: s.completed_assignments,
        }
    }
}

/// 仪表盘响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub user: UserResponse,
    pub profile: Option<ProfileResponse>,
    pub subjects: Vec<SubjectProgressResponse>,
    pub upcoming_assignments: Vec<AssignmentResponse>,
    pub recent_activity: Vec<ActivityResponse>,
    pub stats: StatsResponse,
}

impl From<&DashboardView> for DashboardResponse {
    fn from(view: &DashboardView) -> Self {
        Self {
            user: UserResponse::from(&view.user),
            profile: view.profile.as_ref().map(ProfileResponse::from),
            subjects: view.subjects.iter().map(SubjectProgressResponse::from).collect(),
            upcoming_assignments: view
                .upcoming_assignments
                .iter()
                .map(AssignmentResponse::from)
                .collect(),
            recent_activity: view.recent_activity.iter().map(ActivityResponse::from).collect(),
            stats: StatsResponse::from(&view.stats),
        }
    }
}

/// 更新进度请求
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub student_id: Option<String>,
    pub subject: Option<String>,
    /// 百分比，接受数字或数字字符串，小数四舍五入
    pub progress: Option<serde_json::Value>,
    pub grade: Option<String>,
}

impl UpdateProgressRequest {
    pub fn into_input(self) -> Result<ProgressInput> {
        let missing = || AppError::Validation(MISSING_FIELDS_MESSAGE.to_string());
        Ok(ProgressInput {
            subject: non_empty(self.subject).ok_or_else(missing)?,
            progress: number_field(self.progress, "Progress")?
                .map(|p| p.round() as i64)
                .ok_or_else(missing)?,
            student_id: non_empty(self.student_id),
            grade: self.grade,
        })
    }
}

/// 布置作业请求
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub student_id: Option<String>,
    pub title: Option<String>,
    pub subject: Option<String>,
    /// YYYY-MM-DD
    pub due_date: Option<String>,
}

impl CreateAssignmentRequest {
    pub fn into_input(self) -> Result<AssignmentInput> {
        let missing = || AppError::Validation(MISSING_FIELDS_MESSAGE.to_string());
        let due_date = non_empty(self.due_date).ok_or_else(missing)?;
        let due_date = crate::api::dto::parse_date(&due_date)
            .ok_or_else(|| AppError::Validation(format!("Invalid due date: {}", due_date)))?;

        Ok(AssignmentInput {
            title: non_empty(self.title).ok_or_else(missing)?,
            subject: non_empty(self.subject).ok_or_else(missing)?,
            student_id: non_empty(self.student_id),
            due_date,
        })
    }
}

/// 更新作业状态请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAssignmentRequest {
    pub status: Option<String>,
}

impl UpdateAssignmentRequest {
    pub fn into_status(self) -> Result<AssignmentStatus> {
        non_empty(self.status)
            .ok_or_else(|| AppError::Validation(MISSING_FIELDS_MESSAGE.to_string()))?
            .parse()
            .map_err(AppError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_request_parsing() {
        let input = CreateAssignmentRequest {
            student_id: Some(" ".into()),
            title: Some("Essay".into()),
            subject: Some("English".into()),
            due_date: Some("2030-02-01".into()),
        }
        .into_input()
        .unwrap();
        assert_eq!(input.student_id, None);
        assert_eq!(input.due_date, NaiveDate::from_ymd_opt(2030, 2, 1).unwrap());

        let err = CreateAssignmentRequest {
            title: Some("Essay".into()),
            subject: Some("English".into()),
            due_date: Some("next week".into()),
            ..Default::default()
        }
        .into_input()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_progress_from_form_values() {
        let request = |progress: serde_json::Value| UpdateProgressRequest {
            subject: Some("Science".into()),
            progress: Some(progress),
            ..Default::default()
        };

        assert_eq!(request(serde_json::json!(85.5)).into_input().unwrap().progress, 86);
        assert_eq!(request(serde_json::json!("40")).into_input().unwrap().progress, 40);

        let err = request(serde_json::json!("most")).into_input().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Progress must be a number"));
        let err = request(serde_json::json!("")).into_input().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == MISSING_FIELDS_MESSAGE));
    }

    #[test]
    fn test_status_parsing() {
        let status = UpdateAssignmentRequest {
            status: Some("in-progress".into()),
        }
        .into_status()
        .unwrap();
        assert_eq!(status, AssignmentStatus::InProgress);

        assert!(UpdateAssignmentRequest { status: None }.into_status().is_err());
        assert!(UpdateAssignmentRequest {
            status: Some("done".into())
        }
        .into_status()
        .is_err());
    }
}
