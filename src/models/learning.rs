//! 学习进度与作业
//!
//! 仪表盘展示的学科进度和待办作业。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// 学科进度（每个学生每个学科一条）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectProgress {
    pub id: String,
    pub student_id: String,
    pub subject: String,
    /// 完成百分比 0-100
    pub progress: u8,
    /// 等级，如 "A"
    pub grade: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SubjectProgress {
    pub fn new(student_id: &str, subject: &str, progress: u8, grade: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            subject: subject.trim().to_string(),
            progress: progress.min(100),
            grade,
            updated_at: Utc::now(),
        }
    }
}

/// 作业状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentStatus {
    Pending,
    InProgress,
    Completed,
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AssignmentStatus::Pending),
            "in-progress" => Ok(AssignmentStatus::InProgress),
            "completed" => Ok(AssignmentStatus::Completed),
            other => Err(format!("Invalid assignment status: {}", other)),
        }
    }
}

/// 作业
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: String,
    pub student_id: String,
    pub title: String,
    pub subject: String,
    pub due_date: NaiveDate,
    pub status: AssignmentStatus,
    /// 布置者用户 ID
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(
        student_id: &str,
        title: &str,
        subject: &str,
        due_date: NaiveDate,
        created_by: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            title: title.trim().to_string(),
            subject: subject.trim().to_string(),
            due_date,
            status: AssignmentStatus::Pending,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        }
    }

    /// 学生本人或布置者可见
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.student_id == user_id || self.created_by == user_id
    }

    pub fn is_open(&self) -> bool {
        self.status != AssignmentStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_capped() {
        let p = SubjectProgress::new("s1", " Mathematics ", 140, Some("A".into()));
        assert_eq!(p.progress, 100);
        assert_eq!(p.subject, "Mathematics");
    }

    #[test]
    fn test_assignment_status_wire_format() {
        assert_eq!(
            serde_json::to_value(AssignmentStatus::InProgress).unwrap(),
            "in-progress"
        );
        assert_eq!(
            "completed".parse::<AssignmentStatus>().unwrap(),
            AssignmentStatus::Completed
        );
        assert!("done".parse::<AssignmentStatus>().is_err());
    }

    #[test]
    fn test_assignment_visibility() {
        let due = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let a = Assignment::new("student", "Algebra Homework", "Mathematics", due, "teacher");
        assert!(a.is_visible_to("student"));
        assert!(a.is_visible_to("teacher"));
        assert!(!a.is_visible_to("someone-else"));
        assert!(a.is_open());
    }
}
