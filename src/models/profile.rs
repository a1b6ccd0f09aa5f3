//! 角色档案
//!
//! 学生、教师、家长各自的附加信息，与用户一对一关联。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 年级（印度开放学校体系）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GradeLevel {
    #[serde(rename = "PRIMARY_1")]
    Primary1,
    #[serde(rename = "PRIMARY_2")]
    Primary2,
    #[serde(rename = "PRIMARY_3")]
    Primary3,
    #[serde(rename = "PRIMARY_4")]
    Primary4,
    #[serde(rename = "PRIMARY_5")]
    Primary5,
    #[serde(rename = "SECONDARY_6")]
    Secondary6,
    #[serde(rename = "SECONDARY_7")]
    Secondary7,
    #[serde(rename = "SECONDARY_8")]
    Secondary8,
    #[serde(rename = "SECONDARY_9")]
    Secondary9,
    #[serde(rename = "SECONDARY_10")]
    Secondary10,
    #[serde(rename = "HIGHER_SECONDARY_11")]
    HigherSecondary11,
    #[serde(rename = "HIGHER_SECONDARY_12")]
    HigherSecondary12,
}

impl GradeLevel {
    pub const ALL: [GradeLevel; 12] = [
        GradeLevel::Primary1,
        GradeLevel::Primary2,
        GradeLevel::Primary3,
        GradeLevel::Primary4,
        GradeLevel::Primary5,
        GradeLevel::Secondary6,
        GradeLevel::Secondary7,
        GradeLevel::Secondary8,
        GradeLevel::Secondary9,
        GradeLevel::Secondary10,
        GradeLevel::HigherSecondary11,
        GradeLevel::HigherSecondary12,
    ];

    /// 枚举代码，如 `SECONDARY_8`
    pub fn code(&self) -> &'static str {
        match self {
            GradeLevel::Primary1 => "PRIMARY_1",
            GradeLevel::Primary2 => "PRIMARY_2",
            GradeLevel::Primary3 => "PRIMARY_3",
            GradeLevel::Primary4 => "PRIMARY_4",
            GradeLevel::Primary5 => "PRIMARY_5",
            GradeLevel::Secondary6 => "SECONDARY_6",
            GradeLevel::Secondary7 => "SECONDARY_7",
            GradeLevel::Secondary8 => "SECONDARY_8",
            GradeLevel::Secondary9 => "SECONDARY_9",
            GradeLevel::Secondary10 => "SECONDARY_10",
            GradeLevel::HigherSecondary11 => "HIGHER_SECONDARY_11",
            GradeLevel::HigherSecondary12 => "HIGHER_SECONDARY_12",
        }
    }

    /// 展示名称，如 `Secondary 8`
    pub fn label(&self) -> &'static str {
        match self {
            GradeLevel::Primary1 => "Primary 1",
            GradeLevel::Primary2 => "Primary 2",
            GradeLevel::Primary3 => "Primary 3",
            GradeLevel::Primary4 => "Primary 4",
            GradeLevel::Primary5 => "Primary 5",
            GradeLevel::Secondary6 => "Secondary 6",
            GradeLevel::Secondary7 => "Secondary 7",
            GradeLevel::Secondary8 => "Secondary 8",
            GradeLevel::Secondary9 => "Secondary 9",
            GradeLevel::Secondary10 => "Secondary 10",
            GradeLevel::HigherSecondary11 => "Higher Secondary 11",
            GradeLevel::HigherSecondary12 => "Higher Secondary 12",
        }
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GradeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradeLevel::ALL
            .into_iter()
            .find(|g| g.code() == s)
            .ok_or_else(|| format!("Invalid grade level: {}", s))
    }
}

/// 学生档案
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentProfile {
    pub id: String,
    pub user_id: String,
    pub grade_level: GradeLevel,
    pub created_at: DateTime<Utc>,
}

impl StudentProfile {
    pub fn new(user_id: &str, grade_level: GradeLevel) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            grade_level,
            created_at: Utc::now(),
        }
    }
}

/// 教师档案
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TeacherProfile {
    pub id: String,
    pub user_id: String,
    /// 专业方向
    pub specialization: Option<String>,
    /// 教龄（年）
    pub experience: Option<u32>,
    /// 学历资质
    pub qualification: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TeacherProfile {
    pub fn new(user_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            ..Default::default()
        }
    }
}

/// 家长档案
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ParentProfile {
    pub id: String,
    pub user_id: String,
    /// 职业
    pub occupation: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ParentProfile {
    pub fn new(user_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            ..Default::default()
        }
    }
}

/// 用户的角色档案
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UserProfile {
    Student(StudentProfile),
    Teacher(TeacherProfile),
    Parent(ParentProfile),
}

impl UserProfile {
    pub fn user_id(&self) -> &str {
        match self {
            UserProfile::Student(p) => &p.user_id,
            UserProfile::Teacher(p) => &p.user_id,
            UserProfile::Parent(p) => &p.user_id,
        }
    }

    pub fn grade_level(&self) -> Option<GradeLevel> {
        match self {
            UserProfile::Student(p) => Some(p.grade_level),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("PRIMARY_1", GradeLevel::Primary1, "Primary 1")]
    #[case("SECONDARY_8", GradeLevel::Secondary8, "Secondary 8")]
    #[case("HIGHER_SECONDARY_12", GradeLevel::HigherSecondary12, "Higher Secondary 12")]
    fn test_grade_level_codes(#[case] code: &str, #[case] grade: GradeLevel, #[case] label: &str) {
        assert_eq!(code.parse::<GradeLevel>().unwrap(), grade);
        assert_eq!(grade.code(), code);
        assert_eq!(grade.label(), label);
        assert_eq!(serde_json::to_value(grade).unwrap(), code);
    }

    #[test]
    fn test_unknown_grade_level() {
        assert!("GRADE_13".parse::<GradeLevel>().is_err());
        assert!("primary_1".parse::<GradeLevel>().is_err());
    }

    #[test]
    fn test_profile_accessors() {
        let student = UserProfile::Student(StudentProfile::new("u1", GradeLevel::Secondary9));
        assert_eq!(student.user_id(), "u1");
        assert_eq!(student.grade_level(), Some(GradeLevel::Secondary9));

        let parent = UserProfile::Parent(ParentProfile::new("u2"));
        assert_eq!(parent.grade_level(), None);
    }
}
