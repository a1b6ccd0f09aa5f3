//! 账户 DTO
//!
//! 注册、登录与当前用户的请求和响应数据结构。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::dto::{MISSING_FIELDS_MESSAGE, non_empty, number_field, parse_date};
use crate::error::{AppError, Result};
use crate::models::{GradeLevel, User, UserProfile, UserRole};
use crate::services::NewAccount;

/// 注册请求
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub grade_level: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// 教师专业方向
    pub specialization: Option<String>,
    /// 教师教龄，表单可能以字符串提交
    pub experience: Option<serde_json::Value>,
    /// 教师学历
    pub qualification: Option<String>,
    /// 家长职业
    pub occupation: Option<String>,
}

impl RegisterRequest {
    /// 检查必填字段并解析枚举与日期
    pub fn into_new_account(self) -> Result<NewAccount> {
        let missing = || AppError::Validation(MISSING_FIELDS_MESSAGE.to_string());
        let email = non_empty(self.email).ok_or_else(missing)?;
        let name = non_empty(self.name).ok_or_else(missing)?;
        let role = non_empty(self.role).ok_or_else(missing)?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(missing)?;

        let role: UserRole = role.parse().map_err(AppError::Validation)?;
        let grade_level = non_empty(self.grade_level)
            .map(|g| g.parse::<GradeLevel>())
            .transpose()
            .map_err(AppError::Validation)?;
        let experience = number_field(self.experience, "Experience")?
            .map(|years| {
                if years < 0.0 || years.fract() != 0.0 || years > f64::from(u32::MAX) {
                    Err(AppError::Validation(
                        "Experience must be a whole number of years".to_string(),
                    ))
                } else {
                    Ok(years as u32)
                }
            })
            .transpose()?;
        let date_of_birth = non_empty(self.date_of_birth)
            .map(|d| {
                parse_date(&d)
                    .ok_or_else(|| AppError::Validation(format!("Invalid date of birth: {}", d)))
            })
            .transpose()?;

        let mut account = NewAccount::new(&email, &password, &name, role);
        account.grade_level = grade_level;
        account.date_of_birth = date_of_birth;
        account.phone = non_empty(self.phone);
        account.address = non_empty(self.address);
        account.specialization = non_empty(self.specialization);
        account.experience = experience;
        account.qualification = non_empty(self.qualification);
        account.occupation = non_empty(self.occupation);
        Ok(account)
    }
}

/// 用户响应，不含密码哈希
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub initials: String,
    pub avatar: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            initials: user.initials(),
            avatar: user.avatar.clone(),
            date_of_birth: user.date_of_birth,
            phone: user.phone.clone(),
            address: user.address.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// 角色档案响应
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// student / teacher / parent
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<GradeLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
}

impl From<&UserProfile> for ProfileResponse {
    fn from(profile: &UserProfile) -> Self {
        let empty = |kind: &str| Self {
            kind: kind.to_string(),
            grade_level: None,
            grade_label: None,
            specialization: None,
            experience: None,
            qualification: None,
            occupation: None,
        };

        match profile {
            UserProfile::Student(p) => Self {
                grade_level: Some(p.grade_level),
                grade_label: Some(p.grade_level.label().to_string()),
                ..empty("student")
            },
            UserProfile::Teacher(p) => Self {
                specialization: p.specialization.clone(),
                experience: p.experience,
                qualification: p.qualification.clone(),
                ..empty("teacher")
            },
            UserProfile::Parent(p) => Self {
                occupation: p.occupation.clone(),
                ..empty("parent")
            },
        }
    }
}

/// 注册响应
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// 登录请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// 登录响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// 当前用户响应
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub profile: Option<ProfileResponse>,
}
