use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 用户角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// 学生
    Student,
    /// 教师
    Teacher,
    /// 家长
    Parent,
    /// 管理员
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "STUDENT",
            UserRole::Teacher => "TEACHER",
            UserRole::Parent => "PARENT",
            UserRole::Admin => "ADMIN",
        }
    }

    /// 是否可以替其他学生管理进度与作业
    pub fn can_manage_students(&self) -> bool {
        !matches!(self, UserRole::Student)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(UserRole::Student),
            "TEACHER" => Ok(UserRole::Teacher),
            "PARENT" => Ok(UserRole::Parent),
            "ADMIN" => Ok(UserRole::Admin),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

/// 用户实体
///
/// `password_hash` 只存在于存储层，对外响应一律经过 DTO 转换去除。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// 用户唯一标识
    pub id: String,
    /// 邮箱（小写，唯一）
    pub email: String,
    /// bcrypt 哈希
    pub password_hash: String,
    /// 姓名
    pub name: String,
    /// 角色
    pub role: UserRole,
    /// 头像地址
    pub avatar: Option<String>,
    /// 出生日期
    pub date_of_birth: Option<NaiveDate>,
    /// 电话
    pub phone: Option<String>,
    /// 地址
    pub address: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 创建新用户
    pub fn new(email: &str, password_hash: String, name: &str, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash,
            name: name.trim().to_string(),
            role,
            avatar: None,
            date_of_birth: None,
            phone: None,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 姓名首字母，用于头像占位
    pub fn initials(&self) -> String {
        let initials: String = self
            .name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials.to_uppercase()
        }
    }
}

/// 邮箱规范化：去除首尾空白并转为小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation_normalizes_email() {
        let user = User::new("  Asha.Rao@Example.COM ", "hash".into(), " Asha Rao ", UserRole::Student);
        assert_eq!(user.email, "asha.rao@example.com");
        assert_eq!(user.name, "Asha Rao");
        assert_eq!(user.created_at, user.updated_at);
        assert!(!user.id.is_empty());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Student, UserRole::Teacher, UserRole::Parent, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
            assert_eq!(
                serde_json::to_value(role).unwrap(),
                serde_json::Value::String(role.as_str().to_string())
            );
        }
        assert!("student".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_initials() {
        let user = User::new("a@b.in", String::new(), "Ravi kumar Singh", UserRole::Parent);
        assert_eq!(user.initials(), "RKS");

        let user = User::new("a@b.in", String::new(), "", UserRole::Parent);
        assert_eq!(user.initials(), "U");
    }
}
