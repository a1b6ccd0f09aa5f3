//! 账户服务
//!
//! 注册、登录与当前用户查询。

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{
    GradeLevel, ParentProfile, StudentProfile, TeacherProfile, User, UserProfile, UserRole,
    normalize_email,
};
use crate::security::auth::{IssuedToken, TokenService};
use crate::security::password::{hash_password, verify_password};
use crate::storage::repository::{ProfileRepository, Repositories, UserRepository};

/// 登录失败时的统一消息，不区分邮箱不存在与密码错误
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// 邮箱不存在时用于校验的占位密码，使两种失败耗时相同
const DUMMY_PASSWORD: &str = "ai-tutor-timing-placeholder";

/// 用户不存在
pub const USER_NOT_FOUND_MESSAGE: &str = "User not found";

/// 注册参数（已完成必填与枚举解析）
#[derive(Debug, Clone, Validate)]
pub struct NewAccount {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,
    pub role: UserRole,
    pub grade_level: Option<GradeLevel>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub specialization: Option<String>,
    pub experience: Option<u32>,
    pub qualification: Option<String>,
    pub occupation: Option<String>,
}

impl NewAccount {
    /// 只含必填字段的注册参数
    pub fn new(email: &str, password: &str, name: &str, role: UserRole) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            role,
            grade_level: None,
            date_of_birth: None,
            phone: None,
            address: None,
            specialization: None,
            experience: None,
            qualification: None,
            occupation: None,
        }
    }

    /// 根据角色生成档案；管理员没有档案
    fn profile_for(&self, user_id: &str) -> Option<UserProfile> {
        match self.role {
            UserRole::Student => self
                .grade_level
                .map(|grade| UserProfile::Student(StudentProfile::new(user_id, grade))),
            UserRole::Teacher => {
                let mut profile = TeacherProfile::new(user_id);
                profile.specialization = self.specialization.clone();
                profile.experience = self.experience;
                profile.qualification = self.qualification.clone();
                Some(UserProfile::Teacher(profile))
            }
            UserRole::Parent => {
                let mut profile = ParentProfile::new(user_id);
                profile.occupation = self.occupation.clone();
                Some(UserProfile::Parent(profile))
            }
            UserRole::Admin => None,
        }
    }
}

/// 登录结果
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: IssuedToken,
}

/// 账户服务 trait
#[async_trait]
pub trait AccountService: Send + Sync {
    /// 注册新用户并创建角色档案
    async fn register(&self, account: NewAccount) -> Result<User>;

    /// 邮箱密码登录
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome>;

    /// 根据 ID 获取用户，不存在时返回 NotFound
    async fn get_user(&self, id: &str) -> Result<User>;

    /// 获取用户的角色档案
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;
}

/// 账户服务实现
pub struct AccountServiceImpl {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    tokens: Arc<TokenService>,
    bcrypt_cost: u32,
    /// 与真实哈希同代价的占位哈希，首次需要时生成
    dummy_hash: OnceCell<String>,
}

impl AccountServiceImpl {
    /// 创建新的服务实例
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        tokens: Arc<TokenService>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            profiles,
            tokens,
            bcrypt_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    async fn dummy_hash(&self) -> Result<&str> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password(DUMMY_PASSWORD, self.bcrypt_cost))
            .await?;
        Ok(hash.as_str())
    }
}

#[async_trait]
impl AccountService for AccountServiceImpl {
    async fn register(&self, mut account: NewAccount) -> Result<User> {
        account.email = normalize_email(&account.email);
        account.validate()?;

        // 写入前完成全部校验，失败的注册不会留下无档案的用户
        if account.role == UserRole::Student && account.grade_level.is_none() {
            return Err(AppError::Validation(
                "Grade level is required for students".to_string(),
            ));
        }

        if self.users.get_by_email(&account.email).await?.is_some() {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&account.password, self.bcrypt_cost).await?;

        let mut user = User::new(&account.email, password_hash, &account.name, account.role);
        user.date_of_birth = account.date_of_birth;
        user.phone = account.phone.clone();
        user.address = account.address.clone();

        let user = self.users.create(&user).await?;

        if let Some(profile) = account.profile_for(&user.id) {
            if let Err(e) = self.profiles.create(&profile).await {
                warn!("Profile creation failed for {}, removing user: {}", user.id, e);
                self.users.delete(&user.id).await?;
                return Err(e);
            }
        }

        info!("Registered user {} with role {}", user.id, user.role);
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let invalid = || AppError::Authentication(INVALID_CREDENTIALS_MESSAGE.to_string());

        let Some(user) = self.users.get_by_email(&normalize_email(email)).await? else {
            verify_password(password, self.dummy_hash().await?).await?;
            return Err(invalid());
        };

        if !verify_password(password, &user.password_hash).await? {
            return Err(invalid());
        }

        let token = self.tokens.issue(&user)?;
        info!("User {} logged in", user.id);
        Ok(LoginOutcome { user, token })
    }

    async fn get_user(&self, id: &str) -> Result<User> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND_MESSAGE.to_string()))
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.profiles.get_by_user_id(user_id).await
    }
}

/// 创建账户服务
pub fn create_account_service(
    repositories: &Repositories,
    tokens: Arc<TokenService>,
    bcrypt_cost: u32,
) -> Box<dyn AccountService> {
    Box::new(AccountServiceImpl::new(
        repositories.users.clone(),
        repositories.profiles.clone(),
        tokens,
        bcrypt_cost,
    ))
}
