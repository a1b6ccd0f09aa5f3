use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 存储后端类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// 进程内存储（开发与测试）
    #[default]
    Memory,
    /// SurrealDB
    SurrealDB,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 存储后端
    #[serde(alias = "type")]
    pub backend: DatabaseType,
    /// SurrealDB 连接地址（如 `http://localhost:8000`、`mem://`、`rocksdb://data`）
    pub url: String,
    /// 命名空间
    pub namespace: String,
    /// 数据库名称
    pub database: String,
    /// 用户名（为空时不登录，适用于嵌入式引擎）
    pub username: String,
    /// 密码
    pub password: String,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒），须大于 `ai.timeout`，AI 超时才能以 JSON 错误返回
    pub request_timeout: u64,
    /// 最大请求体大小（字节）
    pub max_request_size: usize,
    /// CORS 允许的来源
    pub cors_allowed_origins: Vec<String>,
}

/// AI 补全服务配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AiConfig {
    /// 后端类型: "openai" 或 "echo"
    pub backend: String,
    /// OpenAI 兼容接口地址（不含 `/chat/completions`）
    pub base_url: String,
    /// API 密钥
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// 采样温度
    pub temperature: f32,
    /// 最大生成 token 数
    pub max_tokens: u32,
    /// 请求超时（秒）
    pub timeout: u64,
}

/// 安全配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// JWT 签名密钥
    pub jwt_secret: String,
    /// JWT 签发者
    pub jwt_issuer: String,
    /// JWT 受众
    pub jwt_audience: String,
    /// JWT 有效期（秒）
    pub jwt_expiry_seconds: u64,
    /// bcrypt 代价因子
    pub bcrypt_cost: u32,
    /// 允许 `Authorization: Bearer <user id>` 形式的原始用户 ID
    pub allow_raw_user_id: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

/// 开发环境内置的 JWT 密钥，其他环境禁止使用
pub const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-min-32-chars";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 服务器配置
    pub server: ServerConfig,
    /// AI 配置
    pub ai: AiConfig,
    /// 安全配置
    pub security: SecurityConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            database: DatabaseConfig {
                backend: DatabaseType::Memory,
                url: "http://localhost:8000".into(),
                namespace: "ai_tutor".into(),
                database: "homeschool".into(),
                username: "root".into(),
                password: "root".into(),
            },
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8080,
                request_timeout: 90,
                max_request_size: 1024 * 1024,
                cors_allowed_origins: vec!["http://localhost:3000".into()],
            },
            ai: AiConfig {
                backend: "echo".into(),
                base_url: "https://api.openai.com/v1".into(),
                api_key: String::new(),
                model: "gpt-4o-mini".into(),
                temperature: 0.7,
                max_tokens: 1000,
                timeout: 60,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.into(),
                jwt_issuer: "ai-tutor".into(),
                jwt_audience: "ai-tutor-api".into(),
                jwt_expiry_seconds: 7 * 24 * 3600,
                bcrypt_cost: 12,
                allow_raw_user_id: true,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
            },
            app_name: "ai-tutor".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.database.backend = DatabaseType::SurrealDB;
        config.ai.backend = "openai".into();
        config.security.jwt_secret = String::new();
        config.security.allow_raw_user_id = false;
        config
    }

    /// 按环境名选择预设，`production` 之外都以开发预设为基础
    pub fn for_environment(environment: &str) -> Self {
        match environment {
            "production" => Self::production(),
            other => {
                let mut config = Self::development();
                config.environment = other.to_string();
                config
            }
        }
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
