use crate::config::config::{AppConfig, DEV_JWT_SECRET, DatabaseType};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "AI_TUTOR_";

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "AI_TUTOR_CONFIG";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 优先级（后者覆盖前者）：
    /// 1. 内置开发环境默认值
    /// 2. `AI_TUTOR_CONFIG` 指定的文件，或 ./ai-tutor.toml
    /// 3. `AI_TUTOR_` 前缀的环境变量，嵌套字段用 `__` 分隔
    pub fn load() -> Result<AppConfig, figment::Error> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        Self::load_from(path)
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        Self::figment(path).extract()
    }

    /// 先从文件与环境变量读出 `environment`，再以对应预设为默认值
    fn figment(path: PathBuf) -> Figment {
        let overrides = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"));
        let environment: String = overrides
            .extract_inner("environment")
            .unwrap_or_else(|_| "development".to_string());

        Figment::from(Serialized::defaults(AppConfig::for_environment(&environment)))
            .merge(overrides)
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.database.backend == DatabaseType::SurrealDB && config.database.url.is_empty() {
            return Err(ConfigValidationError::MissingDatabaseUrl);
        }

        if !(4..=31).contains(&config.security.bcrypt_cost) {
            return Err(ConfigValidationError::InvalidBcryptCost(
                config.security.bcrypt_cost,
            ));
        }

        if !config.is_development() {
            if config.security.jwt_secret.len() < 32 {
                return Err(ConfigValidationError::WeakJwtSecret);
            }
            if config.security.jwt_secret == DEV_JWT_SECRET {
                return Err(ConfigValidationError::DevJwtSecret);
            }
        }

        if config.server.request_timeout <= config.ai.timeout {
            return Err(ConfigValidationError::TimeoutOrder {
                server: config.server.request_timeout,
                ai: config.ai.timeout,
            });
        }

        match config.ai.backend.as_str() {
            "openai" => {
                if config.ai.base_url.is_empty() || config.ai.model.is_empty() {
                    return Err(ConfigValidationError::IncompleteAiConfig);
                }
            }
            "echo" => {}
            other => return Err(ConfigValidationError::UnknownAiBackend(other.to_string())),
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("server port must be greater than 0")]
    InvalidPort,

    #[error("database url is required for the surrealdb backend")]
    MissingDatabaseUrl,

    #[error("bcrypt cost must be between 4 and 31, got {0}")]
    InvalidBcryptCost(u32),

    #[error("jwt secret must be at least 32 characters outside development")]
    WeakJwtSecret,

    #[error("the built-in development jwt secret cannot be used outside development")]
    DevJwtSecret,

    #[error("the openai backend needs ai.base_url and ai.model")]
    IncompleteAiConfig,

    #[error("unknown ai backend: {0}")]
    UnknownAiBackend(String),

    #[error("server.request_timeout ({server}s) must be longer than ai.timeout ({ai}s)")]
    TimeoutOrder { server: u64, ai: u64 },
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("ai-tutor.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load_from("missing.toml".into())?;
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.database.backend, DatabaseType::Memory);
            assert_eq!(config.ai.max_tokens, 1000);
            assert!(config.security.allow_raw_user_id);
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "ai-tutor.toml",
                r#"
                    environment = "staging"

                    [server]
                    port = 9000

                    [ai]
                    backend = "openai"
                    model = "tutor-large"
                "#,
            )?;
            jail.set_env("AI_TUTOR_SERVER__PORT", "9100");
            jail.set_env("AI_TUTOR_SECURITY__BCRYPT_COST", "10");

            let config = ConfigLoader::load_from("ai-tutor.toml".into())?;
            assert_eq!(config.environment, "staging");
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.security.bcrypt_cost, 10);
            assert_eq!(config.ai.backend, "openai");
            assert_eq!(config.ai.model, "tutor-large");
            // 未覆盖的字段保留默认值
            assert_eq!(config.ai.temperature, 0.7);
            Ok(())
        });
    }

    #[test]
    fn test_production_environment_uses_production_preset() {
        Jail::expect_with(|jail| {
            jail.set_env("AI_TUTOR_ENVIRONMENT", "production");

            let config = ConfigLoader::load_from("missing.toml".into())?;
            assert_eq!(config.environment, "production");
            assert!(!config.security.allow_raw_user_id);
            assert!(config.security.jwt_secret.is_empty());
            assert_eq!(config.database.backend, DatabaseType::SurrealDB);
            assert!(matches!(
                ConfigLoader::validate(&config),
                Err(ConfigValidationError::WeakJwtSecret)
            ));

            jail.set_env("AI_TUTOR_SECURITY__JWT_SECRET", "a-production-secret-of-sufficient-length");
            let config = ConfigLoader::load_from("missing.toml".into())?;
            assert!(ConfigLoader::validate(&config).is_ok());
            Ok(())
        });
    }

    #[test]
    fn test_dev_secret_rejected_outside_development() {
        Jail::expect_with(|jail| {
            jail.create_file("ai-tutor.toml", r#"environment = "staging""#)?;

            let config = ConfigLoader::load_from("ai-tutor.toml".into())?;
            assert_eq!(config.security.jwt_secret, DEV_JWT_SECRET);
            assert!(matches!(
                ConfigLoader::validate(&config),
                Err(ConfigValidationError::DevJwtSecret)
            ));
            Ok(())
        });
    }

    #[test]
    fn test_validate() {
        let config = AppConfig::development();
        assert!(ConfigLoader::validate(&config).is_ok());

        let mut config = AppConfig::development();
        config.server.port = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPort)
        ));

        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 2;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidBcryptCost(2))
        ));

        let config = AppConfig::production();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::WeakJwtSecret)
        ));

        let mut config = AppConfig::development();
        config.server.request_timeout = config.ai.timeout;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::TimeoutOrder { server: 60, ai: 60 })
        ));

        let mut config = AppConfig::development();
        config.ai.backend = "carrier-pigeon".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::UnknownAiBackend(_))
        ));
    }
}
