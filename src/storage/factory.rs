//! 存储工厂模块
//!
//! 根据配置创建相应的数据库存储实例。

use crate::config::config::{DatabaseConfig, DatabaseType};
use crate::error::{AppError, Result};
use crate::storage::memory::MemoryStore;
use crate::storage::repository::Repositories;
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "surrealdb")]
use crate::storage::{surreal_repository::SurrealRepository, surrealdb::SurrealPool};

/// 存储工厂
pub struct StorageFactory;

impl StorageFactory {
    /// 根据配置创建仓储集合
    pub async fn create(config: &DatabaseConfig) -> Result<Repositories> {
        match config.backend {
            DatabaseType::Memory => {
                info!("Using in-memory storage; data is lost on restart");
                Ok(Self::memory())
            }
            #[cfg(feature = "surrealdb")]
            DatabaseType::SurrealDB => {
                let pool = SurrealPool::new(config.clone())
                    .await
                    .map_err(|e| AppError::Connection(e.to_string()))?;
                Ok(Repositories::from_backend(Arc::new(SurrealRepository::new(
                    pool,
                ))))
            }
            #[cfg(not(feature = "surrealdb"))]
            DatabaseType::SurrealDB => Err(AppError::Config(
                "SurrealDB feature is not enabled. Enable 'surrealdb' feature to use SurrealDB."
                    .into(),
            )),
        }
    }

    /// 创建内存仓储集合
    pub fn memory() -> Repositories {
        Repositories::from_backend(Arc::new(MemoryStore::new()))
    }
}
