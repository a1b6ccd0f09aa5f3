use crate::config::config::DatabaseConfig;
use crate::error::Result;
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tracing::info;

/// 表结构与唯一索引
const SCHEMA: &str = "
    DEFINE INDEX IF NOT EXISTS user_email_unique ON TABLE user FIELDS email UNIQUE;
    DEFINE INDEX IF NOT EXISTS conversation_user ON TABLE conversation FIELDS user_id;
    DEFINE INDEX IF NOT EXISTS message_conversation ON TABLE message FIELDS conversation_id;
    DEFINE INDEX IF NOT EXISTS progress_student_subject ON TABLE progress FIELDS student_id, subject_key UNIQUE;
    DEFINE INDEX IF NOT EXISTS assignment_student ON TABLE assignment FIELDS student_id;
";

/// SurrealDB 连接
///
/// `Surreal<Any>` 内部已是共享连接，克隆开销很小。
#[derive(Clone)]
pub struct SurrealPool {
    /// 数据库连接
    db: Surreal<Any>,
    /// 连接配置
    config: DatabaseConfig,
}

impl SurrealPool {
    /// 建立连接并初始化索引
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let db: Surreal<Any> = connect(&config.url).await?;

        // 嵌入式引擎（mem://、rocksdb://）不需要登录
        if !config.username.is_empty() {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await?;
        }

        // 选择命名空间和数据库
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        let pool = Self { db, config };
        pool.init_schema().await?;
        info!(
            "Connected to SurrealDB at {} ({}/{})",
            pool.config.url, pool.config.namespace, pool.config.database
        );
        Ok(pool)
    }

    /// 创建索引（幂等）
    async fn init_schema(&self) -> Result<()> {
        self.db.query(SCHEMA).await?.check()?;
        Ok(())
    }

    /// 获取内部数据库实例
    pub fn inner(&self) -> Surreal<Any> {
        self.db.clone()
    }

    /// 健康检查
    pub async fn health(&self) -> Result<()> {
        self.db.health().await?;
        Ok(())
    }
}
