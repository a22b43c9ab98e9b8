// 数据库模块
// 存储接口定义、Postgres 实现以及进程内实现

pub mod memory;
pub mod models;
pub mod repositories;

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

pub use memory::MemoryStore;
pub use repositories::{
    AccountRepository, PgStore, PostRepository, ProfileRepository,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("username already taken")]
    DuplicateUsername,
}

/// 应用使用的全部存储能力
pub trait Store: AccountRepository + PostRepository + ProfileRepository {}

impl<T> Store for T where T: AccountRepository + PostRepository + ProfileRepository {}

pub type SharedStore = Arc<dyn Store>;

pub async fn connect_pool(config: &Config) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.database_acquire_timeout())
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");
    Ok(pool)
}

/// 根据 DATABASE_URL 选择存储实现
pub async fn open_store(config: &Config) -> Result<SharedStore, StoreError> {
    if config.uses_memory_store() {
        tracing::warn!("Using in-memory store, data will not survive a restart");
        return Ok(Arc::new(MemoryStore::default()));
    }

    let pool = connect_pool(config).await?;
    Ok(Arc::new(PgStore::new(pool)))
}
