use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::PgStore;
use crate::database::StoreError;
use crate::database::models::{Account, AccountKind, AccountRow, NewAccount};

/// 账号存储：users 与 admins 两张表，邮箱与用户名在各自表内唯一
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with `DuplicateEmail` / `DuplicateUsername` when either is taken in that store.
    async fn insert_account(
        &self,
        kind: AccountKind,
        account: NewAccount,
    ) -> Result<Account, StoreError>;

    async fn find_account(&self, kind: AccountKind, id: Uuid)
    -> Result<Option<Account>, StoreError>;

    async fn find_account_by_username(
        &self,
        kind: AccountKind,
        username: &str,
    ) -> Result<Option<Account>, StoreError>;

    async fn count_accounts(&self, kind: AccountKind) -> Result<i64, StoreError>;

    async fn delete_account(&self, kind: AccountKind, id: Uuid) -> Result<bool, StoreError>;

    /// 先查普通用户，再查管理员
    async fn find_any_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        if let Some(user) = self.find_account(AccountKind::User, id).await? {
            return Ok(Some(user));
        }
        self.find_account(AccountKind::Admin, id).await
    }
}

/// 将唯一约束冲突翻译成具体的重复字段
fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(c) if c.ends_with("_email_key") => return StoreError::DuplicateEmail,
                Some(c) if c.ends_with("_username_key") => return StoreError::DuplicateUsername,
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl AccountRepository for PgStore {
    async fn insert_account(
        &self,
        kind: AccountKind,
        account: NewAccount,
    ) -> Result<Account, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {} (id, name, email, username, password_hash, avatar, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, email, username, password_hash, avatar, created_at
            "#,
            kind.table()
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.username)
            .bind(&account.password_hash)
            .bind(&account.avatar)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        tracing::info!("Created {:?} account {}", kind, row.id);
        Ok(row.into_account(kind))
    }

    async fn find_account(
        &self,
        kind: AccountKind,
        id: Uuid,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            "SELECT id, name, email, username, password_hash, avatar, created_at FROM {} WHERE id = $1",
            kind.table()
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_account(kind)))
    }

    async fn find_account_by_username(
        &self,
        kind: AccountKind,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            "SELECT id, name, email, username, password_hash, avatar, created_at FROM {} WHERE username = $1",
            kind.table()
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_account(kind)))
    }

    async fn count_accounts(&self, kind: AccountKind) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn delete_account(&self, kind: AccountKind, id: Uuid) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
