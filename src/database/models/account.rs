use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 账号类型，对应两张独立的账号表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    User,
    Admin,
}

impl AccountKind {
    pub fn table(self) -> &'static str {
        match self {
            AccountKind::User => "users",
            AccountKind::Admin => "admins",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub kind: AccountKind,
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.kind == AccountKind::Admin
    }

    pub fn snapshot(&self) -> AuthorSnapshot {
        AuthorSnapshot {
            name: self.name.clone(),
            username: self.username.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// 账号表行，账号类型由所在的表决定
#[derive(Debug, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AccountRow {
    pub fn into_account(self, kind: AccountKind) -> Account {
        Account {
            id: self.id,
            kind,
            name: self.name,
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            avatar: self.avatar,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub avatar: Option<String>,
}

/// Author fields copied onto posts and comments when they are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub name: String,
    pub username: String,
    pub avatar: Option<String>,
}
