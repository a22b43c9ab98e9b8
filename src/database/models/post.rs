use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AuthorSnapshot;
use crate::auth::Owned;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Generic,
    Inventory,
    Recipe,
}

impl PostKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PostKind::Generic => "generic",
            PostKind::Inventory => "inventory",
            PostKind::Recipe => "recipe",
        }
    }
}

/// 帖子正文，三种帖子只在这里不同
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostBody {
    Generic { text: String },
    Inventory { item: String },
    Recipe { title: String, recipe: String },
}

impl PostBody {
    pub fn kind(&self) -> PostKind {
        match self {
            PostBody::Generic { .. } => PostKind::Generic,
            PostBody::Inventory { .. } => PostKind::Inventory,
            PostBody::Recipe { .. } => PostKind::Recipe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub username: String,
    pub avatar: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Owned for Comment {
    const RESOURCE: &'static str = "comment";

    fn owner_id(&self) -> &Uuid {
        &self.account_id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub owner_account_id: Uuid,
    pub name: String,
    pub username: String,
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub body: PostBody,
    /// 最新的在前，每个账号最多一条
    pub likes: Vec<Like>,
    /// 最新的在前
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn kind(&self) -> PostKind {
        self.body.kind()
    }
}

impl Owned for Post {
    const RESOURCE: &'static str = "post";

    fn owner_id(&self) -> &Uuid {
        &self.owner_account_id
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub owner_account_id: Uuid,
    pub author: AuthorSnapshot,
    pub body: PostBody,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub account_id: Uuid,
    pub author: AuthorSnapshot,
    pub text: String,
}

/// 点赞/取消点赞的结果，由存储层原子地判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeChange {
    Applied(Vec<Like>),
    Unchanged,
    PostMissing,
}
