use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, types::Json};
use uuid::Uuid;

use super::PgStore;
use crate::database::StoreError;
use crate::database::models::{
    Comment, Like, LikeChange, NewComment, NewPost, Post, PostBody, PostKind,
};

/// 帖子存储，三种帖子共用；点赞与评论只用于普通帖子
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn find_post(&self, kind: PostKind, id: Uuid) -> Result<Option<Post>, StoreError>;

    /// Newest first.
    async fn list_posts(&self, kind: PostKind) -> Result<Vec<Post>, StoreError>;

    /// Replaces the body; the owner never changes. `None` when the post is gone.
    async fn update_post_body(
        &self,
        kind: PostKind,
        id: Uuid,
        body: PostBody,
    ) -> Result<Option<Post>, StoreError>;

    async fn delete_post(&self, kind: PostKind, id: Uuid) -> Result<bool, StoreError>;

    /// Atomically adds `account_id` to the like set of a generic post.
    async fn add_like(&self, post_id: Uuid, account_id: Uuid) -> Result<LikeChange, StoreError>;

    /// Atomically removes `account_id` from the like set of a generic post.
    async fn remove_like(&self, post_id: Uuid, account_id: Uuid)
    -> Result<LikeChange, StoreError>;

    /// `None` when the generic post does not exist.
    async fn add_comment(
        &self,
        post_id: Uuid,
        comment: NewComment,
    ) -> Result<Option<Vec<Comment>>, StoreError>;

    /// `None` when the comment is not under that post.
    async fn remove_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Vec<Comment>>, StoreError>;
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    owner_account_id: Uuid,
    name: String,
    username: String,
    avatar: Option<String>,
    body: Json<PostBody>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl PostRow {
    fn into_post(self, likes: Vec<Like>, comments: Vec<Comment>) -> Post {
        Post {
            id: self.id,
            owner_account_id: self.owner_account_id,
            name: self.name,
            username: self.username,
            avatar: self.avatar,
            body: self.body.0,
            likes,
            comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LikeRow {
    post_id: Uuid,
    account_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CommentRow {
    post_id: Uuid,
    #[sqlx(flatten)]
    comment: Comment,
}

const POST_COLUMNS: &str =
    "id, owner_account_id, name, username, avatar, body, created_at, updated_at";

async fn load_likes<'e>(
    executor: impl PgExecutor<'e>,
    post_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Like>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LikeRow>(
        r#"
        SELECT post_id, account_id, created_at
        FROM post_likes
        WHERE post_id = ANY($1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(post_ids)
    .fetch_all(executor)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Like>> = HashMap::new();
    for row in rows {
        grouped.entry(row.post_id).or_default().push(Like {
            account_id: row.account_id,
            created_at: row.created_at,
        });
    }
    Ok(grouped)
}

async fn load_comments<'e>(
    executor: impl PgExecutor<'e>,
    post_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Comment>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT post_id, id, account_id, name, username, avatar, text, created_at
        FROM post_comments
        WHERE post_id = ANY($1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(post_ids)
    .fetch_all(executor)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for row in rows {
        grouped.entry(row.post_id).or_default().push(row.comment);
    }
    Ok(grouped)
}

impl PgStore {
    async fn hydrate(&self, rows: Vec<PostRow>) -> Result<Vec<Post>, StoreError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut likes = load_likes(&self.pool, &ids).await?;
        let mut comments = load_comments(&self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let l = likes.remove(&row.id).unwrap_or_default();
                let c = comments.remove(&row.id).unwrap_or_default();
                row.into_post(l, c)
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let kind = post.body.kind();
        let sql = format!(
            r#"
            INSERT INTO posts (id, kind, owner_account_id, name, username, avatar, body, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {POST_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(kind.as_str())
            .bind(post.owner_account_id)
            .bind(&post.author.name)
            .bind(&post.author.username)
            .bind(&post.author.avatar)
            .bind(Json(&post.body))
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Created {} post {}", kind.as_str(), row.id);
        Ok(row.into_post(Vec::new(), Vec::new()))
    }

    async fn find_post(&self, kind: PostKind, id: Uuid) -> Result<Option<Post>, StoreError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND kind = $2");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_posts(&self, kind: PostKind) -> Result<Vec<Post>, StoreError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE kind = $1 ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    async fn update_post_body(
        &self,
        kind: PostKind,
        id: Uuid,
        body: PostBody,
    ) -> Result<Option<Post>, StoreError> {
        let sql = format!(
            r#"
            UPDATE posts
            SET body = $1, updated_at = $2
            WHERE id = $3 AND kind = $4
            RETURNING {POST_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Json(&body))
            .bind(Utc::now())
            .bind(id)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn delete_post(&self, kind: PostKind, id: Uuid) -> Result<bool, StoreError> {
        // 点赞和评论通过外键级联删除
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND kind = $2")
            .bind(id)
            .bind(kind.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_like(&self, post_id: Uuid, account_id: Uuid) -> Result<LikeChange, StoreError> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE 保证事务期间帖子不会被删除
        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 AND kind = 'generic' FOR SHARE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(LikeChange::PostMissing);
        }

        // 主键 (post_id, account_id) 保证同一账号只能有一条
        let inserted = sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, account_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, account_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(account_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(LikeChange::Unchanged);
        }

        let likes = load_likes(&mut *tx, &[post_id])
            .await?
            .remove(&post_id)
            .unwrap_or_default();
        tx.commit().await?;
        Ok(LikeChange::Applied(likes))
    }

    async fn remove_like(
        &self,
        post_id: Uuid,
        account_id: Uuid,
    ) -> Result<LikeChange, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 AND kind = 'generic' FOR SHARE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(LikeChange::PostMissing);
        }

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND account_id = $2")
            .bind(post_id)
            .bind(account_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Ok(LikeChange::Unchanged);
        }

        let likes = load_likes(&mut *tx, &[post_id])
            .await?
            .remove(&post_id)
            .unwrap_or_default();
        tx.commit().await?;
        Ok(LikeChange::Applied(likes))
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        comment: NewComment,
    ) -> Result<Option<Vec<Comment>>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 AND kind = 'generic' FOR SHARE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO post_comments (id, post_id, account_id, name, username, avatar, text, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(comment.account_id)
        .bind(&comment.author.name)
        .bind(&comment.author.username)
        .bind(&comment.author.avatar)
        .bind(&comment.text)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let comments = load_comments(&mut *tx, &[post_id])
            .await?
            .remove(&post_id)
            .unwrap_or_default();
        tx.commit().await?;
        Ok(Some(comments))
    }

    async fn remove_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Vec<Comment>>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM post_comments WHERE id = $1 AND post_id = $2")
            .bind(comment_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Ok(None);
        }

        let comments = load_comments(&mut *tx, &[post_id])
            .await?
            .remove(&post_id)
            .unwrap_or_default();
        tx.commit().await?;
        Ok(Some(comments))
    }
}
