use serde::{Deserialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
    AppState,
    auth::ensure_owner,
    database::models::{
        Account, Comment, Like, LikeChange, NewComment, NewPost, Post, PostBody, PostKind,
    },
    error::{AppError, FieldError},
};

/// 一种帖子资源：决定帖子类型、谁能发帖、请求体怎样变成正文
pub trait PostVariant: Send + Sync + 'static {
    const KIND: PostKind;

    /// 只有管理员可以创建
    const ADMIN_ONLY: bool;

    type Input: DeserializeOwned + Send + 'static;

    fn into_body(input: Self::Input) -> Result<PostBody, AppError>;
}

pub struct GenericPosts;
pub struct InventoryPosts;
pub struct RecipePosts;

#[derive(Debug, Deserialize)]
pub struct GenericPostInput {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct InventoryPostInput {
    #[serde(default)]
    pub item: String,
}

#[derive(Debug, Deserialize)]
pub struct RecipePostInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub recipe: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub text: String,
}

fn required(field: &'static str, value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{} is required", field)));
    }
}

impl PostVariant for GenericPosts {
    const KIND: PostKind = PostKind::Generic;
    const ADMIN_ONLY: bool = false;
    type Input = GenericPostInput;

    fn into_body(input: Self::Input) -> Result<PostBody, AppError> {
        let mut errors = Vec::new();
        required("text", &input.text, &mut errors);
        AppError::validation(errors)?;
        Ok(PostBody::Generic { text: input.text })
    }
}

impl PostVariant for InventoryPosts {
    const KIND: PostKind = PostKind::Inventory;
    const ADMIN_ONLY: bool = true;
    type Input = InventoryPostInput;

    fn into_body(input: Self::Input) -> Result<PostBody, AppError> {
        let mut errors = Vec::new();
        required("item", &input.item, &mut errors);
        AppError::validation(errors)?;
        Ok(PostBody::Inventory { item: input.item })
    }
}

impl PostVariant for RecipePosts {
    const KIND: PostKind = PostKind::Recipe;
    const ADMIN_ONLY: bool = true;
    type Input = RecipePostInput;

    fn into_body(input: Self::Input) -> Result<PostBody, AppError> {
        let mut errors = Vec::new();
        required("title", &input.title, &mut errors);
        required("recipe", &input.recipe, &mut errors);
        AppError::validation(errors)?;
        Ok(PostBody::Recipe {
            title: input.title,
            recipe: input.recipe,
        })
    }
}

async fn caller_account(state: &AppState, caller: Uuid) -> Result<Account, AppError> {
    state
        .store
        .find_any_account(caller)
        .await?
        .ok_or(AppError::Unauthorized)
}

pub async fn create_post<V: PostVariant>(
    state: &AppState,
    caller: Uuid,
    input: V::Input,
) -> Result<Post, AppError> {
    let account = caller_account(state, caller).await?;
    if V::ADMIN_ONLY && !account.is_admin() {
        tracing::debug!("Account {} may not create {} posts", caller, V::KIND.as_str());
        return Err(AppError::Forbidden);
    }

    let body = V::into_body(input)?;
    let post = state
        .store
        .insert_post(NewPost {
            owner_account_id: account.id,
            author: account.snapshot(),
            body,
        })
        .await?;
    Ok(post)
}

pub async fn list_posts<V: PostVariant>(state: &AppState) -> Result<Vec<Post>, AppError> {
    Ok(state.store.list_posts(V::KIND).await?)
}

pub async fn get_post<V: PostVariant>(state: &AppState, id: Uuid) -> Result<Post, AppError> {
    state
        .store
        .find_post(V::KIND, id)
        .await?
        .ok_or(AppError::NotFound("post"))
}

pub async fn update_post<V: PostVariant>(
    state: &AppState,
    caller: Uuid,
    id: Uuid,
    input: V::Input,
) -> Result<Post, AppError> {
    let existing = state.store.find_post(V::KIND, id).await?;
    ensure_owner(existing, &caller)?;

    let body = V::into_body(input)?;
    state
        .store
        .update_post_body(V::KIND, id, body)
        .await?
        .ok_or(AppError::NotFound("post"))
}

pub async fn delete_post<V: PostVariant>(
    state: &AppState,
    caller: Uuid,
    id: Uuid,
) -> Result<(), AppError> {
    let existing = state.store.find_post(V::KIND, id).await?;
    ensure_owner(existing, &caller)?;

    if !state.store.delete_post(V::KIND, id).await? {
        return Err(AppError::NotFound("post"));
    }
    tracing::info!("Account {} deleted {} post {}", caller, V::KIND.as_str(), id);
    Ok(())
}

pub async fn like_post(state: &AppState, caller: Uuid, post_id: Uuid) -> Result<Vec<Like>, AppError> {
    match state.store.add_like(post_id, caller).await? {
        LikeChange::Applied(likes) => Ok(likes),
        LikeChange::Unchanged => Err(AppError::AlreadyLiked),
        LikeChange::PostMissing => Err(AppError::NotFound("post")),
    }
}

pub async fn unlike_post(
    state: &AppState,
    caller: Uuid,
    post_id: Uuid,
) -> Result<Vec<Like>, AppError> {
    match state.store.remove_like(post_id, caller).await? {
        LikeChange::Applied(likes) => Ok(likes),
        LikeChange::Unchanged => Err(AppError::NotLiked),
        LikeChange::PostMissing => Err(AppError::NotFound("post")),
    }
}

pub async fn add_comment(
    state: &AppState,
    caller: Uuid,
    post_id: Uuid,
    input: CommentInput,
) -> Result<Vec<Comment>, AppError> {
    let mut errors = Vec::new();
    required("text", &input.text, &mut errors);
    AppError::validation(errors)?;

    let account = caller_account(state, caller).await?;
    state
        .store
        .add_comment(
            post_id,
            NewComment {
                account_id: account.id,
                author: account.snapshot(),
                text: input.text,
            },
        )
        .await?
        .ok_or(AppError::NotFound("post"))
}

pub async fn delete_comment(
    state: &AppState,
    caller: Uuid,
    post_id: Uuid,
    comment_id: Uuid,
) -> Result<Vec<Comment>, AppError> {
    let post = get_post::<GenericPosts>(state, post_id).await?;
    let comment = post.comments.into_iter().find(|c| c.id == comment_id);
    ensure_owner(comment, &caller)?;

    state
        .store
        .remove_comment(post_id, comment_id)
        .await?
        .ok_or(AppError::NotFound("comment"))
}
