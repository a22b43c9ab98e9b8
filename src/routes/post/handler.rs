use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    routes::{JsonBody, PathParam},
    utils::success_to_api_response,
};

use super::model::{self, CommentInput, PostVariant};

pub async fn create<V: PostVariant>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(input), _): JsonBody<V::Input>,
) -> Result<impl IntoResponse, AppError> {
    let post = model::create_post::<V>(&state, user.account_id, input).await?;
    Ok((StatusCode::CREATED, success_to_api_response(post)))
}

pub async fn list<V: PostVariant>(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let posts = model::list_posts::<V>(&state).await?;
    Ok((StatusCode::OK, success_to_api_response(posts)))
}

pub async fn get_one<V: PostVariant>(
    State(state): State<AppState>,
    WithRejection(Path(id), _): PathParam<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let post = model::get_post::<V>(&state, id).await?;
    Ok((StatusCode::OK, success_to_api_response(post)))
}

pub async fn update<V: PostVariant>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): PathParam<Uuid>,
    WithRejection(Json(input), _): JsonBody<V::Input>,
) -> Result<impl IntoResponse, AppError> {
    let post = model::update_post::<V>(&state, user.account_id, id, input).await?;
    Ok((StatusCode::OK, success_to_api_response(post)))
}

pub async fn remove<V: PostVariant>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): PathParam<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    model::delete_post::<V>(&state, user.account_id, id).await?;
    Ok((StatusCode::OK, success_to_api_response(id)))
}

// 点赞与评论只对普通帖子开放

#[axum::debug_handler]
pub async fn like(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): PathParam<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let likes = model::like_post(&state, user.account_id, id).await?;
    Ok((StatusCode::OK, success_to_api_response(likes)))
}

#[axum::debug_handler]
pub async fn unlike(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): PathParam<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let likes = model::unlike_post(&state, user.account_id, id).await?;
    Ok((StatusCode::OK, success_to_api_response(likes)))
}

#[axum::debug_handler]
pub async fn comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): PathParam<Uuid>,
    WithRejection(Json(input), _): JsonBody<CommentInput>,
) -> Result<impl IntoResponse, AppError> {
    let comments = model::add_comment(&state, user.account_id, id, input).await?;
    Ok((StatusCode::CREATED, success_to_api_response(comments)))
}

#[axum::debug_handler]
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path((id, comment_id)), _): PathParam<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let comments = model::delete_comment(&state, user.account_id, id, comment_id).await?;
    Ok((StatusCode::OK, success_to_api_response(comments)))
}
