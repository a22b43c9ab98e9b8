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

use super::model::{self, EducationRequest, ExperienceRequest, ProfileRequest};

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let profile = model::my_profile(&state, user.account_id).await?;
    Ok((StatusCode::OK, success_to_api_response(profile)))
}

#[axum::debug_handler]
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let profiles = model::list_profiles(&state).await?;
    Ok((StatusCode::OK, success_to_api_response(profiles)))
}

#[axum::debug_handler]
pub async fn by_account(
    State(state): State<AppState>,
    WithRejection(Path(account_id), _): PathParam<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let profile = model::profile_by_account(&state, account_id).await?;
    Ok((StatusCode::OK, success_to_api_response(profile)))
}

/// 创建或更新当前账号的资料
#[axum::debug_handler]
pub async fn upsert(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): JsonBody<ProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = model::upsert_profile(&state, user.account_id, req).await?;
    Ok((StatusCode::OK, success_to_api_response(profile)))
}

#[axum::debug_handler]
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    model::delete_profile_and_account(&state, user.account_id).await?;
    Ok((StatusCode::OK, success_to_api_response("User deleted")))
}

#[axum::debug_handler]
pub async fn add_experience(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): JsonBody<ExperienceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = model::add_experience(&state, user.account_id, req).await?;
    Ok((StatusCode::OK, success_to_api_response(profile)))
}

#[axum::debug_handler]
pub async fn remove_experience(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): PathParam<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let profile = model::remove_experience(&state, user.account_id, id).await?;
    Ok((StatusCode::OK, success_to_api_response(profile)))
}

#[axum::debug_handler]
pub async fn add_education(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): JsonBody<EducationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = model::add_education(&state, user.account_id, req).await?;
    Ok((StatusCode::OK, success_to_api_response(profile)))
}

#[axum::debug_handler]
pub async fn remove_education(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): PathParam<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let profile = model::remove_education(&state, user.account_id, id).await?;
    Ok((StatusCode::OK, success_to_api_response(profile)))
}

#[axum::debug_handler]
pub async fn github_repos(
    State(state): State<AppState>,
    WithRejection(Path(username), _): PathParam<String>,
) -> Result<impl IntoResponse, AppError> {
    let repos = model::github_repos(&state, &username).await?;
    Ok((StatusCode::OK, success_to_api_response(repos)))
}
