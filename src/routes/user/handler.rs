use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState,
    auth::AuthUser,
    database::models::AccountKind,
    error::AppError,
    routes::JsonBody,
    utils::success_to_api_response,
};

use super::model::{
    LoginRequest, RegisterRequest, authenticate, current_account, issue_token, register_account,
    require_admin,
};

/// 注册普通用户，成功后直接返回令牌
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = register_account(&state, AccountKind::User, req).await?;
    let token = issue_token(&state, account.id)?;
    Ok((StatusCode::CREATED, success_to_api_response(token)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = authenticate(&state, AccountKind::User, req).await?;
    let token = issue_token(&state, account.id)?;
    Ok((StatusCode::OK, success_to_api_response(token)))
}

#[axum::debug_handler]
pub async fn admin_login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = authenticate(&state, AccountKind::Admin, req).await?;
    let token = issue_token(&state, account.id)?;
    Ok((StatusCode::OK, success_to_api_response(token)))
}

/// 当前登录账号（不含密码哈希）
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let account = current_account(&state, user.account_id).await?;
    Ok((StatusCode::OK, success_to_api_response(account)))
}

/// 只有管理员可以创建新的管理员
#[axum::debug_handler]
pub async fn register_admin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let caller = require_admin(&state, user.account_id).await?;
    let account = register_account(&state, AccountKind::Admin, req).await?;
    tracing::info!("Admin {} registered admin {}", caller.id, account.id);
    Ok((StatusCode::CREATED, success_to_api_response(account)))
}
