use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::auth::TokenError;
use crate::database::StoreError;
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub msg: String,
}

impl FieldError {
    pub fn new(field: &'static str, msg: impl Into<String>) -> Self {
        Self {
            field,
            msg: msg.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("username already taken")]
    DuplicateUsername,
    #[error("post already liked")]
    AlreadyLiked,
    #[error("post has not yet been liked")]
    NotLiked,
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("store error: {0}")]
    Store(StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        AppError::Internal(format!("{}: {}", context, err))
    }

    pub fn validation(errors: Vec<FieldError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredentials | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEmail
            | AppError::DuplicateUsername
            | AppError::AlreadyLiked
            | AppError::NotLiked => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> i32 {
        match self {
            AppError::Unauthorized => error_codes::UNAUTHORIZED,
            AppError::InvalidCredentials => error_codes::AUTH_FAILED,
            AppError::Forbidden => error_codes::PERMISSION_DENIED,
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::DuplicateEmail | AppError::DuplicateUsername => error_codes::USER_EXISTS,
            AppError::AlreadyLiked => error_codes::ALREADY_LIKED,
            AppError::NotLiked => error_codes::NOT_LIKED,
            AppError::Validation(_) => error_codes::VALIDATION_ERROR,
            AppError::Store(_) | AppError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::DuplicateUsername => AppError::DuplicateUsername,
            other => AppError::Store(other),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::Expired => AppError::Unauthorized,
            TokenError::Signing(e) => AppError::internal("sign token", e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(vec![FieldError::new("body", rejection.body_text())])
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path parameters: {}", rejection.body_text());
        AppError::NotFound("record")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        match self {
            AppError::Validation(errors) => (
                status,
                error_to_api_response(code, "validation failed".to_string(), Some(errors)),
            )
                .into_response(),
            AppError::Store(_) | AppError::Internal(_) => {
                // 内部细节只写日志，不返回给调用方
                tracing::error!("Request failed: {}", self);
                (
                    status,
                    error_to_api_response::<()>(code, "server error".to_string(), None),
                )
                    .into_response()
            }
            other => (
                status,
                error_to_api_response::<()>(code, other.to_string(), None),
            )
                .into_response(),
        }
    }
}
