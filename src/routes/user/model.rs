use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    config::AdminBootstrap,
    database::models::{Account, AccountKind, NewAccount},
    error::{AppError, FieldError},
    utils::{avatar_url, hash_password, is_valid_email, verify_password},
};

pub const MIN_PASSWORD_LEN: usize = 10;

/// 用户名不存在时用来比对的哈希，让两种失败耗时相同
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

async fn check_password(
    password: String,
    hash: Option<String>,
    cost: u32,
) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            let dummy = DUMMY_HASH
                .get_or_init(|| hash_password("timing-equalizer", cost).unwrap_or_default());
            // 结果无意义，只为消耗同样的时间
            let _ = verify_password(&password, dummy);
            Ok(false)
        }
    })
    .await
    .map_err(|e| AppError::internal("verify password task", e))?
    .map_err(|e| AppError::internal("verify password", e))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if !is_valid_email(&self.email) {
            errors.push(FieldError::new(
                "email",
                "Please enter a unique and valid email address",
            ));
        }
        if !is_valid_username(&self.username) {
            errors.push(FieldError::new(
                "username",
                "Please enter a unique and valid username",
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("Please enter a password with {} or more characters", MIN_PASSWORD_LEN),
            ));
        }
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !is_valid_username(&self.username) {
            errors.push(FieldError::new(
                "username",
                "Please enter a unique and valid username",
            ));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Please enter a password"));
        }
        errors
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

fn is_valid_username(username: &str) -> bool {
    !username.is_empty() && username.chars().all(|c| c.is_ascii() && !c.is_ascii_whitespace())
}

/// 注册账号：校验、哈希密码、写入对应的账号表
pub async fn register_account(
    state: &AppState,
    kind: AccountKind,
    req: RegisterRequest,
) -> Result<Account, AppError> {
    AppError::validation(req.validate())?;

    let cost = state.config.bcrypt_cost;
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::internal("hash password task", e))?
        .map_err(|e| AppError::internal("hash password", e))?;

    let email = req.email.trim().to_lowercase();
    let account = state
        .store
        .insert_account(
            kind,
            NewAccount {
                name: req.name.trim().to_string(),
                avatar: Some(avatar_url(&email)),
                email,
                username: req.username,
                password_hash,
            },
        )
        .await?;

    Ok(account)
}

/// 用户名不存在与密码错误返回同一个错误，避免泄露用户名是否存在
pub async fn authenticate(
    state: &AppState,
    kind: AccountKind,
    req: LoginRequest,
) -> Result<Account, AppError> {
    AppError::validation(req.validate())?;

    let cost = state.config.bcrypt_cost;
    let Some(account) = state
        .store
        .find_account_by_username(kind, &req.username)
        .await?
    else {
        check_password(req.password, None, cost).await?;
        tracing::debug!("Login failed for unknown {:?} username", kind);
        return Err(AppError::InvalidCredentials);
    };

    let matches =
        check_password(req.password, Some(account.password_hash.clone()), cost).await?;
    if !matches {
        tracing::debug!("Login failed for account {}", account.id);
        return Err(AppError::InvalidCredentials);
    }

    Ok(account)
}

pub fn issue_token(state: &AppState, account_id: Uuid) -> Result<TokenResponse, AppError> {
    let issued = state.tokens.issue(account_id)?;
    Ok(TokenResponse {
        token: issued.token,
    })
}

/// 令牌里的账号可能已被删除，此时按未认证处理
pub async fn current_account(state: &AppState, account_id: Uuid) -> Result<Account, AppError> {
    state
        .store
        .find_any_account(account_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

pub async fn require_admin(state: &AppState, account_id: Uuid) -> Result<Account, AppError> {
    state
        .store
        .find_account(AccountKind::Admin, account_id)
        .await?
        .ok_or(AppError::Forbidden)
}

/// 管理员表为空时写入配置里的首个管理员
pub async fn bootstrap_admin(state: &AppState, admin: &AdminBootstrap) -> Result<(), AppError> {
    if state.store.count_accounts(AccountKind::Admin).await? > 0 {
        return Ok(());
    }

    let account = register_account(
        state,
        AccountKind::Admin,
        RegisterRequest {
            name: admin.name.clone(),
            email: admin.email.clone(),
            username: admin.username.clone(),
            password: admin.password.clone(),
        },
    )
    .await?;

    tracing::info!("Bootstrap admin {} created ({})", account.username, account.id);
    Ok(())
}
