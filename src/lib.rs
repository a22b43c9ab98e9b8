use std::sync::Arc;

use config::Config;
use database::SharedStore;

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod utils;

use auth::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub tokens: Arc<TokenService>,
    pub config: Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, store: SharedStore) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!("crewboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            store,
            tokens: Arc::new(TokenService::from_config(&config)),
            config,
            http,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::{
        AppState,
        config::Config,
        database::{MemoryStore, models::{Account, AccountKind, NewAccount}},
    };

    pub fn memory_state() -> AppState {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("memory://".into()),
            "JWT_SECRET" => Some("unit-test-secret".into()),
            "BCRYPT_COST" => Some("4".into()),
            _ => None,
        })
        .unwrap();
        AppState::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    /// 直接写入账号，跳过密码哈希
    pub async fn seed_account(state: &AppState, kind: AccountKind, username: &str) -> Account {
        state
            .store
            .insert_account(
                kind,
                NewAccount {
                    name: username.to_uppercase(),
                    email: format!("{}@example.com", username),
                    username: username.into(),
                    password_hash: "not-a-hash".into(),
                    avatar: None,
                },
            )
            .await
            .unwrap()
    }
}
