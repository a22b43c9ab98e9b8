#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use crewboard::{
    AppState,
    config::Config,
    database::MemoryStore,
    routes::{self, user::model::bootstrap_admin},
};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";
pub const ADMIN_USERNAME: &str = "root";
pub const ADMIN_PASSWORD: &str = "root-password-123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

fn test_config() -> Config {
    Config::from_lookup(|key| {
        let value = match key {
            "DATABASE_URL" => "memory://",
            "JWT_SECRET" => SECRET,
            "BCRYPT_COST" => "4",
            "ADMIN_BOOTSTRAP_NAME" => "Root",
            "ADMIN_BOOTSTRAP_EMAIL" => "root@example.com",
            "ADMIN_BOOTSTRAP_USERNAME" => ADMIN_USERNAME,
            "ADMIN_BOOTSTRAP_PASSWORD" => ADMIN_PASSWORD,
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap()
}

pub async fn spawn_app() -> TestApp {
    let state = AppState::new(test_config(), Arc::new(MemoryStore::new())).unwrap();
    let admin = state.config.admin_bootstrap.clone().unwrap();
    bootstrap_admin(&state, &admin).await.unwrap();

    TestApp {
        router: routes::create_router(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// 注册普通用户并返回令牌
    pub async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/users",
                None,
                Some(serde_json::json!({
                    "name": username.to_uppercase(),
                    "email": format!("{}@example.com", username),
                    "username": username,
                    "password": "correct-horse-battery",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["resp_data"]["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/admin",
                None,
                Some(serde_json::json!({
                    "username": ADMIN_USERNAME,
                    "password": ADMIN_PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["resp_data"]["token"].as_str().unwrap().to_string()
    }

    pub async fn account_id(&self, token: &str) -> String {
        let (status, body) = self.send(Method::GET, "/api/auth", Some(token), None).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["resp_data"]["id"].as_str().unwrap().to_string()
    }
}
