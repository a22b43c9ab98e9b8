use std::env;
use std::time::Duration;

/// 默认令牌有效期（秒）
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 36000;

/// 令牌有效期上限：十年
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub bcrypt_cost: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub http_timeout_secs: u64,
    pub github_api_base: String,
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,
    pub admin_bootstrap: Option<AdminBootstrap>,
}

/// 首个管理员账号，仅在管理员表为空时写入
#[derive(Debug, Clone, serde::Deserialize)]
pub struct AdminBootstrap {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_expiration_secs = match optional("JWT_EXPIRATION") {
            Some(raw) => parse_duration_secs(&raw)
                .filter(|secs| *secs <= MAX_TOKEN_TTL_SECS)
                .ok_or(ConfigError::Invalid {
                    key: "JWT_EXPIRATION",
                    value: raw,
                })?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };

        let bcrypt_cost = match optional("BCRYPT_COST") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|c| (4..=31).contains(c))
                .ok_or(ConfigError::Invalid {
                    key: "BCRYPT_COST",
                    value: raw,
                })?,
            None => bcrypt::DEFAULT_COST,
        };

        let admin_bootstrap = match (
            optional("ADMIN_BOOTSTRAP_EMAIL"),
            optional("ADMIN_BOOTSTRAP_USERNAME"),
            optional("ADMIN_BOOTSTRAP_PASSWORD"),
        ) {
            (Some(email), Some(username), Some(password)) => Some(AdminBootstrap {
                name: optional("ADMIN_BOOTSTRAP_NAME").unwrap_or_else(|| username.clone()),
                email,
                username,
                password,
            }),
            _ => None,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            database_acquire_timeout_secs: optional("DATABASE_ACQUIRE_TIMEOUT")
                .and_then(|v| parse_duration_secs(&v))
                .unwrap_or(5),
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_secs,
            bcrypt_cost,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "::".into()),
            server_port: optional("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            api_base_uri: normalize_base_uri(
                optional("API_BASE_URI").as_deref().unwrap_or("/api"),
            ),
            http_timeout_secs: optional("HTTP_TIMEOUT")
                .and_then(|v| parse_duration_secs(&v))
                .unwrap_or(10),
            github_api_base: optional("GITHUB_API_BASE")
                .unwrap_or_else(|| "https://api.github.com".into())
                .trim_end_matches('/')
                .to_string(),
            github_client_id: optional("GITHUB_CLIENT_ID"),
            github_client_secret: optional("GITHUB_CLIENT_SECRET"),
            admin_bootstrap,
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn database_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.database_acquire_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// 内存存储模式，主要用于本地调试
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory://")
    }
}

/// 解析 "36000"、"10h"、"30m"、"45s" 形式的时长，返回秒数
pub fn parse_duration_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (idx, 'h') => (&raw[..idx], 3600),
        (idx, 'm') => (&raw[..idx], 60),
        (idx, 's') => (&raw[..idx], 1),
        _ => (raw, 1),
    };
    digits.trim().parse::<u64>().ok()?.checked_mul(unit)
}

fn normalize_base_uri(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/crewboard"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.jwt_expiration_secs, DEFAULT_TOKEN_TTL_SECS);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.api_base_uri, "/api");
        assert_eq!(config.server_port, 5000);
        assert!(config.admin_bootstrap.is_none());
        assert!(!config.uses_memory_store());
    }

    #[test]
    fn missing_secret_is_reported() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "memory://")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn token_lifetime_accepts_unit_suffixes() {
        assert_eq!(parse_duration_secs("36000"), Some(36000));
        assert_eq!(parse_duration_secs("10h"), Some(36000));
        assert_eq!(parse_duration_secs("15m"), Some(900));
        assert_eq!(parse_duration_secs(" 45s "), Some(45));
        assert_eq!(parse_duration_secs("soon"), None);
        assert_eq!(parse_duration_secs(""), None);
    }

    #[test]
    fn invalid_bcrypt_cost_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "secret"),
            ("BCRYPT_COST", "99"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BCRYPT_COST", .. }));
    }

    #[test]
    fn admin_bootstrap_requires_all_credentials() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "secret"),
            ("ADMIN_BOOTSTRAP_EMAIL", "boss@example.com"),
            ("ADMIN_BOOTSTRAP_USERNAME", "boss"),
            ("ADMIN_BOOTSTRAP_PASSWORD", "change-me-please"),
            ("API_BASE_URI", "v1/"),
        ]))
        .unwrap();

        let admin = config.admin_bootstrap.as_ref().unwrap();
        assert_eq!(admin.name, "boss");
        assert_eq!(config.api_base_uri, "/v1");
        assert!(config.uses_memory_store());
    }

    #[test]
    fn oversized_token_lifetime_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "secret"),
            ("JWT_EXPIRATION", "100000000000000000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "JWT_EXPIRATION", .. }));
    }
}
