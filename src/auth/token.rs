use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 账号ID
    pub iat: i64,    // 签发时间
    pub exp: i64,    // 过期时间
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(skip)]
    pub expires_at: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies HS256 bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: std::time::Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 过期即失效，不留宽限
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: i64::try_from(ttl.as_secs())
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.jwt_secret, config.jwt_expiration())
    }

    pub fn issue(&self, account_id: Uuid) -> Result<IssuedToken, TokenError> {
        self.issue_at(account_id, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        account_id: Uuid,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .timestamp();

        let claims = Claims {
            sub: account_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;

        tracing::debug!("Issued token for account {}, expires at {}", account_id, expires_at);
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, std::time::Duration::from_secs(36000))
    }

    #[test]
    fn issued_token_verifies_to_its_account() {
        let tokens = service("test-secret");
        let account = Uuid::new_v4();

        let issued = tokens.issue(account).unwrap();
        assert!(!issued.token.is_empty());
        assert!(issued.expires_at - Utc::now().timestamp() > 35990);
        assert_eq!(tokens.verify(&issued.token).unwrap(), account);
    }

    #[test]
    fn token_for_one_account_never_verifies_as_another() {
        let tokens = service("test-secret");
        for _ in 0..16 {
            let a = Uuid::new_v4();
            let b = Uuid::new_v4();
            let token = tokens.issue(a).unwrap().token;
            let resolved = tokens.verify(&token).unwrap();
            assert_eq!(resolved, a);
            assert_ne!(resolved, b);
        }
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let tokens = service("test-secret");
        let long_ago = Utc::now() - Duration::seconds(36000 + 5);
        let issued = tokens.issue_at(Uuid::new_v4(), long_ago).unwrap();

        assert!(matches!(tokens.verify(&issued.token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let ours = service("secret-one");
        let theirs = service("secret-two");
        let token = theirs.issue(Uuid::new_v4()).unwrap().token;

        assert!(matches!(ours.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let tokens = service("test-secret");
        let token = tokens.issue(Uuid::new_v4()).unwrap().token;
        let other = tokens.issue(Uuid::new_v4()).unwrap().token;

        // 用另一个令牌的载荷替换，签名不再匹配
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(matches!(tokens.verify(&forged), Err(TokenError::Invalid)));
    }

    #[test]
    fn garbage_is_invalid() {
        let tokens = service("test-secret");
        assert!(matches!(tokens.verify("not.a.token"), Err(TokenError::Invalid)));
        assert!(matches!(tokens.verify(""), Err(TokenError::Invalid)));
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        let tokens = service("test-secret");
        let claims = Claims {
            sub: "admin".into(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 60,
        };
        let token = encode(&Header::default(), &claims, &tokens.encoding).unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn huge_lifetime_saturates_instead_of_panicking() {
        let tokens = TokenService::new("test-secret", std::time::Duration::from_secs(u64::MAX));
        let account = Uuid::new_v4();
        let issued = tokens.issue(account).unwrap();
        assert!(issued.expires_at > Utc::now().timestamp());

        let tokens =
            TokenService::new("test-secret", std::time::Duration::from_secs(100_000_000_000_000_000));
        assert!(tokens.issue(account).is_ok());
    }
}
