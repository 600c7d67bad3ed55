use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{config::JwtConfig, state::AppState};

/// Scope tag embedded in every token. A single shared secret signs both
/// kinds, so the scope check is what keeps a refresh token from being
/// replayed where an access token is expected.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    #[serde(rename = "access_token")]
    Access,
    #[serde(rename = "refresh_token")]
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // subject: user email
    pub exp: usize,
    pub iat: usize,
    pub scope: TokenScope,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        // Only HMAC algorithms make sense with a shared secret.
        let algorithm = match cfg.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => {
                warn!(algorithm = %other, "unsupported signing algorithm, falling back to HS256");
                Algorithm::HS256
            }
        };
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm,
            access_ttl: Duration::from_secs((cfg.access_ttl_minutes.max(0) as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_days.max(0) as u64) * 24 * 3600),
        }
    }

    fn sign_with_scope(&self, subject: &str, scope: TokenScope) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match scope {
            TokenScope::Access => self.access_ttl,
            TokenScope::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            scope,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(subject = %subject, scope = ?scope, "jwt signed");
        Ok(token)
    }

    pub fn issue_access(&self, subject: &str) -> anyhow::Result<String> {
        self.sign_with_scope(subject, TokenScope::Access)
    }

    pub fn issue_refresh(&self, subject: &str) -> anyhow::Result<String> {
        self.sign_with_scope(subject, TokenScope::Refresh)
    }

    /// Validates signature and expiration, then checks that the embedded
    /// scope matches what the call site expects. Returns the subject email.
    pub fn verify(&self, token: &str, expected: TokenScope) -> Result<String, TokenError> {
        let validation = Validation::new(self.algorithm);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        if data.claims.scope != expected {
            return Err(TokenError::Invalid);
        }
        if data.claims.sub.is_empty() {
            return Err(TokenError::Invalid);
        }
        debug!(subject = %data.claims.sub, scope = ?data.claims.scope, "jwt verified");
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_config(&test_config().jwt)
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys();
        let token = keys.issue_access("alice@example.com").expect("sign access");
        let subject = keys.verify(&token, TokenScope::Access).expect("verify");
        assert_eq!(subject, "alice@example.com");
    }

    #[test]
    fn sign_and_verify_refresh_token() {
        let keys = make_keys();
        let token = keys.issue_refresh("bob@example.com").expect("sign refresh");
        let subject = keys.verify(&token, TokenScope::Refresh).expect("verify");
        assert_eq!(subject, "bob@example.com");
    }

    #[test]
    fn refresh_token_rejected_where_access_expected() {
        let keys = make_keys();
        let token = keys.issue_refresh("alice@example.com").expect("sign refresh");
        let err = keys.verify(&token, TokenScope::Access).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn access_token_rejected_where_refresh_expected() {
        let keys = make_keys();
        let token = keys.issue_access("alice@example.com").expect("sign access");
        let err = keys.verify(&token, TokenScope::Refresh).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn expired_token_fails_with_expired() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: "alice@example.com".into(),
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize, // past the default leeway
            scope: TokenScope::Access,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(test_config().jwt.secret.as_bytes()),
        )
        .expect("encode");
        let err = keys.verify(&token, TokenScope::Access).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn garbage_token_is_invalid() {
        let keys = make_keys();
        let err = keys.verify("not-a-jwt", TokenScope::Access).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let keys = make_keys();
        let mut cfg = test_config().jwt;
        cfg.secret = "another-secret".into();
        let other = JwtKeys::from_config(&cfg);
        let token = other.issue_access("alice@example.com").expect("sign");
        let err = keys.verify(&token, TokenScope::Access).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn empty_subject_is_invalid() {
        let keys = make_keys();
        let token = keys.issue_access("").expect("sign");
        let err = keys.verify(&token, TokenScope::Access).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn unsupported_algorithm_falls_back_to_hs256() {
        let mut cfg = test_config().jwt;
        cfg.algorithm = "RS256".into();
        let keys = JwtKeys::from_config(&cfg);
        let token = keys.issue_access("alice@example.com").expect("sign");
        assert!(keys.verify(&token, TokenScope::Access).is_ok());
    }
}
