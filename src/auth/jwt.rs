use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{config::JwtConfig, state::AppState};

/// Identity carried by an access token. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    fn new(
        user_id: i64,
        email: &str,
        username: &str,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        let now = now.unix_timestamp();
        let exp = now
            .checked_add(ttl.whole_seconds())
            .ok_or(TokenError::TtlOutOfRange)?;
        Ok(Self {
            user_id,
            email: email.to_string(),
            username: username.to_string(),
            iat: now,
            nbf: now,
            exp,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("token lifetime out of range")]
    TtlOutOfRange,
    #[error(transparent)]
    Signing(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::SignatureInvalid,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            _ => Self::Malformed,
        }
    }
}

/// HS256 keys plus the token lifetime. Built once at startup and shared read-only.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(cfg.secret.as_bytes(), Duration::minutes(cfg.ttl_minutes))
    }

    pub fn issue(&self, user_id: i64, email: &str, username: &str) -> Result<String, TokenError> {
        self.issue_with_ttl(user_id, email, username, self.ttl)
    }

    pub fn issue_with_ttl(
        &self,
        user_id: i64,
        email: &str,
        username: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, email, username, OffsetDateTime::now_utc(), ttl)?;
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(user_id = claims.user_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Signature first, then `nbf <= now <= exp` with no leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}
