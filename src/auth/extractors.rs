use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::jwt::{JwtKeys, TokenError};
use crate::error::AppError;

/// Identity of the caller, established by [`authorize`]. The only trusted
/// source of a user id for ownership-scoped operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub username: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header required")]
    MissingHeader,
    #[error("Bearer token required")]
    MissingScheme,
    #[error("Invalid token")]
    InvalidToken(#[source] TokenError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Header -> scheme -> token -> claims. Any failure ends the request.
pub fn authorize(headers: &HeaderMap, keys: &JwtKeys) -> Result<AuthUser, AuthError> {
    let result = check(headers, keys);
    if let Err(e) = &result {
        match e {
            AuthError::InvalidToken(reason) => warn!(reason = %reason, "rejected bearer token"),
            other => warn!(reason = %other, "rejected request without bearer token"),
        }
    }
    result
}

fn check(headers: &HeaderMap, keys: &JwtKeys) -> Result<AuthUser, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingHeader)?;

    let token = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .ok_or(AuthError::MissingScheme)?;

    let claims = keys.verify(token.trim()).map_err(AuthError::InvalidToken)?;

    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.email,
        username: claims.username,
    })
}

/// Route layer for every protected route: runs the gate before any handler
/// and leaves the identity in the request extensions.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authorize(req.headers(), &keys)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        // no layer in front of this route; run the gate here
        let keys = JwtKeys::from_ref(state);
        let user = authorize(&parts.headers, &keys)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use axum::{
        body::Body,
        extract::State,
        http::{HeaderValue, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use time::Duration;
    use tower::ServiceExt;

    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new(b"gate-secret", Duration::hours(1))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_or_empty_header() {
        assert!(matches!(
            authorize(&HeaderMap::new(), &keys()),
            Err(AuthError::MissingHeader)
        ));
        assert!(matches!(
            authorize(&headers_with(""), &keys()),
            Err(AuthError::MissingHeader)
        ));
    }

    #[test]
    fn header_without_bearer_scheme() {
        let token = keys().issue(1, "a@x.com", "alice").unwrap();
        for value in [token.as_str(), "Basic dXNlcjpwYXNz", "Token abc"] {
            assert!(matches!(
                authorize(&headers_with(value), &keys()),
                Err(AuthError::MissingScheme)
            ));
        }
    }

    #[test]
    fn bad_tokens_are_invalid() {
        assert!(matches!(
            authorize(&headers_with("Bearer nope"), &keys()),
            Err(AuthError::InvalidToken(TokenError::Malformed))
        ));
        let foreign = JwtKeys::new(b"other", Duration::hours(1))
            .issue(1, "a@x.com", "alice")
            .unwrap();
        assert!(matches!(
            authorize(&headers_with(&format!("Bearer {foreign}")), &keys()),
            Err(AuthError::InvalidToken(TokenError::SignatureInvalid))
        ));
        let expired = keys()
            .issue_with_ttl(1, "a@x.com", "alice", Duration::seconds(-1))
            .unwrap();
        assert!(matches!(
            authorize(&headers_with(&format!("Bearer {expired}")), &keys()),
            Err(AuthError::InvalidToken(TokenError::Expired))
        ));
    }

    #[test]
    fn valid_token_yields_identity() {
        let token = keys().issue(42, "a@x.com", "alice").unwrap();
        let user = authorize(&headers_with(&format!("Bearer {token}")), &keys()).unwrap();
        assert_eq!(
            user,
            AuthUser {
                user_id: 42,
                email: "a@x.com".into(),
                username: "alice".into(),
            }
        );
    }

    #[derive(Clone)]
    struct GateState {
        keys: JwtKeys,
        hits: Arc<AtomicUsize>,
    }

    impl FromRef<GateState> for JwtKeys {
        fn from_ref(state: &GateState) -> Self {
            state.keys.clone()
        }
    }

    async fn whoami(State(state): State<GateState>, user: AuthUser) -> String {
        state.hits.fetch_add(1, Ordering::SeqCst);
        user.username
    }

    fn gated_app(state: GateState, with_layer: bool) -> Router {
        let router = Router::new().route("/whoami", get(whoami));
        let router = if with_layer {
            router.route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        } else {
            router
        };
        router.with_state(state)
    }

    async fn call(app: Router, auth: Option<String>) -> (StatusCode, String) {
        let mut req = Request::builder().uri("/whoami");
        if let Some(value) = auth {
            req = req.header(AUTHORIZATION, value);
        }
        let res = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn failed_gate_never_reaches_handler() {
        for with_layer in [true, false] {
            let state = GateState {
                keys: keys(),
                hits: Arc::new(AtomicUsize::new(0)),
            };
            let app = gated_app(state.clone(), with_layer);

            let (status, body) = call(app.clone(), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(body.contains("Authorization header required"));

            let (status, body) = call(app.clone(), Some("Bearer junk".into())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(body.contains("Invalid token"));

            assert_eq!(state.hits.load(Ordering::SeqCst), 0);

            let token = keys().issue(5, "c@x.com", "carol").unwrap();
            let (status, body) = call(app, Some(format!("Bearer {token}"))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "carol");
            assert_eq!(state.hits.load(Ordering::SeqCst), 1);
        }
    }
}
