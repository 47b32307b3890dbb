use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    password::{hash_password, verify_password},
};
use crate::{
    error::AppError,
    state::AppState,
    users::repo::{NewUser, User},
    validation::require_non_negative,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    if !is_valid_email(&req.email) {
        return Err(AppError::validation("Invalid email"));
    }
    let username_len = req.username.chars().count();
    if !(3..=50).contains(&username_len) {
        return Err(AppError::validation(
            "username must be between 3 and 50 characters",
        ));
    }
    if req.password.chars().count() < 6 {
        return Err(AppError::validation(
            "password must be at least 6 characters",
        ));
    }
    require_non_negative("year", req.year)?;
    Ok(())
}

/// A user plus a freshly minted access token.
pub struct Session {
    pub user: User,
    pub token: String,
}

fn open_session(st: &AppState, user: User) -> Result<Session, AppError> {
    let token = st
        .keys
        .issue(user.id, &user.email, &user.username)
        .map_err(AppError::TokenSigning)?;
    Ok(Session { user, token })
}

pub async fn register(st: &AppState, mut req: RegisterRequest) -> Result<Session, AppError> {
    req.email = normalize_email(&req.email);
    req.username = req.username.trim().to_string();
    validate_registration(&req)?;

    // best effort; the unique indexes settle races
    if st
        .users
        .exists_by_email_or_username(&req.email, &req.username)
        .await?
    {
        warn!(email = %req.email, username = %req.username, "duplicate registration");
        return Err(AppError::Conflict(
            "User with this email or username already exists".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = st
        .users
        .create(&NewUser {
            email: req.email,
            username: req.username,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            program: req.program,
            year: req.year,
            advisor: req.advisor,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    open_session(st, user)
}

pub async fn login(st: &AppState, req: LoginRequest) -> Result<Session, AppError> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    // not trimmed: whitespace is a legal password character
    if req.password.is_empty() {
        return Err(AppError::validation("password is required"));
    }

    let Some(user) = st.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash) {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = user.id, "user logged in");
    open_session(st, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> RegisterRequest {
        RegisterRequest {
            email: "  A@X.com ".into(),
            username: "alice".into(),
            password: "secret1".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            program: "PhD".into(),
            year: 2,
            advisor: "Dodgson".into(),
        }
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@uni.example.edu"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("no-at.example.com"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[tokio::test]
    async fn register_normalizes_and_issues_token() {
        let st = AppState::fake();
        let session = register(&st, alice()).await.expect("register");
        assert_eq!(session.user.email, "a@x.com");
        assert_ne!(session.user.password_hash, "secret1");

        let claims = st.keys.verify(&session.token).expect("token verifies");
        assert_eq!(claims.user_id, session.user.id);
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn profile_fields_are_optional_at_registration() {
        let st = AppState::fake();
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@x.com","username":"alice","password":"secret1"}"#,
        )
        .unwrap();
        let session = register(&st, req).await.expect("register");
        assert_eq!(session.user.first_name, "");
        assert_eq!(session.user.last_name, "");
        assert_eq!(session.user.year, 0);
    }

    #[tokio::test]
    async fn duplicate_email_or_username_conflicts() {
        let st = AppState::fake();
        register(&st, alice()).await.unwrap();

        let mut same_username = alice();
        same_username.email = "other@x.com".into();
        assert!(matches!(
            register(&st, same_username).await,
            Err(AppError::Conflict(_))
        ));

        let mut same_email = alice();
        same_email.username = "alice2".into();
        assert!(matches!(
            register(&st, same_email).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn registration_input_is_validated() {
        let st = AppState::fake();
        let cases: [fn(&mut RegisterRequest); 4] = [
            |r| r.email = "nope".into(),
            |r| r.username = "al".into(),
            |r| r.password = "12345".into(),
            |r| r.year = -1,
        ];
        for mutate in cases {
            let mut req = alice();
            mutate(&mut req);
            assert!(matches!(
                register(&st, req).await,
                Err(AppError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn login_checks_password() {
        let st = AppState::fake();
        register(&st, alice()).await.unwrap();

        let ok = login(
            &st,
            LoginRequest {
                email: "A@x.com".into(),
                password: "secret1".into(),
            },
        )
        .await
        .expect("login");
        assert_eq!(ok.user.username, "alice");

        let bad = login(
            &st,
            LoginRequest {
                email: "a@x.com".into(),
                password: "secret2".into(),
            },
        )
        .await;
        assert!(matches!(bad, Err(AppError::InvalidCredentials)));

        let unknown = login(
            &st,
            LoginRequest {
                email: "z@x.com".into(),
                password: "secret1".into(),
            },
        )
        .await;
        assert!(matches!(unknown, Err(AppError::InvalidCredentials)));

        let empty = login(
            &st,
            LoginRequest {
                email: "a@x.com".into(),
                password: String::new(),
            },
        )
        .await;
        assert!(matches!(empty, Err(AppError::Validation(_))));
    }
}
