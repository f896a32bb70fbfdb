//! Registration, login, and bearer-token sessions.
//!
//! Passwords are stored as a BLAKE3 keyed hash whose key is derived from a
//! per-user random salt. Bearer tokens are 32 random bytes in hex; only
//! their BLAKE3 hash is persisted.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::users::{self, StoredUser};
use crate::ids::{self, USER_PREFIX};
use crate::model::{Role, User};

const PASSWORD_CONTEXT: &str = "inventura 2025-01-01 password hashing v1";
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A freshly issued bearer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("a user with this username or email already exists")]
    UserExists,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("not logged in; please log in")]
    MissingToken,

    #[error("token is invalid")]
    InvalidToken,

    #[error("token expired; please log in again")]
    Expired,

    #[error("the user for this token no longer exists")]
    UserGone,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl AuthError {
    /// HTTP-style status for the API envelope.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::UserExists => 400,
            Self::InvalidCredentials
            | Self::MissingToken
            | Self::InvalidToken
            | Self::Expired
            | Self::UserGone => 401,
            Self::Store(_) => 500,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Normalized copy of a registration, or every rule it breaks.
pub fn validate_registration(request: &RegisterRequest) -> Result<RegisterRequest, Vec<String>> {
    let mut errors = Vec::new();
    let username = request.username.trim().to_string();
    let email = normalize_email(&request.email);

    let len = username.chars().count();
    if !(3..=30).contains(&len) {
        errors.push("username must be 3-30 characters".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        errors.push("username may only contain letters, digits and _".to_string());
    }
    if !is_email(&email) {
        errors.push("invalid email".to_string());
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }

    if errors.is_empty() {
        Ok(RegisterRequest {
            username,
            email,
            password: request.password.clone(),
        })
    } else {
        Err(errors)
    }
}

fn validate_login(request: &LoginRequest) -> Result<LoginRequest, Vec<String>> {
    let mut errors = Vec::new();
    let email = normalize_email(&request.email);
    if !is_email(&email) {
        errors.push("invalid email".to_string());
    }
    if request.password.is_empty() {
        errors.push("password is required".to_string());
    }
    if errors.is_empty() {
        Ok(LoginRequest {
            email,
            password: request.password.clone(),
        })
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `local@domain.tld`: no whitespace, one `@`, a dot in the domain with
/// text on both sides.
fn is_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

// ---------------------------------------------------------------------------
// Password and token hashing
// ---------------------------------------------------------------------------

#[must_use]
pub fn hash_password(password: &str, salt: &str) -> String {
    let key = blake3::derive_key(PASSWORD_CONTEXT, salt.as_bytes());
    blake3::keyed_hash(&key, password.as_bytes()).to_hex().to_string()
}

/// Constant-time comparison through `blake3::Hash` equality.
#[must_use]
pub fn verify_password(password: &str, salt: &str, stored_hex: &str) -> bool {
    let Ok(stored) = blake3::Hash::from_hex(stored_hex) else {
        return false;
    };
    let key = blake3::derive_key(PASSWORD_CONTEXT, salt.as_bytes());
    blake3::keyed_hash(&key, password.as_bytes()) == stored
}

fn token_hash(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

/// Pull the token out of an `Authorization` header value.
#[must_use]
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let token = value.strip_prefix("Bearer").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

pub fn register(
    conn: &Connection,
    request: &RegisterRequest,
    ttl_hours: i64,
) -> Result<Session, AuthError> {
    let request = validate_registration(request).map_err(AuthError::Validation)?;
    if users::username_taken(conn, &request.username)? || users::email_taken(conn, &request.email)?
    {
        return Err(AuthError::UserExists);
    }

    let salt = ids::random_hex(16);
    let now = Utc::now();
    let stored = StoredUser {
        user: User {
            id: ids::new_id(USER_PREFIX),
            username: request.username,
            email: request.email,
            role: Role::User,
            created_at: now,
            last_login: Some(now),
        },
        password_hash: hash_password(&request.password, &salt),
        password_salt: salt,
    };
    users::insert_user(conn, &stored)?;
    info!(user = %stored.user.username, "user registered");

    issue_session(conn, stored.user, now, ttl_hours)
}

pub fn login(conn: &Connection, request: &LoginRequest, ttl_hours: i64) -> Result<Session, AuthError> {
    let request = validate_login(request).map_err(AuthError::Validation)?;
    let Some(stored) = users::find_by_email(conn, &request.email)? else {
        debug!("login for unknown email");
        return Err(AuthError::InvalidCredentials);
    };
    if !verify_password(&request.password, &stored.password_salt, &stored.password_hash) {
        warn!(user = %stored.user.username, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let now = Utc::now();
    users::touch_last_login(conn, &stored.user.id, now)?;
    let mut user = stored.user;
    user.last_login = Some(now);
    info!(user = %user.username, "user logged in");
    issue_session(conn, user, now, ttl_hours)
}

fn issue_session(
    conn: &Connection,
    user: User,
    now: DateTime<Utc>,
    ttl_hours: i64,
) -> Result<Session, AuthError> {
    let token = ids::random_hex(32);
    let expires_at = now + Duration::hours(ttl_hours.max(1));
    users::purge_expired_sessions(conn, now)?;
    users::insert_session(conn, &token_hash(&token), &user.id, now, expires_at)?;
    Ok(Session {
        token,
        expires_at,
        user,
    })
}

/// Resolve the user behind an `Authorization` header.
pub fn authenticate(conn: &Connection, header: Option<&str>) -> Result<User, AuthError> {
    authenticate_at(conn, header, Utc::now())
}

pub fn authenticate_at(
    conn: &Connection,
    header: Option<&str>,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let token = bearer_token(header).ok_or(AuthError::MissingToken)?;
    let session =
        users::get_session(conn, &token_hash(token))?.ok_or(AuthError::InvalidToken)?;
    if session.expires_at <= now {
        return Err(AuthError::Expired);
    }
    let stored = users::get_user(conn, &session.user_id)?.ok_or(AuthError::UserGone)?;
    Ok(stored.user)
}

/// Revoke a bearer token. Unknown tokens are not an error.
pub fn logout(conn: &Connection, token: &str) -> Result<bool, AuthError> {
    let revoked = users::delete_session(conn, &token_hash(token.trim()))?;
    if revoked {
        info!("session revoked");
    }
    Ok(revoked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice_1".into(),
            email: "  Alice@Example.COM ".into(),
            password: "secret1".into(),
        }
    }

    #[test]
    fn validation_lists_every_failure() {
        let errors = validate_registration(&RegisterRequest {
            username: "a!".into(),
            email: "nope".into(),
            password: "123".into(),
        })
        .expect_err("invalid");
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("a@b.cz"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.cz"));
        assert!(!is_email("a b@c.d"));
        assert!(!is_email("a@.cz"));
    }

    #[test]
    fn password_hash_is_salted() {
        let a = hash_password("secret1", "salt-a");
        assert_ne!(a, hash_password("secret1", "salt-b"));
        assert!(verify_password("secret1", "salt-a", &a));
        assert!(!verify_password("secret2", "salt-a", &a));
        assert!(!verify_password("secret1", "salt-a", "not-hex"));
    }

    #[test]
    fn register_login_authenticate_logout() {
        let conn = open_in_memory().expect("store");
        let registered = register(&conn, &alice(), 24).expect("register");
        assert_eq!(registered.user.email, "alice@example.com");
        assert_eq!(registered.user.role, Role::User);

        assert!(matches!(register(&conn, &alice(), 24), Err(AuthError::UserExists)));

        let session = login(
            &conn,
            &LoginRequest {
                email: "ALICE@example.com".into(),
                password: "secret1".into(),
            },
            24,
        )
        .expect("login");
        let header = format!("Bearer {}", session.token);
        let me = authenticate(&conn, Some(&header)).expect("authenticate");
        assert_eq!(me.id, registered.user.id);
        assert!(me.last_login.is_some());

        assert!(logout(&conn, &session.token).expect("logout"));
        assert!(matches!(
            authenticate(&conn, Some(&header)),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let conn = open_in_memory().expect("store");
        register(&conn, &alice(), 24).expect("register");
        let err = login(
            &conn,
            &LoginRequest {
                email: "alice@example.com".into(),
                password: "wrong-pass".into(),
            },
            24,
        )
        .expect_err("must fail");
        assert_eq!(err.status(), 401);
    }

    #[test]
    fn missing_expired_and_orphaned_tokens() {
        let conn = open_in_memory().expect("store");
        assert!(matches!(authenticate(&conn, None), Err(AuthError::MissingToken)));
        assert!(matches!(
            authenticate(&conn, Some("Bearer ")),
            Err(AuthError::MissingToken)
        ));

        let session = register(&conn, &alice(), 1).expect("register");
        let header = format!("Bearer {}", session.token);
        let later = Utc::now() + Duration::hours(2);
        let err = authenticate_at(&conn, Some(&header), later).expect_err("expired");
        assert!(matches!(err, AuthError::Expired));
        assert_eq!(err.status(), 401);

        // Sessions cascade with the user row, so a vanished user reads as invalid.
        users::delete_user(&conn, &session.user.id).expect("delete");
        assert!(matches!(
            authenticate(&conn, Some(&header)),
            Err(AuthError::InvalidToken)
        ));
    }
}
