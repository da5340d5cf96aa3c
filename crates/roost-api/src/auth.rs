use std::sync::{Arc, LazyLock};

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{Extension, Json, extract::State, http::HeaderMap, http::HeaderName, http::HeaderValue, http::StatusCode, response::IntoResponse, response::Response};
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use roost_db::Database;
use roost_db::models::UserRow;
use roost_types::api::{
    PasswordChangeRequest, PasswordResetRequest, SignInRequest, SignUpRequest, UserResponse,
};
use roost_types::headers;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::payload::{now_string, user_data};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub token_ttl_secs: i64,
}

/// devise_token_auth's default session lifetime is two weeks.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 14 * 24 * 60 * 60;

impl AppStateInner {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

const USERID_LEN: usize = 15;
const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

pub(crate) fn valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

// -- Password hashing --

pub(crate) fn hash_password(password: &str) -> anyhow::Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| anyhow::anyhow!("salt encoding failed: {}", e))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub(crate) fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// -- Credential triple --

#[derive(Debug, Clone)]
pub(crate) struct SessionTriple {
    pub access_token: String,
    pub client: String,
    pub uid: String,
}

pub(crate) fn generate_token() -> String {
    let mut buf = [0u8; 32];
    rand::rng().fill(&mut buf);
    hex::encode(buf)
}

pub(crate) fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Mint a fresh (access-token, client, uid) triple for a user and persist
/// the hashed token under the new client id.
pub(crate) fn mint_session(state: &AppStateInner, user: &UserRow) -> anyhow::Result<SessionTriple> {
    let access_token = generate_token();
    let client = {
        let mut buf = [0u8; 16];
        rand::rng().fill(&mut buf);
        hex::encode(buf)
    };
    let expiry = chrono::Utc::now().timestamp() + state.token_ttl_secs;

    state
        .db
        .insert_token(&user.id, &client, &token_digest(&access_token), expiry)?;

    Ok(SessionTriple {
        access_token,
        client,
        uid: user.email.clone(),
    })
}

pub(crate) fn apply_triple(headers: &mut HeaderMap, triple: &SessionTriple) -> ApiResult<()> {
    let pairs = [
        (headers::ACCESS_TOKEN, &triple.access_token),
        (headers::CLIENT, &triple.client),
        (headers::UID, &triple.uid),
    ];
    for (name, value) in pairs {
        let value = HeaderValue::from_str(value)
            .map_err(|e| anyhow::anyhow!("unencodable {} header: {}", name, e))?;
        headers.insert(HeaderName::from_static(name), value);
    }
    Ok(())
}

fn session_response(data: roost_types::api::UserData, triple: &SessionTriple) -> ApiResult<Response> {
    let mut res = (StatusCode::OK, Json(UserResponse { data })).into_response();
    apply_triple(res.headers_mut(), triple)?;
    Ok(res)
}

/// Random 15-character alphanumeric public handle, retried on the
/// (vanishingly unlikely) collision.
fn generate_userid(db: &Database) -> ApiResult<String> {
    use rand::distr::Alphanumeric;

    for _ in 0..8 {
        let candidate: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(USERID_LEN)
            .map(char::from)
            .collect();
        if !db.userid_taken(&candidate, "")? {
            return Ok(candidate);
        }
    }
    Err(ApiError::Internal(anyhow::anyhow!(
        "could not generate a unique userid"
    )))
}

// -- Handlers --

/// POST /v1/auth
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<Response> {
    let mut messages = Vec::new();

    if req.email.is_empty() {
        messages.push("Email can't be blank".to_string());
    } else if !valid_email(&req.email) {
        messages.push("Email is not an email".to_string());
    } else if state.db.email_taken(&req.email)? {
        messages.push("Email has already been taken".to_string());
    }

    if req.password.is_empty() {
        messages.push("Password can't be blank".to_string());
    } else if req.password.chars().count() < MIN_PASSWORD_LEN {
        messages.push(format!(
            "Password is too short (minimum is {MIN_PASSWORD_LEN} characters)"
        ));
    }

    if req.password_confirmation.is_empty() {
        messages.push("Password confirmation can't be blank".to_string());
    } else if req.password != req.password_confirmation {
        messages.push("Password confirmation doesn't match Password".to_string());
    }

    if !messages.is_empty() {
        return Err(ApiError::Unprocessable(messages));
    }

    let user_id = Uuid::new_v4().to_string();
    let userid = generate_userid(&state.db)?;
    // Display name defaults to the email's local part; editable later.
    let username = req.email.split('@').next().unwrap_or(&req.email).to_string();
    let password_hash = hash_password(&req.password)?;

    state.db.create_user(
        &user_id,
        &userid,
        &username,
        &req.email,
        &password_hash,
        &now_string(),
    )?;

    let user = state
        .db
        .user_by_id(&user_id)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("user vanished after insert")))?;

    let triple = mint_session(&state, &user)?;
    info!("user {} signed up", user.userid);
    session_response(user_data(&user), &triple)
}

/// POST /v1/auth/sign_in
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<Response> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    let user = state
        .db
        .user_by_email(&req.email)?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&req.password, &user.password) {
        return Err(ApiError::Unauthorized);
    }

    let triple = mint_session(&state, &user)?;
    session_response(user_data(&user), &triple)
}

/// DELETE /v1/auth/sign_out drops this client's token row. The triple
/// the middleware stamped on the response is already dead.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    state.db.delete_token(&current.user.id, &current.client)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /v1/auth/validate_token. The client calls this at boot with the
/// cookie-persisted triple; the refreshed triple rides the headers.
pub async fn validate_token(
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(UserResponse {
        data: user_data(&current.user),
    }))
}

/// POST /v1/auth/password issues a reset token. Mail delivery is out of
/// scope; the issuance is recorded and logged only.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .user_by_email(&req.email)?
        .ok_or(ApiError::NotFound)?;

    let token = generate_token();
    let expiry = chrono::Utc::now().timestamp() + 60 * 60;
    state
        .db
        .insert_password_reset(&user.id, &token_digest(&token), expiry)?;

    info!("password reset issued for {}", user.userid);
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("An email has been sent to '{}' containing instructions for resetting your password.", req.email),
    })))
}

/// PUT /v1/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<PasswordChangeRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut messages = Vec::new();

    if req.password.is_empty() {
        messages.push("Password can't be blank".to_string());
    } else if req.password.chars().count() < MIN_PASSWORD_LEN {
        messages.push(format!(
            "Password is too short (minimum is {MIN_PASSWORD_LEN} characters)"
        ));
    }
    if req.password != req.password_confirmation {
        messages.push("Password confirmation doesn't match Password".to_string());
    }
    if !messages.is_empty() {
        return Err(ApiError::Unprocessable(messages));
    }

    let password_hash = hash_password(&req.password)?;
    state.db.set_password(&current.user.id, &password_hash)?;

    Ok(Json(UserResponse {
        data: user_data(&current.user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hashing_round_trips() {
        let hash = hash_password("password123").unwrap();
        assert!(verify_password("password123", &hash));
        assert!(!verify_password("password124", &hash));
    }

    #[test]
    fn password_hashing_salts_every_hash() {
        let first = hash_password("password123").unwrap();
        let second = hash_password("password123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn verify_rejects_garbage_hashes() {
        assert!(!verify_password("password123", "not a phc string"));
    }
}
