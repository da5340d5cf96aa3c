use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use roost_db::models::UserRow;
use roost_types::headers;

use crate::auth::{AppState, SessionTriple, apply_triple, generate_token, token_digest};
use crate::error::ApiError;

/// The authenticated requester, inserted into request extensions by
/// [`require_auth`]. `client` identifies which of the user's sessions
/// this request belongs to.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: UserRow,
    pub client: String,
}

/// Set on the response by handlers that change the user's email, so the
/// refreshed triple carries the new `uid` instead of the one the request
/// arrived with.
#[derive(Debug, Clone)]
pub struct UpdatedUid(pub String);

/// The triple must arrive complete; a partial set is treated as absent.
fn read_triple(map: &HeaderMap) -> Option<(String, String, String)> {
    let read = |name: &str| {
        map.get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    Some((
        read(headers::ACCESS_TOKEN)?,
        read(headers::CLIENT)?,
        read(headers::UID)?,
    ))
}

/// Validate the credential triple and rotate it: the stored token hash is
/// replaced before the handler runs, and the refreshed triple is stamped
/// onto the response headers. A request missing any part of the triple,
/// or carrying a stale token, fails with 401 before handler logic.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (access_token, client, uid) = read_triple(req.headers()).ok_or(ApiError::Unauthorized)?;

    let user = state
        .db
        .user_by_email(&uid)?
        .ok_or(ApiError::Unauthorized)?;

    let token = state
        .db
        .token(&user.id, &client)?
        .ok_or(ApiError::Unauthorized)?;

    if token.token_hash != token_digest(&access_token) {
        return Err(ApiError::Unauthorized);
    }
    if token.expiry < chrono::Utc::now().timestamp() {
        return Err(ApiError::Unauthorized);
    }

    // Rotate: the presented token is spent now.
    let fresh = generate_token();
    let expiry = chrono::Utc::now().timestamp() + state.token_ttl_secs;
    state
        .db
        .rotate_token(&user.id, &client, &token_digest(&fresh), expiry)?;

    let uid = user.email.clone();
    req.extensions_mut().insert(CurrentUser { user, client: client.clone() });

    let mut res = next.run(req).await;

    let uid = res
        .extensions()
        .get::<UpdatedUid>()
        .map(|u| u.0.clone())
        .unwrap_or(uid);
    let triple = SessionTriple {
        access_token: fresh,
        client,
        uid,
    };
    apply_triple(res.headers_mut(), &triple)?;
    Ok(res)
}
