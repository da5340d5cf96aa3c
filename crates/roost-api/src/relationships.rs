use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use roost_types::api::UsersResponse;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::payload::user_summary;

/// POST /v1/users/{userid}/follow. Idempotent, keyed by public handle.
pub async fn follow(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(userid): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let target = state
        .db
        .user_by_userid(&userid)?
        .ok_or(ApiError::NotFound)?;

    if target.id == current.user.id {
        return Err(ApiError::bad_request("You cannot follow yourself"));
    }

    state.db.follow(&current.user.id, &target.id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /v1/users/{userid}/follow
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(userid): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let target = state
        .db
        .user_by_userid(&userid)?
        .ok_or(ApiError::NotFound)?;

    state.db.unfollow(&current.user.id, &target.id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /v1/users/{userid}/followers
pub async fn followers(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
    Path(userid): Path<String>,
) -> ApiResult<Json<UsersResponse>> {
    let target = state
        .db
        .user_by_userid(&userid)?
        .ok_or(ApiError::NotFound)?;

    let users = state.db.followers_of(&target.id)?;
    Ok(Json(UsersResponse {
        users: users.iter().map(user_summary).collect(),
    }))
}

/// GET /v1/users/{userid}/followings
pub async fn followings(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
    Path(userid): Path<String>,
) -> ApiResult<Json<UsersResponse>> {
    let target = state
        .db
        .user_by_userid(&userid)?
        .ok_or(ApiError::NotFound)?;

    let users = state.db.followings_of(&target.id)?;
    Ok(Json(UsersResponse {
        users: users.iter().map(user_summary).collect(),
    }))
}
