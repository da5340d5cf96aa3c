use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use roost_types::api::LikesResponse;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;

/// POST /v1/posts/{id}/likes. Idempotent; liking twice holds the count.
pub async fn like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LikesResponse>> {
    let post = state
        .db
        .post(&id.to_string(), &current.user.id)?
        .ok_or(ApiError::NotFound)?;

    let likes_count = state.db.like(&post.id, &current.user.id)?;
    Ok(Json(LikesResponse { likes_count }))
}

/// DELETE /v1/posts/{id}/likes
pub async fn unlike(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LikesResponse>> {
    let post = state
        .db
        .post(&id.to_string(), &current.user.id)?
        .ok_or(ApiError::NotFound)?;

    let likes_count = state.db.unlike(&post.id, &current.user.id)?;
    Ok(Json(LikesResponse { likes_count }))
}
