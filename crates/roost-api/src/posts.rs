use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use roost_db::models::PostRow;
use roost_types::api::{LockResponse, PostData, ThreadResponse, TimelineResponse};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::payload::{now_string, post_data};

const TIMELINE_LIMIT: u32 = 100;

const ALLOWED_IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "gif", "png"];

pub(crate) fn valid_image_filename(filename: &str) -> bool {
    filename
        .rsplit('.')
        .next()
        .is_some_and(|ext| ALLOWED_IMAGE_EXTS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Stored image reference. Blob storage is an external concern; the
/// reference is what travels on the wire.
pub(crate) fn image_ref(filename: &str) -> String {
    format!("/uploads/{}-{}", Uuid::new_v4(), filename)
}

struct PostForm {
    content: Option<String>,
    is_locked: bool,
    image_url: Option<String>,
}

/// The original client submits posts as multipart form data: optional
/// `content`, mandatory `is_locked` as the string "true"/"false", and an
/// optional `image` part.
async fn read_post_form(mut multipart: Multipart) -> ApiResult<PostForm> {
    let mut content: Option<String> = None;
    let mut is_locked: Option<bool> = None;
    let mut image_url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Malformed multipart body"))?
    {
        match field.name() {
            Some("content") => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("Malformed multipart body"))?;
                if !text.is_empty() {
                    content = Some(text);
                }
            }
            Some("is_locked") => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("Malformed multipart body"))?;
                is_locked = Some(match text.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => return Err(ApiError::bad_request("Is locked is invalid")),
                });
            }
            Some("image") => {
                let filename = field.file_name().map(str::to_owned);
                // The bytes themselves go to external storage; only the
                // reference is kept.
                let _ = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::bad_request("Malformed multipart body"))?;
                match filename {
                    Some(name) if valid_image_filename(&name) => {
                        image_url = Some(image_ref(&name));
                    }
                    _ => return Err(ApiError::bad_request("Image has an invalid extension")),
                }
            }
            _ => {}
        }
    }

    let is_locked = is_locked.ok_or_else(|| ApiError::bad_request("Is locked can't be blank"))?;

    Ok(PostForm {
        content,
        is_locked,
        image_url,
    })
}

async fn insert_and_fetch(
    state: AppState,
    viewer_id: String,
    form: PostForm,
    replied_post_id: Option<String>,
) -> ApiResult<PostRow> {
    if form.content.is_none() && form.image_url.is_none() {
        return Err(ApiError::bad_request("Content can't be blank"));
    }

    let post_id = Uuid::new_v4().to_string();
    let created_at = now_string();

    // Run blocking DB work off the async runtime
    let id = post_id.clone();
    let row = tokio::task::spawn_blocking(move || {
        state.db.insert_post(
            &id,
            &viewer_id,
            form.content.as_deref(),
            form.image_url.as_deref(),
            form.is_locked,
            replied_post_id.as_deref(),
            &created_at,
        )?;
        state.db.post(&id, &viewer_id)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!(e))
    })??
    .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("post vanished after insert")))?;

    Ok(row)
}

/// Whether a viewer may participate in a locked post's thread: the author
/// always can, as can anyone the author follows.
fn may_enter_thread(state: &AppState, parent: &PostRow, viewer_id: &str) -> ApiResult<bool> {
    if !parent.is_locked || parent.author_id == viewer_id {
        return Ok(true);
    }
    Ok(state.db.is_following(&parent.author_id, viewer_id)?)
}

// -- Handlers --

/// GET /v1/posts/me_and_followers
pub async fn timeline(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<TimelineResponse>> {
    let viewer_id = current.user.id.clone();
    let rows = tokio::task::spawn_blocking(move || state.db.timeline(&viewer_id, TIMELINE_LIMIT))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!(e))
        })??;

    let posts: Vec<PostData> = rows.iter().map(post_data).collect();
    Ok(Json(TimelineResponse { posts }))
}

/// POST /v1/posts
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_post_form(multipart).await?;
    let row = insert_and_fetch(state, current.user.id.clone(), form, None).await?;
    Ok(Json(post_data(&row)))
}

/// POST /v1/posts/{id}/replies
pub async fn create_reply(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_post_form(multipart).await?;

    let parent = state
        .db
        .post(&id.to_string(), &current.user.id)?
        .ok_or(ApiError::NotFound)?;

    if !may_enter_thread(&state, &parent, &current.user.id)? {
        return Err(ApiError::bad_request("Replies to this post are restricted"));
    }

    let row = insert_and_fetch(state, current.user.id.clone(), form, Some(parent.id)).await?;
    Ok(Json(post_data(&row)))
}

/// GET /v1/posts/{id}/thread returns the post plus its replies. Outsiders to a
/// locked thread see an empty reply list, mirroring the reply-creation
/// restriction.
pub async fn thread(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ThreadResponse>> {
    let parent = state
        .db
        .post(&id.to_string(), &current.user.id)?
        .ok_or(ApiError::NotFound)?;

    let replies = if may_enter_thread(&state, &parent, &current.user.id)? {
        state.db.replies(&parent.id, &current.user.id)?
    } else {
        Vec::new()
    };

    Ok(Json(ThreadResponse {
        post: post_data(&parent),
        replies: replies.iter().map(post_data).collect(),
    }))
}

/// DELETE /v1/posts/{id}, author only. A post that exists but is not
/// yours yields 400 with an empty error set; an unknown id is 404.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .db
        .post(&id.to_string(), &current.user.id)?
        .ok_or(ApiError::NotFound)?;

    if post.author_id != current.user.id {
        return Err(ApiError::BadRequest(Vec::new()));
    }

    state.db.delete_post(&post.id)?;
    Ok(Json(post_data(&post)))
}

/// PUT /v1/posts/{id}/change_lock
pub async fn change_lock(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LockResponse>> {
    let post = state
        .db
        .post(&id.to_string(), &current.user.id)?
        .ok_or(ApiError::NotFound)?;

    if post.author_id != current.user.id {
        return Err(ApiError::BadRequest(Vec::new()));
    }

    let is_locked = state.db.toggle_lock(&post.id)?;
    Ok(Json(LockResponse { is_locked }))
}
