use axum::{
    Extension, Json,
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    response::IntoResponse,
};
use tracing::info;

use roost_types::api::{ProfileUpdateRequest, UserResponse};

use crate::auth::{AppState, valid_email};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{CurrentUser, UpdatedUid};
use crate::payload::{now_string, user_data};
use crate::posts::{image_ref, valid_image_filename};

const USERID_MIN: usize = 4;
const USERID_MAX: usize = 15;

/// `PUT /v1/auth` arrives as JSON for plain field edits and as multipart
/// when an icon image rides along. Both parse into this one form.
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub userid: Option<String>,
    pub image_filename: Option<String>,
}

impl<S> FromRequest<S> for ProfileForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|_| ApiError::bad_request("Malformed multipart body"))?;
            let mut form = ProfileForm::default();

            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|_| ApiError::bad_request("Malformed multipart body"))?
            {
                let name = field.name().map(str::to_owned);
                match name.as_deref() {
                    Some("image") => {
                        form.image_filename = field.file_name().map(str::to_owned);
                        let _ = field
                            .bytes()
                            .await
                            .map_err(|_| ApiError::bad_request("Malformed multipart body"))?;
                    }
                    Some(other) => {
                        let text = field
                            .text()
                            .await
                            .map_err(|_| ApiError::bad_request("Malformed multipart body"))?;
                        match other {
                            "username" => form.username = Some(text),
                            "bio" => form.bio = Some(text),
                            "email" => form.email = Some(text),
                            "userid" => form.userid = Some(text),
                            _ => {}
                        }
                    }
                    None => {}
                }
            }
            Ok(form)
        } else {
            let Json(body): Json<ProfileUpdateRequest> = Json::from_request(req, state)
                .await
                .map_err(|_| ApiError::bad_request("Malformed JSON body"))?;
            Ok(ProfileForm {
                username: body.username,
                bio: body.bio,
                email: body.email,
                userid: body.userid,
                image_filename: None,
            })
        }
    }
}

// -- Handlers --

/// PUT /v1/auth, the profile edit. Field validations fail with 422 before
/// anything is written.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    form: ProfileForm,
) -> ApiResult<impl IntoResponse> {
    if let Some(userid) = &form.userid {
        let chars = userid.chars().count();
        if chars < USERID_MIN || chars > USERID_MAX {
            return Err(ApiError::unprocessable(format!(
                "Userid is the wrong length (must be {USERID_MIN}..{USERID_MAX} characters)"
            )));
        }
        if state.db.userid_taken(userid, &current.user.id)? {
            return Err(ApiError::unprocessable("Userid has already been taken"));
        }
    }

    if let Some(email) = &form.email {
        if !valid_email(email) {
            return Err(ApiError::unprocessable("Email is not an email"));
        }
        if *email != current.user.email && state.db.email_taken(email)? {
            return Err(ApiError::unprocessable("Email has already been taken"));
        }
    }

    let icon_url = match &form.image_filename {
        Some(name) if valid_image_filename(name) => Some(image_ref(name)),
        Some(_) => return Err(ApiError::unprocessable("Image has an invalid extension")),
        None => None,
    };

    let user_id = &current.user.id;
    if let Some(username) = &form.username {
        state.db.update_username(user_id, username)?;
    }
    if let Some(bio) = &form.bio {
        state.db.update_bio(user_id, bio)?;
    }
    if let Some(email) = &form.email {
        state.db.update_email(user_id, email)?;
    }
    if let Some(userid) = &form.userid {
        state.db.update_userid(user_id, userid)?;
    }
    if let Some(icon_url) = &icon_url {
        state.db.update_icon_url(user_id, icon_url)?;
    }

    let updated = state
        .db
        .user_by_id(user_id)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("user vanished during update")))?;

    let mut res = Json(UserResponse {
        data: user_data(&updated),
    })
    .into_response();
    if updated.email != current.user.email {
        res.extensions_mut().insert(UpdatedUid(updated.email.clone()));
    }
    Ok(res)
}

/// DELETE /v1/auth soft-deletes the account. The row stays (the email remains
/// reserved) and every session token dies.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    state.db.soft_delete_user(&current.user.id, &now_string())?;
    info!("user {} deleted their account", current.user.userid);

    Ok(Json(UserResponse {
        data: user_data(&current.user),
    }))
}

/// PUT /v1/disable_lock_description. The lock explainer has been shown
/// once; never show it again.
pub async fn disable_lock_description(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    state.db.disable_lock_description(&current.user.id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
