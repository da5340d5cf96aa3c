use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordChangeRequest {
    pub password: String,
    pub password_confirmation: String,
}

/// Profile-edit fields for `PUT /v1/auth`. All optional; the same route
/// also accepts multipart form data carrying an `image` part.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
}

/// The user resource as auth/account endpoints return it, snake_case,
/// wrapped under a `data` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub id: Uuid,
    pub userid: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub icon_url: Option<String>,
    pub need_description_about_lock: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub data: UserData,
}

// -- Errors --

/// Registration-style validation failures: `{"errors":{"full_messages":[..]}}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FullMessages {
    pub full_messages: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationErrors {
    pub errors: FullMessages,
}

/// Everything else: `{"errors":[..]}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlainErrors {
    pub errors: Vec<String>,
}

// -- Posts --

/// One timeline/thread item. Author fields are denormalized onto the post
/// so a single fetch renders without follow-up requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostData {
    pub id: Uuid,
    pub userid: String,
    pub username: String,
    pub icon_url: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub is_locked: bool,
    pub replied_post_id: Option<Uuid>,
    pub likes_count: i64,
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimelineResponse {
    pub posts: Vec<PostData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub post: PostData,
    pub replies: Vec<PostData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikesResponse {
    pub likes_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LockResponse {
    pub is_locked: bool,
}

// -- Users / relationships --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub userid: String,
    pub username: String,
    pub bio: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}
