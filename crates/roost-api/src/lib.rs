pub mod account;
pub mod auth;
pub mod error;
pub mod likes;
pub mod middleware;
pub mod payload;
pub mod posts;
pub mod relationships;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use auth::AppState;
use middleware::require_auth;

/// Assemble the full `/v1` application. Public routes skip the credential
/// middleware; everything else validates and rotates the triple.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/v1/auth", post(auth::sign_up))
        .route("/v1/auth/sign_in", post(auth::sign_in))
        .route("/v1/auth/password", post(auth::request_password_reset))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/v1/auth", put(account::update_profile).delete(account::delete_account))
        .route("/v1/auth/sign_out", delete(auth::sign_out))
        .route("/v1/auth/validate_token", get(auth::validate_token))
        .route("/v1/auth/password", put(auth::change_password))
        .route("/v1/disable_lock_description", put(account::disable_lock_description))
        .route("/v1/posts", post(posts::create))
        .route("/v1/posts/me_and_followers", get(posts::timeline))
        .route("/v1/posts/{id}", delete(posts::destroy))
        .route("/v1/posts/{id}/replies", post(posts::create_reply))
        .route("/v1/posts/{id}/thread", get(posts::thread))
        .route("/v1/posts/{id}/change_lock", put(posts::change_lock))
        .route("/v1/posts/{id}/likes", post(likes::like).delete(likes::unlike))
        .route(
            "/v1/users/{userid}/follow",
            post(relationships::follow).delete(relationships::unfollow),
        )
        .route("/v1/users/{userid}/followers", get(relationships::followers))
        .route("/v1/users/{userid}/followings", get(relationships::followings))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}
