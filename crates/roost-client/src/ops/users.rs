use roost_types::api::{
    PasswordChangeRequest, PasswordResetRequest, ProfileUpdateRequest, SignInRequest,
    SignUpRequest, UserResponse,
};

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::messages;
use crate::ops::ImageUpload;
use crate::session::Credentials;
use crate::state::{Action, Profile, Store};
use crate::validate::{check_password_pair, valid_email};

/// Outcome of the boot-time session check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    SignedIn,
    /// No usable session: the caller should route to the landing page.
    RedirectToLanding,
}

async fn dispatch_signed_in(
    store: &Store,
    res: reqwest::Response,
) -> Result<(), ClientError> {
    let body: UserResponse = res.json().await?;
    store.dispatch(Action::SignedIn(Profile::from_data(body.data)));
    Ok(())
}

/// Sign up with email and password. Validation failures set the message
/// and skip the network entirely.
pub async fn sign_up(
    api: &ApiClient,
    store: &Store,
    email: &str,
    password: &str,
    password_confirmation: &str,
) -> Result<(), ClientError> {
    if email.is_empty() || password.is_empty() || password_confirmation.is_empty() {
        return Err(ClientError::validation(messages::REQUIRED_FIELDS));
    }
    if !valid_email(email) {
        return Err(ClientError::validation(messages::INVALID_EMAIL));
    }
    check_password_pair(password, password_confirmation)?;

    let res = api
        .post_json(
            "/v1/auth",
            &SignUpRequest {
                email: email.to_string(),
                password: password.to_string(),
                password_confirmation: password_confirmation.to_string(),
            },
        )
        .await
        .map_err(|e| {
            if e.has_server_message("Email has already been taken") {
                e.with_message(messages::EMAIL_TAKEN)
            } else if e.has_server_message("Email is not an email") {
                e.with_message(messages::EMAIL_REJECTED)
            } else {
                e.with_message(messages::BAD_REQUEST)
            }
        })?;

    dispatch_signed_in(store, res).await
}

pub async fn sign_in(
    api: &ApiClient,
    store: &Store,
    email: &str,
    password: &str,
) -> Result<(), ClientError> {
    if email.is_empty() || password.is_empty() {
        return Err(ClientError::validation(messages::EMAIL_AND_PASSWORD_REQUIRED));
    }
    if !valid_email(email) {
        return Err(ClientError::validation(messages::INVALID_EMAIL));
    }

    let res = api
        .post_json(
            "/v1/auth/sign_in",
            &SignInRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await
        .map_err(|e| e.with_message(messages::SIGN_IN_FAILED))?;

    dispatch_signed_in(store, res).await
}

/// Sign out: the session is dropped only once the server confirms.
pub async fn sign_out(api: &ApiClient, store: &Store) -> Result<(), ClientError> {
    api.delete("/v1/auth/sign_out")
        .await
        .map_err(|e| e.with_message(messages::SIGN_OUT_FAILED))?;

    api.session().clear();
    store.dispatch(Action::SignedOut);
    Ok(())
}

/// Boot-time session check against the persisted triple. Any failure
/// clears the local session and asks the caller to show the landing page;
/// this never errors.
pub async fn listen_auth_state(api: &ApiClient, store: &Store) -> Bootstrap {
    match api.get("/v1/auth/validate_token").await {
        Ok(res) => match dispatch_signed_in(store, res).await {
            Ok(()) => Bootstrap::SignedIn,
            Err(_) => {
                api.session().clear();
                store.dispatch(Action::SignedOut);
                Bootstrap::RedirectToLanding
            }
        },
        Err(_) => {
            api.session().clear();
            store.dispatch(Action::SignedOut);
            Bootstrap::RedirectToLanding
        }
    }
}

/// Ask for a password-reset mail. The caller routes to the "mail sent"
/// page whether or not the server accepted the address, so only
/// validation failures surface.
pub async fn send_password_reset_mail(
    api: &ApiClient,
    email: &str,
    redirect_url: Option<String>,
) -> Result<(), ClientError> {
    if email.is_empty() {
        return Err(ClientError::validation(messages::EMAIL_REQUIRED));
    }
    if !valid_email(email) {
        return Err(ClientError::validation(messages::INVALID_EMAIL));
    }

    let _ = api
        .post_json(
            "/v1/auth/password",
            &PasswordResetRequest {
                email: email.to_string(),
                redirect_url,
            },
        )
        .await;
    Ok(())
}

/// Set a new password using the triple delivered by the reset link.
pub async fn reset_password(
    api: &ApiClient,
    store: &Store,
    password: &str,
    password_confirmation: &str,
    creds: Credentials,
) -> Result<(), ClientError> {
    if password.is_empty() || password_confirmation.is_empty() {
        return Err(ClientError::validation(messages::REQUIRED_FIELDS));
    }
    check_password_pair(password, password_confirmation)?;

    api.session().save(&creds);

    let res = api
        .put_json(
            "/v1/auth/password",
            &PasswordChangeRequest {
                password: password.to_string(),
                password_confirmation: password_confirmation.to_string(),
            },
        )
        .await
        .map_err(|e| e.with_message(messages::RESET_FAILED))?;

    dispatch_signed_in(store, res).await
}

/// Edit display name, bio and icon in one multipart request.
pub async fn edit_profile(
    api: &ApiClient,
    store: &Store,
    username: &str,
    bio: Option<&str>,
    icon: Option<ImageUpload>,
) -> Result<(), ClientError> {
    let mut form = reqwest::multipart::Form::new().text("username", username.to_string());
    if let Some(bio) = bio {
        form = form.text("bio", bio.to_string());
    }
    if let Some(icon) = icon {
        form = form.part(
            "image",
            reqwest::multipart::Part::bytes(icon.bytes).file_name(icon.filename),
        );
    }

    let res = api
        .put_multipart("/v1/auth", form)
        .await
        .map_err(|e| e.with_message(messages::UNKNOWN))?;

    dispatch_signed_in(store, res).await
}

pub async fn edit_userid(
    api: &ApiClient,
    store: &Store,
    userid: &str,
) -> Result<(), ClientError> {
    let res = api
        .put_json(
            "/v1/auth",
            &ProfileUpdateRequest {
                userid: Some(userid.to_string()),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| {
            if e.status() == Some(422) {
                e.with_message(messages::USERID_TAKEN)
            } else {
                e.with_message(messages::UNKNOWN)
            }
        })?;

    dispatch_signed_in(store, res).await
}

pub async fn edit_email(
    api: &ApiClient,
    store: &Store,
    email: &str,
) -> Result<(), ClientError> {
    if !valid_email(email) {
        return Err(ClientError::validation(messages::INVALID_EMAIL));
    }

    let res = api
        .put_json(
            "/v1/auth",
            &ProfileUpdateRequest {
                email: Some(email.to_string()),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| {
            if e.status() == Some(422) {
                e.with_message(messages::EMAIL_TAKEN_EDIT)
            } else {
                e.with_message(messages::UNKNOWN)
            }
        })?;

    dispatch_signed_in(store, res).await
}

/// The lock explainer has been shown; stop showing it.
pub async fn disable_lock_description(api: &ApiClient, store: &Store) {
    match api.put_json("/v1/disable_lock_description", &serde_json::json!({})).await {
        Ok(_) => store.dispatch(Action::LockDescriptionDisabled),
        Err(e) => tracing::warn!("disable_lock_description failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    //! Pre-flight validation must fail before any request is issued: the
    //! client below points at an unroutable origin, so a network attempt
    //! would surface as `ClientError::Http`, not `Validation`.

    use std::sync::Arc;

    use super::*;
    use crate::session::MemoryStore;

    fn offline_client() -> ApiClient {
        ApiClient::new("http://127.0.0.1:9", Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn sign_up_rejects_missing_fields_without_network() {
        let api = offline_client();
        let store = Store::new();

        let err = sign_up(&api, &store, "", "password123", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation { .. }));
        assert_eq!(err.user_message(), messages::REQUIRED_FIELDS);
    }

    #[tokio::test]
    async fn sign_up_rejects_malformed_email_without_network() {
        let api = offline_client();
        let store = Store::new();

        let err = sign_up(&api, &store, "not-an-email", "password123", "password123")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), messages::INVALID_EMAIL);
    }

    #[tokio::test]
    async fn sign_up_rejects_short_password_without_network() {
        let api = offline_client();
        let store = Store::new();

        let err = sign_up(&api, &store, "a@example.com", "short12", "short12")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), messages::PASSWORD_TOO_SHORT);
    }

    #[tokio::test]
    async fn sign_up_rejects_mismatched_passwords_without_network() {
        let api = offline_client();
        let store = Store::new();

        let err = sign_up(&api, &store, "a@example.com", "password123", "password124")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), messages::PASSWORD_MISMATCH);
        assert!(!store.is_signed_in());
    }

    #[tokio::test]
    async fn sign_in_requires_both_fields() {
        let api = offline_client();
        let store = Store::new();

        let err = sign_in(&api, &store, "a@example.com", "").await.unwrap_err();
        assert_eq!(err.user_message(), messages::EMAIL_AND_PASSWORD_REQUIRED);
    }

    #[tokio::test]
    async fn reset_mail_requires_a_wellformed_address() {
        let api = offline_client();

        let err = send_password_reset_mail(&api, "", None).await.unwrap_err();
        assert_eq!(err.user_message(), messages::EMAIL_REQUIRED);

        let err = send_password_reset_mail(&api, "nope", None).await.unwrap_err();
        assert_eq!(err.user_message(), messages::INVALID_EMAIL);
    }
}
