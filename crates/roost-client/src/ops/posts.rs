use tracing::warn;
use uuid::Uuid;

use roost_types::api::{LikesResponse, LockResponse, ThreadResponse, TimelineResponse};

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::ops::ImageUpload;
use crate::state::{Action, Post, Store, Thread};

/// Load the home timeline (own posts plus followed users') into the
/// store. Fetch failures are logged and dropped; the previous slice
/// stays in place.
pub async fn fetch_home_timeline(api: &ApiClient, store: &Store) {
    let res = match api.get("/v1/posts/me_and_followers").await {
        Ok(res) => res,
        Err(e) => {
            warn!("timeline fetch failed: {}", e);
            return;
        }
    };

    match res.json::<TimelineResponse>().await {
        Ok(body) => {
            let posts = body.posts.into_iter().map(Post::from_data).collect();
            store.dispatch(Action::PostsLoaded(posts));
        }
        Err(e) => warn!("timeline fetch failed: {}", e),
    }
}

/// Load a post and its replies into the store's thread view.
pub async fn get_thread(api: &ApiClient, store: &Store, post_id: Uuid) {
    let res = match api.get(&format!("/v1/posts/{post_id}/thread")).await {
        Ok(res) => res,
        Err(e) => {
            warn!("thread fetch failed: {}", e);
            return;
        }
    };

    match res.json::<ThreadResponse>().await {
        Ok(body) => store.dispatch(Action::ThreadLoaded(Thread::from_response(body))),
        Err(e) => warn!("thread fetch failed: {}", e),
    }
}

fn post_form(
    locked: bool,
    content: Option<&str>,
    image: Option<ImageUpload>,
) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new().text("is_locked", locked.to_string());
    if let Some(content) = content {
        form = form.text("content", content.to_string());
    }
    if let Some(image) = image {
        form = form.part(
            "image",
            reqwest::multipart::Part::bytes(image.bytes).file_name(image.filename),
        );
    }
    form
}

/// Submit a new post. Consistency is by re-read: on success the timeline
/// is re-fetched rather than the new post being merged locally.
pub async fn submit_post(
    api: &ApiClient,
    store: &Store,
    locked: bool,
    content: Option<&str>,
    image: Option<ImageUpload>,
) {
    match api.post_multipart("/v1/posts", post_form(locked, content, image)).await {
        Ok(_) => fetch_home_timeline(api, store).await,
        Err(e) => warn!("post submission failed: {}", e),
    }
}

/// Submit a reply; on success both the timeline and the parent thread are
/// re-read.
pub async fn submit_reply(
    api: &ApiClient,
    store: &Store,
    replied_post_id: Uuid,
    locked: bool,
    content: Option<&str>,
    image: Option<ImageUpload>,
) {
    let path = format!("/v1/posts/{replied_post_id}/replies");
    match api.post_multipart(&path, post_form(locked, content, image)).await {
        Ok(_) => {
            fetch_home_timeline(api, store).await;
            get_thread(api, store, replied_post_id).await;
        }
        Err(e) => warn!("reply submission failed: {}", e),
    }
}

/// Delete an owned post and reconcile the store locally: the removed
/// post disappears from the timeline and thread views without a re-read.
pub async fn delete_post(api: &ApiClient, store: &Store, post_id: Uuid) {
    match api.delete(&format!("/v1/posts/{post_id}")).await {
        Ok(_) => store.dispatch(Action::PostRemoved(post_id)),
        Err(e) => warn!("post deletion failed: {}", e),
    }
}

/// Toggle a post's lock; the store takes the state the server reports.
pub async fn change_lock(api: &ApiClient, store: &Store, post_id: Uuid) {
    let path = format!("/v1/posts/{post_id}/change_lock");
    let res = match api.put_json(&path, &serde_json::json!({})).await {
        Ok(res) => res,
        Err(e) => {
            warn!("lock toggle failed: {}", e);
            return;
        }
    };

    match res.json::<LockResponse>().await {
        Ok(body) => store.dispatch(Action::LockToggled {
            post_id,
            is_locked: body.is_locked,
        }),
        Err(e) => warn!("lock toggle failed: {}", e),
    }
}

/// Like a post. The counter moves only after the server confirms.
pub async fn like_post(api: &ApiClient, store: &Store, post_id: Uuid) {
    let path = format!("/v1/posts/{post_id}/likes");
    let res = match api.post_json(&path, &serde_json::json!({})).await {
        Ok(res) => res,
        Err(e) => {
            warn!("like failed: {}", e);
            return;
        }
    };

    match res.json::<LikesResponse>().await {
        Ok(body) => store.dispatch(Action::LikeSet {
            post_id,
            liked: true,
            likes_count: body.likes_count,
        }),
        Err(e) => warn!("like failed: {}", e),
    }
}

pub async fn unlike_post(api: &ApiClient, store: &Store, post_id: Uuid) {
    let path = format!("/v1/posts/{post_id}/likes");
    let res = match api.delete(&path).await {
        Ok(res) => res,
        Err(e) => {
            warn!("unlike failed: {}", e);
            return;
        }
    };

    match res.json::<LikesResponse>().await {
        Ok(body) => store.dispatch(Action::LikeSet {
            post_id,
            liked: false,
            likes_count: body.likes_count,
        }),
        Err(e) => warn!("unlike failed: {}", e),
    }
}

/// Follow a user by their public handle.
pub async fn follow_user(api: &ApiClient, userid: &str) -> Result<(), ClientError> {
    api.post_json(&format!("/v1/users/{userid}/follow"), &serde_json::json!({}))
        .await?;
    Ok(())
}

pub async fn unfollow_user(api: &ApiClient, userid: &str) -> Result<(), ClientError> {
    api.delete(&format!("/v1/users/{userid}/follow")).await?;
    Ok(())
}
