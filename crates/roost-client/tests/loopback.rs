//! End-to-end tests: the real API router served on an ephemeral port, the
//! real client library talking to it over loopback.

use std::sync::Arc;

use roost_api::auth::AppStateInner;
use roost_client::ops::{self, Bootstrap};
use roost_client::{ApiClient, Credentials, MemoryStore, SessionStore, Store};

async fn spawn_server() -> String {
    let db = roost_db::Database::open_in_memory().unwrap();
    let app = roost_api::router(Arc::new(AppStateInner::new(db)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

struct Harness {
    api: ApiClient,
    store: Store,
    session: Arc<MemoryStore>,
}

async fn client_for(origin: &str) -> Harness {
    let session = Arc::new(MemoryStore::new());
    Harness {
        api: ApiClient::new(origin, session.clone()),
        store: Store::new(),
        session,
    }
}

async fn signed_up(origin: &str, email: &str) -> Harness {
    let h = client_for(origin).await;
    ops::sign_up(&h.api, &h.store, email, "password123", "password123")
        .await
        .unwrap();
    h
}

#[tokio::test]
async fn sign_up_installs_profile_and_session() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;

    let user = h.store.current_user().unwrap();
    assert_eq!(user.userid.len(), 15);
    assert_eq!(user.username, "tester");
    assert!(user.need_description_about_lock);

    let creds = h.session.load().unwrap();
    assert_eq!(creds.uid, "tester@example.com");
    assert!(!creds.access_token.is_empty());
}

#[tokio::test]
async fn the_triple_rotates_on_every_authenticated_request() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;
    let before = h.session.load().unwrap();

    ops::fetch_home_timeline(&h.api, &h.store).await;

    let after = h.session.load().unwrap();
    assert_ne!(before.access_token, after.access_token);
    assert_eq!(before.client, after.client);
    assert_eq!(before.uid, after.uid);
}

#[tokio::test]
async fn submit_post_refreshes_the_timeline() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;

    ops::submit_post(&h.api, &h.store, false, Some("hello loopback"), None).await;

    let posts = h.store.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content.as_deref(), Some("hello loopback"));
    assert!(!posts[0].is_locked);
}

#[tokio::test]
async fn like_and_unlike_move_the_counter_after_server_confirm() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;

    ops::submit_post(&h.api, &h.store, false, Some("likeable"), None).await;
    let post_id = h.store.posts()[0].id;

    ops::like_post(&h.api, &h.store, post_id).await;
    let post = &h.store.posts()[0];
    assert!(post.liked_by_me);
    assert_eq!(post.likes_count, 1);

    ops::unlike_post(&h.api, &h.store, post_id).await;
    let post = &h.store.posts()[0];
    assert!(!post.liked_by_me);
    assert_eq!(post.likes_count, 0);
}

#[tokio::test]
async fn delete_post_reconciles_the_store_without_a_refetch() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;

    ops::submit_post(&h.api, &h.store, false, Some("keep me"), None).await;
    ops::submit_post(&h.api, &h.store, false, Some("drop me"), None).await;
    assert_eq!(h.store.posts().len(), 2);

    let doomed = h
        .store
        .posts()
        .iter()
        .find(|p| p.content.as_deref() == Some("drop me"))
        .unwrap()
        .id;
    ops::delete_post(&h.api, &h.store, doomed).await;

    let posts = h.store.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content.as_deref(), Some("keep me"));
}

#[tokio::test]
async fn replies_load_into_the_thread_view() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;

    ops::submit_post(&h.api, &h.store, false, Some("root post"), None).await;
    let root = h.store.posts()[0].id;

    ops::submit_reply(&h.api, &h.store, root, false, Some("a reply"), None).await;

    let thread = h.store.thread().unwrap();
    assert_eq!(thread.post.id, root);
    assert_eq!(thread.replies.len(), 1);
    assert_eq!(thread.replies[0].content.as_deref(), Some("a reply"));
}

#[tokio::test]
async fn change_lock_takes_the_server_reported_state() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;

    ops::submit_post(&h.api, &h.store, false, Some("lockable"), None).await;
    let post_id = h.store.posts()[0].id;

    ops::change_lock(&h.api, &h.store, post_id).await;
    assert!(h.store.posts()[0].is_locked);

    ops::change_lock(&h.api, &h.store, post_id).await;
    assert!(!h.store.posts()[0].is_locked);
}

#[tokio::test]
async fn follows_bring_posts_into_the_timeline() {
    let origin = spawn_server().await;
    let alice = signed_up(&origin, "alice@example.com").await;
    ops::submit_post(&alice.api, &alice.store, false, Some("from alice"), None).await;
    let alice_handle = alice.store.current_user().unwrap().userid;

    let bob = signed_up(&origin, "bob@example.com").await;
    ops::follow_user(&bob.api, &alice_handle).await.unwrap();
    ops::fetch_home_timeline(&bob.api, &bob.store).await;

    let posts = bob.store.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content.as_deref(), Some("from alice"));

    ops::unfollow_user(&bob.api, &alice_handle).await.unwrap();
    ops::fetch_home_timeline(&bob.api, &bob.store).await;
    assert!(bob.store.posts().is_empty());
}

#[tokio::test]
async fn sign_out_clears_session_and_store() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;

    ops::sign_out(&h.api, &h.store).await.unwrap();
    assert!(h.session.load().is_none());
    assert!(!h.store.is_signed_in());

    // The account itself survives; signing back in works.
    ops::sign_in(&h.api, &h.store, "tester@example.com", "password123")
        .await
        .unwrap();
    assert!(h.store.is_signed_in());
    assert!(h.session.load().is_some());
}

#[tokio::test]
async fn bootstrap_restores_a_valid_session() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;

    // A fresh client instance picking up the persisted triple.
    let api = ApiClient::new(origin.as_str(), h.session.clone());
    let store = Store::new();
    assert_eq!(ops::listen_auth_state(&api, &store).await, Bootstrap::SignedIn);
    assert_eq!(
        store.current_user().unwrap().userid,
        h.store.current_user().unwrap().userid
    );
}

#[tokio::test]
async fn bootstrap_with_a_dead_triple_redirects_and_clears() {
    let origin = spawn_server().await;
    let h = client_for(&origin).await;
    h.session.save(&Credentials {
        access_token: "stale".into(),
        client: "stale".into(),
        uid: "ghost@example.com".into(),
    });

    assert_eq!(
        ops::listen_auth_state(&h.api, &h.store).await,
        Bootstrap::RedirectToLanding
    );
    assert!(h.session.load().is_none());
    assert!(!h.store.is_signed_in());
}

#[tokio::test]
async fn profile_edits_flow_back_into_the_store() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;

    ops::edit_profile(&h.api, &h.store, "renamed", Some("short bio"), None)
        .await
        .unwrap();
    assert_eq!(h.store.current_user().unwrap().username, "renamed");

    ops::edit_userid(&h.api, &h.store, "fresh-handle").await.unwrap();
    assert_eq!(h.store.current_user().unwrap().userid, "fresh-handle");

    // A colliding handle surfaces the mapped message.
    let other = signed_up(&origin, "other@example.com").await;
    let err = ops::edit_userid(&other.api, &other.store, "fresh-handle")
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), roost_client::messages::USERID_TAKEN);
}

#[tokio::test]
async fn email_edit_keeps_the_session_usable() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "old@example.com").await;

    ops::edit_email(&h.api, &h.store, "new@example.com").await.unwrap();
    assert_eq!(h.session.load().unwrap().uid, "new@example.com");

    // The refreshed triple still authenticates.
    ops::fetch_home_timeline(&h.api, &h.store).await;
    let api = ApiClient::new(origin.as_str(), h.session.clone());
    let store = Store::new();
    assert_eq!(ops::listen_auth_state(&api, &store).await, Bootstrap::SignedIn);
}

#[tokio::test]
async fn disable_lock_description_clears_the_flag_in_the_store() {
    let origin = spawn_server().await;
    let h = signed_up(&origin, "tester@example.com").await;
    assert!(h.store.current_user().unwrap().need_description_about_lock);

    ops::disable_lock_description(&h.api, &h.store).await;
    assert!(!h.store.current_user().unwrap().need_description_about_lock);
}
