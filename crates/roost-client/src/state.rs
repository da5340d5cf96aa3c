//! The application store: a typed action union, a pure reducer, and a
//! mutex-held state with selector accessors.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use roost_types::api::{PostData, ThreadResponse, UserData};

/// Substituted whenever the server has no icon for a user.
pub const DEFAULT_ICON_URL: &str = "/assets/default-icon.png";

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub userid: String,
    pub username: String,
    pub icon_url: String,
    pub need_description_about_lock: bool,
}

impl Profile {
    pub fn from_data(data: UserData) -> Self {
        Self {
            userid: data.userid,
            username: data.username,
            icon_url: data.icon_url.unwrap_or_else(|| DEFAULT_ICON_URL.to_string()),
            need_description_about_lock: data.need_description_about_lock,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub userid: String,
    pub username: String,
    pub icon_url: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub is_locked: bool,
    pub replied_post_id: Option<Uuid>,
    pub likes_count: i64,
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn from_data(data: PostData) -> Self {
        Self {
            id: data.id,
            userid: data.userid,
            username: data.username,
            icon_url: data.icon_url.unwrap_or_else(|| DEFAULT_ICON_URL.to_string()),
            content: data.content,
            image_url: data.image_url,
            is_locked: data.is_locked,
            replied_post_id: data.replied_post_id,
            likes_count: data.likes_count,
            liked_by_me: data.liked_by_me,
            created_at: data.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    pub post: Post,
    pub replies: Vec<Post>,
}

impl Thread {
    pub fn from_response(res: ThreadResponse) -> Self {
        Self {
            post: Post::from_data(res.post),
            replies: res.replies.into_iter().map(Post::from_data).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    SignedIn(Profile),
    SignedOut,
    PostsLoaded(Vec<Post>),
    ThreadLoaded(Thread),
    PostRemoved(Uuid),
    LockToggled { post_id: Uuid, is_locked: bool },
    LikeSet { post_id: Uuid, liked: bool, likes_count: i64 },
    LockDescriptionDisabled,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub user: Option<Profile>,
    pub posts: Vec<Post>,
    pub thread: Option<Thread>,
}

pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::SignedIn(profile) => state.user = Some(profile),
        Action::SignedOut => *state = AppState::default(),
        Action::PostsLoaded(posts) => state.posts = posts,
        Action::ThreadLoaded(thread) => state.thread = Some(thread),
        Action::PostRemoved(post_id) => {
            state.posts.retain(|p| p.id != post_id);
            if let Some(thread) = &mut state.thread {
                if thread.post.id == post_id {
                    state.thread = None;
                } else {
                    thread.replies.retain(|p| p.id != post_id);
                }
            }
        }
        Action::LockToggled { post_id, is_locked } => {
            for_post(state, post_id, |p| p.is_locked = is_locked);
        }
        Action::LikeSet {
            post_id,
            liked,
            likes_count,
        } => {
            for_post(state, post_id, |p| {
                p.liked_by_me = liked;
                p.likes_count = likes_count;
            });
        }
        Action::LockDescriptionDisabled => {
            if let Some(user) = &mut state.user {
                user.need_description_about_lock = false;
            }
        }
    }
}

/// Apply a mutation to every copy of a post the state holds (timeline and
/// thread views carry independent copies).
fn for_post(state: &mut AppState, post_id: Uuid, f: impl Fn(&mut Post)) {
    for post in state.posts.iter_mut().filter(|p| p.id == post_id) {
        f(post);
    }
    if let Some(thread) = &mut state.thread {
        if thread.post.id == post_id {
            f(&mut thread.post);
        }
        for post in thread.replies.iter_mut().filter(|p| p.id == post_id) {
            f(post);
        }
    }
}

#[derive(Default)]
pub struct Store {
    state: Mutex<AppState>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, action: Action) {
        if let Ok(mut state) = self.state.lock() {
            reduce(&mut state, action);
        }
    }

    /// Snapshot of the whole state.
    pub fn state(&self) -> AppState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn current_user(&self) -> Option<Profile> {
        self.state().user
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state().posts
    }

    pub fn thread(&self) -> Option<Thread> {
        self.state().thread
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(n: u32) -> Post {
        Post {
            id: Uuid::from_u128(n as u128),
            userid: format!("handle{n}"),
            username: format!("user{n}"),
            icon_url: DEFAULT_ICON_URL.to_string(),
            content: Some(format!("post {n}")),
            image_url: None,
            is_locked: false,
            replied_post_id: None,
            likes_count: 0,
            liked_by_me: false,
            created_at: DateTime::default(),
        }
    }

    #[test]
    fn sign_out_resets_everything() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::SignedIn(Profile {
                userid: "handle1".into(),
                username: "user1".into(),
                icon_url: DEFAULT_ICON_URL.into(),
                need_description_about_lock: true,
            }),
        );
        reduce(&mut state, Action::PostsLoaded(vec![post(1)]));

        reduce(&mut state, Action::SignedOut);
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn post_removed_reconciles_timeline_and_thread() {
        let mut state = AppState::default();
        reduce(&mut state, Action::PostsLoaded(vec![post(1), post(2)]));
        reduce(
            &mut state,
            Action::ThreadLoaded(Thread {
                post: post(1),
                replies: vec![post(2)],
            }),
        );

        reduce(&mut state, Action::PostRemoved(Uuid::from_u128(2)));
        assert_eq!(state.posts.len(), 1);
        assert!(state.thread.as_ref().unwrap().replies.is_empty());

        // Removing the thread root drops the thread view entirely.
        reduce(&mut state, Action::PostRemoved(Uuid::from_u128(1)));
        assert!(state.posts.is_empty());
        assert!(state.thread.is_none());
    }

    #[test]
    fn like_updates_every_copy() {
        let mut state = AppState::default();
        reduce(&mut state, Action::PostsLoaded(vec![post(1)]));
        reduce(
            &mut state,
            Action::ThreadLoaded(Thread {
                post: post(1),
                replies: vec![],
            }),
        );

        reduce(
            &mut state,
            Action::LikeSet {
                post_id: Uuid::from_u128(1),
                liked: true,
                likes_count: 3,
            },
        );

        assert!(state.posts[0].liked_by_me);
        assert_eq!(state.posts[0].likes_count, 3);
        let thread = state.thread.unwrap();
        assert!(thread.post.liked_by_me);
        assert_eq!(thread.post.likes_count, 3);
    }

    #[test]
    fn lock_description_flag_clears_on_signed_in_user() {
        let mut state = AppState::default();
        reduce(&mut state, Action::LockDescriptionDisabled); // no user: no-op

        reduce(
            &mut state,
            Action::SignedIn(Profile {
                userid: "handle1".into(),
                username: "user1".into(),
                icon_url: DEFAULT_ICON_URL.into(),
                need_description_about_lock: true,
            }),
        );
        reduce(&mut state, Action::LockDescriptionDisabled);
        assert!(!state.user.unwrap().need_description_about_lock);
    }

    #[test]
    fn default_icon_substitution_happens_at_the_boundary() {
        let data = PostData {
            id: Uuid::from_u128(1),
            userid: "handle1".into(),
            username: "user1".into(),
            icon_url: None,
            content: Some("hello".into()),
            image_url: None,
            is_locked: false,
            replied_post_id: None,
            likes_count: 0,
            liked_by_me: false,
            created_at: DateTime::default(),
        };
        assert_eq!(Post::from_data(data).icon_url, DEFAULT_ICON_URL);
    }
}
