//! Client library for the roost API: a thin HTTP wrapper that carries the
//! credential triple, a typed application store, and one operation per
//! user-visible interaction. Operations perform a single request, map
//! failures to user-facing messages, and dispatch state updates.

pub mod error;
pub mod http;
pub mod messages;
pub mod ops;
pub mod session;
pub mod state;
pub mod validate;

pub use error::ClientError;
pub use http::ApiClient;
pub use session::{Credentials, FileStore, MemoryStore, SessionStore};
pub use state::{Action, AppState, Post, Profile, Store, Thread};
