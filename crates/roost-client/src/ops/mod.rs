//! Operations: one request/response/dispatch cycle each. Pre-flight
//! validation failures never reach the network; request failures are
//! mapped to a user-facing message and never panic past this boundary.

mod posts;
mod users;

pub use posts::*;
pub use users::*;

/// An image picked by the user, carried as bytes plus the filename the
/// server derives the stored reference from.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}
