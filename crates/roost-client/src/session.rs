//! Credential-triple persistence. The triple is one value: stores swap or
//! drop all three parts together, never a subset.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub client: String,
    pub uid: String,
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<Credentials>;
    fn save(&self, creds: &Credentials);
    fn clear(&self);
}

/// In-memory store, mainly for tests and short-lived tools.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Option<Credentials>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Option<Credentials> {
        self.inner.lock().ok()?.clone()
    }

    fn save(&self, creds: &Credentials) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(creds.clone());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = None;
        }
    }
}

/// JSON file store, the cookie replacement. Writes go through a temp
/// file and rename so a crash never leaves a partial triple behind.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Option<Credentials> {
        let bytes = std::fs::read(&self.path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(creds) => Some(creds),
            Err(e) => {
                warn!("Unreadable session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, creds: &Credentials) {
        let tmp = self.path.with_extension("tmp");
        let result = serde_json::to_vec_pretty(creds)
            .map_err(std::io::Error::other)
            .and_then(|bytes| std::fs::write(&tmp, bytes))
            .and_then(|_| std::fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            warn!("Failed to persist session to {}: {}", self.path.display(), e);
        }
    }

    fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to clear session at {}: {}", self.path.display(), e);
            }
        }
    }
}
