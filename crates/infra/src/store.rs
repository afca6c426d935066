//! File-backed session store
//!
//! Cross-step connect state has to outlive a single run, so the store is
//! a JSON map persisted next to the app data: loaded once at startup,
//! written through on every change.
//! The store port is infallible, so persistence failures are logged and
//! the in-memory view stays authoritative for the session.

use std::collections::HashMap;
use std::path::PathBuf;

use monart_core::ports::SessionStore;
use parking_lot::Mutex;
use tracing::{debug, warn};

pub struct FileSessionStore {
    path: PathBuf,
    data: Mutex<HashMap<String, String>>,
}

impl FileSessionStore {
    /// Open the store at `path`, loading any previously persisted state
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "session file unreadable; starting empty");
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read session file; starting empty");
                HashMap::new()
            }
        };

        debug!(path = %path.display(), entries = data.len(), "session store opened");
        Self { path, data: Mutex::new(data) }
    }

    fn persist(&self, data: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(data) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to serialize session state");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %err, "failed to create session directory");
                return;
            }
        }

        if let Err(err) = std::fs::write(&self.path, json) {
            warn!(path = %self.path.display(), error = %err, "failed to persist session state");
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut data = self.data.lock();
        data.insert(key.to_string(), value.to_string());
        self.persist(&data);
    }

    fn remove(&self, key: &str) {
        let mut data = self.data.lock();
        if data.remove(key).is_some() {
            self.persist(&data);
        }
    }
}
