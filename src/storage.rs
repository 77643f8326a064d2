use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Key the session token is stored under, matching the request/response header
pub const SESSION_KEY: &str = "X-Session-Id";

/// Persistent home of the session token assigned by the answering service.
///
/// The token is written once and then only read: `set_if_absent` never
/// replaces a token that is already stored.
pub trait SessionStore: Send + Sync {
    /// Currently stored token, if any
    fn get(&self) -> Option<String>;

    /// Store `value` unless a token already exists. Returns whether it was written.
    fn set_if_absent(&self, value: &str) -> Result<bool>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    #[serde(rename = "X-Session-Id")]
    session_id: String,
}

/// Session token kept in a small JSON file, `{"X-Session-Id": "..."}`
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        FileSessionStore { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .context("Failed to read session file")?;
        let stored: StoredSession = serde_json::from_str(&content)
            .context("Failed to parse session file")?;

        if stored.session_id.is_empty() {
            Ok(None)
        } else {
            Ok(Some(stored.session_id))
        }
    }

    fn write(&self, session_id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create session directory")?;
        }

        let stored = StoredSession {
            session_id: session_id.to_string(),
        };
        let content = serde_json::to_string_pretty(&stored)
            .context("Failed to serialize session")?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .context("Failed to write session file")?;
        fs::rename(&tmp_path, &self.path)
            .context("Failed to move session file into place")?;

        Ok(())
    }

    /// Forget the stored token. Returns whether there was one to remove.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }

        fs::remove_file(&self.path)
            .context("Failed to remove session file")?;
        Ok(true)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<String> {
        match self.read() {
            Ok(session_id) => session_id,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "ignoring unreadable session file: {:#}",
                    e
                );
                None
            }
        }
    }

    fn set_if_absent(&self, value: &str) -> Result<bool> {
        if self.get().is_some() {
            return Ok(false);
        }

        self.write(value)?;
        Ok(true)
    }
}

/// Process-local session store, used when nothing should touch the disk
#[derive(Default)]
pub struct MemorySessionStore {
    session_id: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session_id: impl Into<String>) -> Self {
        MemorySessionStore {
            session_id: Mutex::new(Some(session_id.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<String> {
        self.session_id
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn set_if_absent(&self, value: &str) -> Result<bool> {
        let mut guard = self
            .session_id
            .lock()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;

        if guard.is_some() {
            return Ok(false);
        }

        *guard = Some(value.to_string());
        Ok(true)
    }
}
