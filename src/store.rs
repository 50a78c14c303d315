//! On-disk login-session persistence.
//!
//! The automation client serializes its login state under a per-client
//! directory; keeping it across restarts skips re-pairing. This module only
//! manages the directory, the automation layer owns the file contents.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Auth-state directory for one client id.
#[derive(Clone, Debug)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store rooted at `data_dir`, keyed by `client_id`
    /// (`<data_dir>/session-<client_id>`).
    pub fn new(data_dir: impl AsRef<Path>, client_id: &str) -> Self {
        Self {
            dir: data_dir.as_ref().join(format!("session-{client_id}")),
        }
    }

    /// Directory handed to the automation client at launch.
    pub fn auth_dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a previous login left serialized state behind.
    pub fn has_session(&self) -> bool {
        self.dir
            .read_dir()
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// Create the directory if needed.
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Store(format!("create {}: {e}", self.dir.display())))
    }

    /// Wipe saved state (logout / unpair).
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)
                .map_err(|e| Error::Store(format!("clear {}: {e}", self.dir.display())))?;
        }
        Ok(())
    }
}
