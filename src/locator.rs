//! Browser executable discovery.
//!
//! Probing order: the `PUPPETEER_EXECUTABLE_PATH` override, then the
//! configured candidate list; first existing path wins. Injected as a
//! capability so tests can stub it without touching the filesystem.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::EXECUTABLE_PATH_ENV;
use crate::error::{Error, Result};

/// Locates the browser executable the automation client will launch.
pub trait ExecutableLocator: Send + Sync {
    /// First existing, accessible executable path, or [Error::ExecutableNotFound].
    fn locate(&self) -> Result<PathBuf>;
}

/// Production locator: env override plus an ordered candidate list.
pub struct SystemLocator {
    candidates: Vec<PathBuf>,
}

impl SystemLocator {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    fn probe(path: &Path) -> bool {
        path.is_file()
    }
}

impl ExecutableLocator for SystemLocator {
    fn locate(&self) -> Result<PathBuf> {
        if let Ok(value) = std::env::var(EXECUTABLE_PATH_ENV) {
            let path = PathBuf::from(&value);
            if Self::probe(&path) {
                debug!(path = %path.display(), "using browser executable from env override");
                return Ok(path);
            }
            warn!(
                path = %value,
                "{} set but no executable found there, probing candidates",
                EXECUTABLE_PATH_ENV
            );
        }

        for candidate in &self.candidates {
            if Self::probe(candidate) {
                debug!(path = %candidate.display(), "found browser executable");
                return Ok(candidate.clone());
            }
        }

        Err(Error::ExecutableNotFound)
    }
}

/// Fixed-answer locator for tests and pre-resolved deployments.
pub struct StaticLocator {
    path: Option<PathBuf>,
}

impl StaticLocator {
    /// Always resolves to `path`.
    pub fn resolved(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Always fails with [Error::ExecutableNotFound].
    pub fn missing() -> Self {
        Self { path: None }
    }
}

impl ExecutableLocator for StaticLocator {
    fn locate(&self) -> Result<PathBuf> {
        self.path.clone().ok_or(Error::ExecutableNotFound)
    }
}
