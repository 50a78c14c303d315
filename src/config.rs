//! Session manager configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Environment variable that overrides browser executable discovery.
pub const EXECUTABLE_PATH_ENV: &str = "PUPPETEER_EXECUTABLE_PATH";

/// Default candidate paths probed in order when the env override is unset.
pub const DEFAULT_EXECUTABLE_CANDIDATES: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/google-chrome",
];

/// Launch flags for the constrained container environment: sandboxing off,
/// single process, no GPU.
pub const LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--single-process",
    "--disable-gpu",
];

/// Configuration for [SessionManager](crate::SessionManager).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding serialized login-session state across restarts.
    pub data_dir: PathBuf,
    /// Client identifier keying the session directory (multi-session support).
    pub client_id: String,
    /// Retry ceiling for failed initialization attempts.
    pub max_retries: u32,
    /// First retry delay; doubled per attempt up to `retry_max_delay`.
    /// Set equal to `retry_max_delay` for a fixed interval.
    #[serde(with = "duration_secs")]
    pub retry_initial_delay: Duration,
    #[serde(with = "duration_secs")]
    pub retry_max_delay: Duration,
    /// Timeout for the automation client to come up after launch.
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
    /// Whether a recoverable disconnect after `Ready` triggers automatic
    /// re-initialization.
    pub reconnect_on_disconnect: bool,
    /// Ordered candidate executable paths (env override still wins).
    pub executable_candidates: Vec<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./sessions"),
            client_id: "client-1".to_string(),
            max_retries: 5,
            retry_initial_delay: Duration::from_secs(5),
            retry_max_delay: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(60),
            reconnect_on_disconnect: true,
            executable_candidates: DEFAULT_EXECUTABLE_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

impl SessionConfig {
    /// Backoff delay before retry attempt `n` (1-based), exponential with cap.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self
            .retry_initial_delay
            .saturating_mul(1u32 << shift);
        delay.min(self.retry_max_delay)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.client_id, "client-1");
        assert_eq!(cfg.data_dir, PathBuf::from("./sessions"));
        assert!(cfg.reconnect_on_disconnect);
        assert_eq!(cfg.executable_candidates.len(), 4);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let cfg = SessionConfig {
            retry_initial_delay: Duration::from_secs(5),
            retry_max_delay: Duration::from_secs(60),
            ..Default::default()
        };
        assert_eq!(cfg.backoff_delay(1), Duration::from_secs(5));
        assert_eq!(cfg.backoff_delay(2), Duration::from_secs(10));
        assert_eq!(cfg.backoff_delay(3), Duration::from_secs(20));
        assert_eq!(cfg.backoff_delay(4), Duration::from_secs(40));
        assert_eq!(cfg.backoff_delay(5), Duration::from_secs(60));
        assert_eq!(cfg.backoff_delay(12), Duration::from_secs(60));
    }

    #[test]
    fn fixed_interval_when_initial_equals_cap() {
        let cfg = SessionConfig {
            retry_initial_delay: Duration::from_secs(5),
            retry_max_delay: Duration::from_secs(5),
            ..Default::default()
        };
        assert_eq!(cfg.backoff_delay(1), Duration::from_secs(5));
        assert_eq!(cfg.backoff_delay(4), Duration::from_secs(5));
    }

    #[test]
    fn deserializes_from_json() {
        let cfg: SessionConfig = serde_json::from_str(
            r#"{"max_retries": 3, "retry_initial_delay": 2, "reconnect_on_disconnect": false}"#,
        )
        .unwrap();
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.retry_initial_delay, Duration::from_secs(2));
        assert!(!cfg.reconnect_on_disconnect);
    }
}
