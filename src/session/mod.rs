//! Session manager.
//!
//! Owns the one process-wide automation client and drives it through the
//! connection/authentication state machine. Constructed once at startup and
//! handed to the HTTP layer as a cloneable handle; there are no module-level
//! globals.

mod send;

pub use send::{Attachment, OutboundMessage, DEFAULT_BODY, DEFAULT_FILENAME};

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::automation::{AutomationClient, BrowserAutomation, LaunchOptions, SendReceipt};
use crate::config::{SessionConfig, LAUNCH_ARGS};
use crate::error::{Error, Result};
use crate::events::SessionEvent;
use crate::locator::{ExecutableLocator, SystemLocator};
use crate::qr::{QrBroadcaster, QrPayload};
use crate::state::{self, Effect, SessionState};
use crate::store::SessionStore;
use crate::types::ChatId;

/// Status snapshot for the HTTP layer. Pure read, no side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SessionStatus {
    pub ready: bool,
    pub retry_count: u32,
    pub max_retries: u32,
}

struct Inner {
    config: SessionConfig,
    locator: Arc<dyn ExecutableLocator>,
    client: Arc<dyn AutomationClient>,
    store: SessionStore,
    // Readiness and the retry counter are last-writer-wins under concurrent
    // callers, same as the watch state; no compare-and-swap coordination.
    state: watch::Sender<SessionState>,
    retry_count: AtomicU32,
    /// Guards against a second connect task racing in before the state
    /// flips to `Connecting`.
    connecting: AtomicBool,
    /// Most recent failure reason, for operator-facing status.
    last_error: Mutex<Option<Error>>,
    qr: QrBroadcaster,
}

/// Handle to the one process-wide session. Cloning shares the session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Manager with injected automation client and executable locator.
    pub fn new(
        config: SessionConfig,
        client: Arc<dyn AutomationClient>,
        locator: Arc<dyn ExecutableLocator>,
    ) -> Self {
        let store = SessionStore::new(&config.data_dir, &config.client_id);
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            inner: Arc::new(Inner {
                config,
                locator,
                client,
                store,
                state,
                retry_count: AtomicU32::new(0),
                connecting: AtomicBool::new(false),
                last_error: Mutex::new(None),
                qr: QrBroadcaster::new(),
            }),
        }
    }

    /// Production wiring: browser process client, filesystem locator.
    pub fn with_browser(config: SessionConfig) -> Self {
        let locator = Arc::new(SystemLocator::new(config.executable_candidates.clone()));
        Self::new(config, Arc::new(BrowserAutomation::new()), locator)
    }

    /// Start (or restart) the session. Idempotent: a call while already
    /// `Ready` or mid-connect is a no-op, observable only in the log.
    /// Connect failures retry with capped backoff up to the configured
    /// ceiling, then the session goes terminally `Failed`.
    pub fn initialize(&self) {
        Inner::spawn_init(&self.inner);
    }

    /// Readiness-gated send. Fails with [Error::NotReady] before any
    /// transport call unless the session is `Ready`. A transport error of
    /// the session-drop class flips readiness and triggers one automatic
    /// re-initialization; the original error still reaches the caller.
    pub async fn send_message(&self, message: OutboundMessage) -> Result<SendReceipt> {
        let inner = &self.inner;
        if *inner.state.borrow() != SessionState::Ready {
            return Err(Error::NotReady);
        }
        if message.phone.is_empty() {
            return Err(Error::Other(anyhow::anyhow!(
                "recipient phone number is empty"
            )));
        }

        let chat = ChatId::from_phone(&message.phone);
        let result = match &message.attachment {
            Some(attachment) => {
                let media = send::resolve_media(attachment, message.filename.as_deref()).await?;
                inner.client.send_media(&chat, &media, &message.body).await
            }
            None => inner.client.send_text(&chat, &message.body).await,
        };

        match result {
            Ok(receipt) => {
                debug!(to = %chat, id = %receipt.id, "message accepted by transport");
                Ok(receipt)
            }
            Err(e) if e.is_session_drop() => {
                warn!(to = %chat, error = %e, "session dropped under a send, re-initializing");
                inner.state.send_replace(SessionState::Disconnected);
                Inner::spawn_init(inner);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// `{ready, retry_count, max_retries}` snapshot.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            ready: *self.inner.state.borrow() == SessionState::Ready,
            retry_count: self.inner.retry_count.load(Ordering::SeqCst),
            max_retries: self.inner.config.max_retries,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Most recent recorded failure (auth failure, exhausted retries,
    /// navigation fault), rendered for operator-facing status.
    pub fn last_error(&self) -> Option<String> {
        self.inner
            .last_error
            .lock()
            .unwrap()
            .as_ref()
            .map(|e| e.to_string())
    }

    /// Observe state changes (the demo exits nonzero on `Failed`).
    pub fn state_watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Latest pairing QR, `None` when no code is pending.
    pub fn latest_qr(&self) -> Option<QrPayload> {
        self.inner.qr.latest()
    }

    /// Observe QR changes.
    pub fn qr_watch(&self) -> watch::Receiver<Option<QrPayload>> {
        self.inner.qr.subscribe()
    }

    /// Scoped teardown of the client. Used by the interrupt handler; the
    /// caller maps the result to the process exit code.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutting down session");
        let result = self.inner.client.destroy().await;
        self.inner.qr.clear();
        self.inner.state.send_replace(SessionState::Uninitialized);
        result
    }
}

impl Inner {
    /// Start the connect task unless one is in flight or the session is up.
    fn spawn_init(inner: &Arc<Inner>) {
        if inner.state.borrow().is_connecting_or_ready() {
            debug!("initialize: already ready or connecting, ignoring");
            return;
        }
        if inner.connecting.swap(true, Ordering::SeqCst) {
            debug!("initialize: connect task already in flight, ignoring");
            return;
        }
        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            Inner::run_init(&inner).await;
            inner.connecting.store(false, Ordering::SeqCst);
        });
    }

    /// Connect with retries up to the ceiling.
    async fn run_init(inner: &Arc<Inner>) {
        loop {
            inner.state.send_replace(SessionState::Connecting);
            match Inner::attempt(inner).await {
                Ok(events) => {
                    let pump_inner = Arc::clone(inner);
                    tokio::spawn(async move {
                        Inner::pump(&pump_inner, events).await;
                    });
                    return;
                }
                Err(e) => {
                    let attempt = inner.retry_count.fetch_add(1, Ordering::SeqCst) + 1;
                    let max = inner.config.max_retries;
                    if attempt >= max {
                        error!(error = %e, attempt, max, "initialization failed, retry ceiling reached");
                        *inner.last_error.lock().unwrap() = Some(e);
                        inner.state.send_replace(SessionState::Failed);
                        return;
                    }
                    let delay = inner.config.backoff_delay(attempt);
                    warn!(
                        error = %e,
                        "initialization failed, retrying in {:?} (attempt {}/{})",
                        delay, attempt, max
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One launch attempt: locate the executable, then start the client.
    async fn attempt(
        inner: &Arc<Inner>,
    ) -> Result<tokio::sync::mpsc::Receiver<SessionEvent>> {
        let executable = inner.locator.locate()?;
        inner.store.ensure()?;
        let opts = LaunchOptions {
            executable,
            args: LAUNCH_ARGS.iter().map(|s| s.to_string()).collect(),
            headless: true,
            connect_timeout: inner.config.connect_timeout,
            auth_dir: inner.store.auth_dir().to_path_buf(),
        };
        inner.client.launch(opts).await
    }

    /// Feed automation events through the state machine and run the effects.
    async fn pump(inner: &Arc<Inner>, mut events: tokio::sync::mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            let current = *inner.state.borrow();
            let (next, effects) = state::apply(current, &event);
            debug!(?current, ?event, ?next, "session event");
            inner.state.send_replace(next);

            for effect in effects {
                match effect {
                    Effect::PublishQr { code } => match QrPayload::render(&code) {
                        Ok(payload) => {
                            info!("pairing QR regenerated, scan with WhatsApp Linked Devices");
                            inner.qr.publish(payload);
                        }
                        // Render failures are logged, not fatal; the next
                        // regeneration gets another chance.
                        Err(e) => warn!(error = %e, "failed to render pairing QR"),
                    },
                    Effect::ClearQr => {
                        info!("authentication successful");
                        inner.qr.clear();
                    }
                    Effect::ResetRetries => {
                        info!("session ready");
                        inner.retry_count.store(0, Ordering::SeqCst);
                    }
                    Effect::CountAuthFailure { reason } => {
                        let attempt = inner.retry_count.fetch_add(1, Ordering::SeqCst) + 1;
                        let max = inner.config.max_retries;
                        warn!(%reason, attempt, max, "authentication failure");
                        *inner.last_error.lock().unwrap() = Some(Error::AuthFailure(reason));
                        if attempt >= max {
                            error!("auth failure ceiling reached, giving up");
                            if let Err(e) = inner.client.destroy().await {
                                warn!(error = %e, "teardown after auth failures");
                            }
                            inner.state.send_replace(SessionState::Failed);
                            return;
                        }
                    }
                    Effect::Reconnect => {
                        if inner.config.reconnect_on_disconnect {
                            info!("disconnected after ready, re-initializing");
                            Inner::spawn_init(inner);
                        } else {
                            warn!("disconnected after ready, reconnect policy disabled");
                        }
                        return;
                    }
                    Effect::FatalTeardown { reason } => {
                        error!(%reason, "unrecoverable navigation fault, tearing down");
                        *inner.last_error.lock().unwrap() =
                            Some(Error::UnrecoverableNavigation(reason));
                        if let Err(e) = inner.client.destroy().await {
                            warn!(error = %e, "teardown after navigation fault");
                        }
                        // State is already Failed; the host process observes
                        // it and exits nonzero. No reconnect.
                        return;
                    }
                }
            }
        }
        debug!("automation event stream closed");
    }
}
