//! Connection/authentication state machine.
//!
//! Transitions are pure: `apply` maps `(state, event)` to the next state plus
//! a list of effects for the session manager to execute. This keeps the
//! machine testable with synthetic events, no browser backend needed.

use crate::events::SessionEvent;

/// Lifecycle state of the one process-wide session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No connect attempt has been made yet.
    Uninitialized,
    /// A connect attempt is in flight, no QR seen yet.
    Connecting,
    /// Waiting for the pairing QR to be scanned.
    AwaitingQrScan,
    /// Login accepted, session not yet fully up.
    Authenticated,
    /// Outbound sends are accepted.
    Ready,
    /// Transport dropped after being up; reconnect may be in progress.
    Disconnected,
    /// Terminal: retry ceiling reached or unrecoverable fault. Requires
    /// external re-invocation.
    Failed,
}

impl SessionState {
    /// States in which `initialize` is a no-op because an attempt is already
    /// in flight or the session is already up.
    pub fn is_connecting_or_ready(&self) -> bool {
        matches!(
            self,
            SessionState::Connecting
                | SessionState::AwaitingQrScan
                | SessionState::Authenticated
                | SessionState::Ready
        )
    }
}

/// Side effects requested by a transition, executed by the session manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Render and publish a new pairing QR.
    PublishQr { code: String },
    /// Drop the published QR (login accepted).
    ClearQr,
    /// Reset the retry counter to zero.
    ResetRetries,
    /// Count an authentication failure toward the retry ceiling.
    CountAuthFailure { reason: String },
    /// Re-initialize after a recoverable disconnect.
    Reconnect,
    /// Destroy the client and stop; no reconnect.
    FatalTeardown { reason: String },
}

/// Apply one event to the machine.
pub fn apply(state: SessionState, event: &SessionEvent) -> (SessionState, Vec<Effect>) {
    match event {
        SessionEvent::Qr { code } => (
            SessionState::AwaitingQrScan,
            vec![Effect::PublishQr { code: code.clone() }],
        ),
        SessionEvent::Authenticated => (SessionState::Authenticated, vec![Effect::ClearQr]),
        SessionEvent::Ready => (SessionState::Ready, vec![Effect::ResetRetries]),
        SessionEvent::AuthFailure { reason } => (
            // Stays pre-ready; the manager decides whether to retry.
            state,
            vec![Effect::CountAuthFailure {
                reason: reason.clone(),
            }],
        ),
        SessionEvent::Disconnected { reason } => {
            if event.is_fatal_disconnect() {
                return (
                    SessionState::Failed,
                    vec![Effect::FatalTeardown {
                        reason: reason.clone(),
                    }],
                );
            }
            let effects = if state == SessionState::Ready {
                vec![Effect::Reconnect]
            } else {
                Vec::new()
            };
            (SessionState::Disconnected, effects)
        }
    }
}
