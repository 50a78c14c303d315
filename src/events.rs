//! Event types emitted by the automation client.

/// Events emitted by the automation client's callback stream, consumed by the
/// session state machine as typed inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// New pairing QR token. Replaces any previous one; scan with
    /// WhatsApp Linked Devices.
    Qr { code: String },

    /// Pairing/login accepted; the QR code is no longer valid.
    Authenticated,

    /// Session is fully up; outbound sends are accepted from here on.
    Ready,

    /// Pairing/login rejected by the network.
    AuthFailure { reason: String },

    /// Transport dropped. `reason` is the automation layer's disconnect code.
    Disconnected { reason: String },
}

/// Disconnect reason the automation layer cannot recover from: its internal
/// page state is corrupted, so the client is torn down instead of reconnected.
pub const NAVIGATION_ERROR: &str = "NAVIGATION_ERROR";

impl SessionEvent {
    /// Whether this is a disconnect carrying the unrecoverable navigation code.
    pub fn is_fatal_disconnect(&self) -> bool {
        matches!(self, SessionEvent::Disconnected { reason } if reason == NAVIGATION_ERROR)
    }
}
