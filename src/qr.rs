//! Pairing QR broadcaster.
//!
//! Single producer (the session manager), any number of consumers (e.g. an
//! HTTP polling endpoint). Only the latest value is retained: a regenerated
//! QR replaces the previous one, and login clears it. A late consumer sees
//! "no code yet" or the current code, never history.

use base64::Engine;
use qrcode::render::svg;
use qrcode::QrCode;
use tokio::sync::watch;

/// The current pairing challenge: raw token plus its rendered image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrPayload {
    /// Opaque pairing token as delivered by the automation client.
    pub code: String,
    /// `data:` URL of the rendered QR image, servable as-is.
    pub image_data_url: String,
}

impl QrPayload {
    /// Render a pairing token into a payload (SVG wrapped in a data URL).
    pub fn render(code: impl Into<String>) -> crate::Result<Self> {
        let code = code.into();
        let qr = QrCode::new(code.as_bytes())
            .map_err(|e| anyhow::anyhow!("QR encode failed: {e}"))?;
        let image = qr
            .render::<svg::Color>()
            .min_dimensions(256, 256)
            .build();
        let encoded = base64::engine::general_purpose::STANDARD.encode(image.as_bytes());
        Ok(Self {
            code,
            image_data_url: format!("data:image/svg+xml;base64,{encoded}"),
        })
    }
}

/// Latest-value QR topic.
pub struct QrBroadcaster {
    tx: watch::Sender<Option<QrPayload>>,
}

impl QrBroadcaster {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Publish a new payload, replacing any previous one.
    pub fn publish(&self, payload: QrPayload) {
        self.tx.send_replace(Some(payload));
    }

    /// Clear the current payload (login accepted, token no longer valid).
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Snapshot of the current payload, `None` when no code is pending.
    pub fn latest(&self) -> Option<QrPayload> {
        self.tx.borrow().clone()
    }

    /// Subscribe for change notifications (HTTP long-poll style consumers).
    pub fn subscribe(&self) -> watch::Receiver<Option<QrPayload>> {
        self.tx.subscribe()
    }
}

impl Default for QrBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
