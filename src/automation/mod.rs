//! Automation client boundary.
//!
//! The session manager drives one browser-automation client through this
//! trait. Production uses [BrowserAutomation]; tests inject a scripted fake
//! and feed synthetic events through the returned channel.

mod browser;

pub use browser::BrowserAutomation;

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::Digest;
use tokio::sync::mpsc;

use crate::events::SessionEvent;
use crate::types::{ChatId, MessageId};
use crate::Result;

/// Launch parameters for the automation client.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    /// Resolved browser executable.
    pub executable: PathBuf,
    /// Fixed flag set (sandboxing off, single process, no GPU).
    pub args: Vec<String>,
    pub headless: bool,
    /// Bound on the client coming up after spawn.
    pub connect_timeout: Duration,
    /// Directory with serialized login state (skips re-pairing when present).
    pub auth_dir: PathBuf,
}

/// An outbound media attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Media {
    /// Declared media type, e.g. `application/pdf`.
    pub mime: String,
    pub data: Bytes,
    pub filename: String,
}

/// Transport acceptance of an outbound message (not guaranteed delivery).
#[derive(Clone, Debug)]
pub struct SendReceipt {
    pub id: MessageId,
    pub timestamp: SystemTime,
    pub to: ChatId,
}

/// One logical browser-automation client.
#[async_trait]
pub trait AutomationClient: Send + Sync {
    /// Start the client. Events from the underlying session arrive on the
    /// returned channel until the client is destroyed or drops.
    async fn launch(&self, opts: LaunchOptions) -> Result<mpsc::Receiver<SessionEvent>>;

    /// Send a plain text message.
    async fn send_text(&self, to: &ChatId, body: &str) -> Result<SendReceipt>;

    /// Send an attachment with a caption.
    async fn send_media(&self, to: &ChatId, media: &Media, caption: &str) -> Result<SendReceipt>;

    /// Tear the client down, releasing its resources. Idempotent.
    async fn destroy(&self) -> Result<()>;
}

/// Generate a WhatsApp-style message ID (3EB0 + hex of hash).
pub fn generate_message_id() -> MessageId {
    let mut data = Vec::with_capacity(8 + 5 + 16);
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    data.extend_from_slice(&t.to_be_bytes());
    data.extend_from_slice(b"@c.us");
    data.extend_from_slice(&rand::random::<[u8; 16]>());
    let hash = sha2::Sha256::digest(&data);
    format!("3EB0{}", hex::encode(&hash[..9]).to_uppercase())
}
