//! # whatsapp-session
//!
//! Session lifecycle wrapper for a browser-automated WhatsApp Web client.
//!
//! ## Features
//!
//! - One process-wide session driven through an explicit state machine
//!   (uninitialized → awaiting QR scan → authenticated → ready)
//! - QR pairing with a latest-value broadcast of the rendered code
//! - Readiness-gated sends (text, or attachment with caption)
//! - Capped-backoff retries up to a ceiling, self-healing reconnect
//! - On-disk login-session persistence across restarts
//!
//! ## Example
//!
//! ```ignore
//! use whatsapp_session::{OutboundMessage, SessionConfig, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = SessionManager::with_browser(SessionConfig::default());
//!     manager.initialize();
//!     // ... once ready:
//!     manager
//!         .send_message(OutboundMessage::new("919999999999").body("Report"))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod automation;
pub mod config;
pub mod error;
pub mod events;
pub mod locator;
pub mod qr;
pub mod session;
pub mod state;
pub mod store;
pub mod types;

pub use automation::{AutomationClient, BrowserAutomation, LaunchOptions, Media, SendReceipt};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use locator::{ExecutableLocator, StaticLocator, SystemLocator};
pub use qr::{QrBroadcaster, QrPayload};
pub use session::{Attachment, OutboundMessage, SessionManager, SessionStatus};
pub use state::SessionState;
pub use store::SessionStore;
pub use types::{ChatId, MessageId};
