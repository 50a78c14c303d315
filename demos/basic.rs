//! Basic demo: boot the session manager, watch its lifecycle, shut down on
//! Ctrl-C.
//!
//! Run with: `cargo run --example basic`

use whatsapp_session::{SessionConfig, SessionManager, SessionState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::try_init().ok();

    let manager = SessionManager::with_browser(SessionConfig::default());
    manager.initialize();

    let mut states = manager.state_watch();
    let mut qr = manager.qr_watch();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Shutting down gracefully...");
                let code = match manager.shutdown().await {
                    Ok(()) => 0,
                    Err(e) => {
                        eprintln!("Teardown failed: {e}");
                        1
                    }
                };
                std::process::exit(code);
            }
            changed = qr.changed() => {
                changed?;
                if let Some(payload) = qr.borrow_and_update().clone() {
                    println!("Pairing QR available ({} bytes), scan with Linked Devices.",
                        payload.image_data_url.len());
                }
            }
            changed = states.changed() => {
                changed?;
                let state = *states.borrow_and_update();
                println!("Session state: {state:?}");
                if state == SessionState::Ready {
                    let status = manager.status();
                    println!("Ready (retries {}/{}).", status.retry_count, status.max_retries);
                }
                if state == SessionState::Failed {
                    // Retry ceiling reached or unrecoverable fault: fail fast.
                    match manager.last_error() {
                        Some(reason) => eprintln!("Session failed: {reason}"),
                        None => eprintln!("Session failed."),
                    }
                    std::process::exit(1);
                }
            }
        }
    }
}
