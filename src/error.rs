use thiserror::Error;

/// Library result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when driving the session or sending messages.
#[derive(Error, Debug)]
pub enum Error {
    /// No browser executable was found in any candidate location.
    #[error("browser executable not found (checked env override and candidate paths)")]
    ExecutableNotFound,

    /// The session is not in the `Ready` state; no transport call was made.
    #[error("session is not ready")]
    NotReady,

    #[error("attachment: {0}")]
    Attachment(#[from] AttachmentError),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("launch: {0}")]
    Launch(#[from] LaunchError),

    /// Pairing/authentication was rejected by the messaging network.
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// The automation layer hit a navigation fault it cannot recover from.
    /// The client is torn down and no reconnect is attempted.
    #[error("unrecoverable navigation fault: {0}")]
    UnrecoverableNavigation(String),

    #[error("session store: {0}")]
    Store(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether this error indicates the underlying session silently dropped
    /// (the "evaluation failed" / "not connected" class). The dispatcher
    /// reacts to these by flipping readiness and re-initializing before
    /// re-raising the error.
    pub fn is_session_drop(&self) -> bool {
        match self {
            Error::Transport(TransportError::Dropped(_)) => true,
            Error::Transport(TransportError::Send(msg)) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("evaluation failed") || msg.contains("not connected")
            }
            _ => false,
        }
    }
}

/// Failures while reading a filesystem attachment.
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("read failed for {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures on the automation transport after launch.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The underlying session dropped out from under us.
    #[error("session dropped: {0}")]
    Dropped(String),

    #[error("send failed: {0}")]
    Send(String),
}

/// Failures while starting the automation client.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("spawn failed: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("browser exited during startup with status {0}")]
    ExitedEarly(String),

    #[error("timed out after {0:?} waiting for the browser to come up")]
    Timeout(std::time::Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_drop_classification() {
        let dropped = Error::Transport(TransportError::Dropped("page gone".into()));
        assert!(dropped.is_session_drop());

        let eval = Error::Transport(TransportError::Send("Evaluation failed: x".into()));
        assert!(eval.is_session_drop());

        let nc = Error::Transport(TransportError::Send("client not connected".into()));
        assert!(nc.is_session_drop());

        let other = Error::Transport(TransportError::Send("rate limited".into()));
        assert!(!other.is_session_drop());
        assert!(!Error::NotReady.is_session_drop());
    }
}
