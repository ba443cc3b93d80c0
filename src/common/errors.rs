use thiserror::Error;

/// Failures talking to the remote media server.
///
/// All of these are transient from the monitor's point of view: the
/// registry keeps its tracked state unchanged and retries next cycle.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {status} for {path}")]
    Status { status: u16, path: String },

    #[error("malformed payload from {path}: {detail}")]
    Payload { path: String, detail: String },

    #[error("invalid server configuration: {0}")]
    Config(String),
}

impl TransportError {
    pub fn payload(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Payload {
            path: path.into(),
            detail: detail.into(),
        }
    }
}
