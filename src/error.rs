use thiserror::Error;

/// Why an inbound frame was discarded.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object (got {0})")]
    NotObject(&'static str),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("websocket initialization failed: {0}")]
    Init(#[source] std::io::Error),
    #[error("connect to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
    #[error("websocket read failed: {0}")]
    Read(#[source] Box<tungstenite::Error>),
}
