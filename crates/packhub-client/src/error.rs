use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to server: {0}")]
    Network(#[from] reqwest::Error),
    /// The server answered with an error envelope; the message is its
    /// `error` field verbatim.
    #[error("{0}")]
    Api(String),
    #[error("channel not found")]
    UnknownChannel,
    #[error("channel has no token; register on it first")]
    NotAuthenticated,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
