use thiserror::Error;

/// Errors produced by the realtime channel.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Websocket transport failure (connect or I/O).
    #[error("Transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame could not be encoded or decoded as JSON.
    #[error("Frame codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// An inbound frame named an event this client does not know.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),
}
