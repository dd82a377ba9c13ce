use thiserror::Error;

use causerie_api::ApiError;

/// Errors surfaced by the synchronizer to its caller.
///
/// Background refresh failures never appear here; they are logged and the
/// previous state is retained.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Realtime channel closed")]
    ChannelClosed,

    #[error("Message body is empty")]
    EmptyMessage,

    #[error("No open conversation")]
    NoOpenConversation,
}
