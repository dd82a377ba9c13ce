use thiserror::Error;

/// Errors produced by the API client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected the bearer credential (401/403). Callers are
    /// expected to drop to the sign-in flow, never to render partial UI.
    #[error("Authentication rejected by the backend")]
    Auth,

    /// Non-success HTTP status outside the auth range.
    #[error("API returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// Transport-level failure or undecodable response body.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// No credential available for the request.
    #[error("Missing credential: {0}")]
    Credential(String),

    /// Media upload larger than the backend accepts.
    #[error("Upload too large: {size} bytes (max {max})")]
    UploadTooLarge { size: usize, max: usize },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;
