/// Application name
pub const APP_NAME: &str = "Causerie";

/// Trailing-edge debounce window for local typing signals, in milliseconds.
pub const TYPING_DEBOUNCE_MS: u64 = 300;

/// Number of attempts for the initial roster load before the UI is shown a
/// visible failure state.
pub const INIT_RETRY_ATTEMPTS: u32 = 3;

/// Delay between initial-load retry attempts, in milliseconds.
pub const INIT_RETRY_DELAY_MS: u64 = 750;

/// Default REST API base URL for local development.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Default realtime channel URL for local development.
pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:5000/ws";

/// Per-request timeout for REST calls, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum media upload size in bytes (10 MiB).
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;
