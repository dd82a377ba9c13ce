//! # causerie-api
//!
//! Authenticated REST client for the Causerie backend. One module per
//! backend resource (auth, chats, groups, users, media), all hanging off a
//! single [`ApiClient`] that attaches a bearer credential to every call.
//!
//! The dual-field conversation-id compatibility (creation responses carry
//! `id`, list responses carry `chat_id`) is normalized at this boundary, so
//! the rest of the application only ever sees canonical ids.

pub mod auth;
pub mod chats;
pub mod client;
pub mod error;
pub mod groups;
pub mod media;
pub mod users;

pub use auth::{StaticToken, TokenProvider};
pub use chats::StartedChat;
pub use client::ApiClient;
pub use error::{ApiError, Result};
pub use users::{Profile, ProfileUpdate};
