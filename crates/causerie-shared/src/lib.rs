//! # causerie-shared
//!
//! Domain types and constants shared by every Causerie crate: user and
//! conversation identifiers, messages, presence and typing signals, and the
//! roster entries rendered in the sidebar.
//!
//! All types are `serde`-derived and wire-faithful to the backend's JSON:
//! REST payloads use `snake_case`, realtime payloads use `camelCase` where
//! the backend does.

pub mod constants;
pub mod types;

pub use types::{
    ChatEntry, ChatId, ConversationKey, DeliveryStatus, GroupEntry, GroupId, GroupMember,
    Identity, Message, MessageBody, MessageKind, Presence, TypingSignal, UserRef,
};
