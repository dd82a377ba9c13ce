//! # causerie-sync
//!
//! The chat state synchronizer: owns the in-memory view model for the
//! conversation roster and the open conversation, merging REST snapshots
//! with the realtime event stream into a consistent, render-ready state.
//!
//! The core is split in two layers:
//!
//! - [`SyncState`] is a pure state machine. Remote events go in through
//!   [`SyncState::apply`]; side effects come out as [`Effect`] values.
//!   Nothing in this layer performs I/O, which is what makes the merge
//!   semantics directly testable.
//! - [`Synchronizer`] drives the state against the API client and the
//!   realtime channel: it executes effects, discards stale snapshots via a
//!   generation counter, and swallows (but logs) background refresh
//!   failures so the UI never hard-fails after a successful initial load.

pub mod error;
pub mod search;
pub mod session;
pub mod state;
pub mod sync;
pub mod typing;

pub use error::SyncError;
pub use search::MessageSearch;
pub use session::Session;
pub use state::{ConversationView, Effect, LoadState, OpenConversation, PeerHeader, SyncState};
pub use sync::Synchronizer;
pub use typing::TypingDebouncer;
