//! Realtime channel adapter.
//!
//! Bridges the synchronizer's intents to websocket emissions and inbound
//! frames to synchronizer callbacks. The connection runs in a dedicated
//! tokio task; external code talks to it through typed command and event
//! channels, keeping the transport fully asynchronous and decoupled.
//!
//! The connection is process-wide and outlives any single conversation
//! selection. Room membership is re-asserted on every selection and old
//! rooms are never left; stale-room delivery is filtered by the
//! synchronizer's conversation-id checks, not here.

pub mod channel;
pub mod error;
pub mod wire;

pub use channel::{spawn_channel, ChannelCommand, ChannelEvent};
pub use error::ChannelError;
pub use wire::{Inbound, Outbound};
