//! JSON wire framing for the realtime channel.
//!
//! Every frame is an envelope `{"event": <name>, "data": <payload>}`.
//! Outbound frames are serialized through serde's adjacent tagging.
//! Inbound frames are decoded by hand from the envelope so that events
//! whose payload this client ignores (`chatUpdated`, `messageSeen`) decode
//! whether or not the server attached data.

use serde::{Deserialize, Serialize};

use causerie_shared::{ChatId, GroupId, Message, Presence, TypingSignal, UserRef};

use crate::error::ChannelError;

/// Local intents emitted to the backend.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Outbound {
    /// Presence announcement, sent once after the channel opens.
    UserOnline { uid: UserRef },
    /// Join the room of a direct conversation.
    Join { chat_id: ChatId },
    /// Join the room of a group conversation.
    JoinGroup { group_id: GroupId },
    /// Debounced local typing signal.
    Typing(TypingSignal),
    /// Acknowledge receipt of a foreign message in the open conversation.
    MessageDelivered {
        chat_id: ChatId,
        message_id: i64,
        uid: UserRef,
    },
    /// Mark foreign messages of the open conversation as seen.
    MessageSeen {
        chat_id: ChatId,
        message_ids: Vec<i64>,
        uid: UserRef,
    },
}

/// Remote events delivered by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    NewMessage(Message),
    NewGroupMessage(Message),
    /// A conversation changed out-of-band; payload (if any) is ignored and
    /// the synchronizer runs its full-refresh path.
    ChatUpdated,
    Typing(TypingSignal),
    /// A seen receipt; ticks are only ever updated through a refresh, so
    /// the payload is ignored.
    MessageSeen,
    PresenceUpdate(Presence),
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Encode an outbound intent as a wire frame.
pub fn encode(outbound: &Outbound) -> Result<String, ChannelError> {
    Ok(serde_json::to_string(outbound)?)
}

/// Decode a wire frame into an inbound event.
pub fn decode(text: &str) -> Result<Inbound, ChannelError> {
    let env: Envelope = serde_json::from_str(text)?;
    match env.event.as_str() {
        "newMessage" => Ok(Inbound::NewMessage(serde_json::from_value(env.data)?)),
        "newGroupMessage" => Ok(Inbound::NewGroupMessage(serde_json::from_value(env.data)?)),
        "chatUpdated" => Ok(Inbound::ChatUpdated),
        "typing" => Ok(Inbound::Typing(serde_json::from_value(env.data)?)),
        "messageSeen" => Ok(Inbound::MessageSeen),
        "presenceUpdate" => Ok(Inbound::PresenceUpdate(serde_json::from_value(env.data)?)),
        other => Err(ChannelError::UnknownEvent(other.to_string())),
    }
}
