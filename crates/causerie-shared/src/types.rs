use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque user reference handed out by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserRef(pub String);

impl UserRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Server-assigned id of a direct (two-party) conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned id of a group conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GroupId(pub i64);

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical identifier of a conversation, stable for its whole lifetime.
///
/// Creation races (optimistic id vs server-assigned id) are resolved at the
/// API boundary before a key is ever constructed, so two keys are equal
/// exactly when they name the same conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ConversationKey {
    Direct(ChatId),
    Group(GroupId),
}

impl ConversationKey {
    pub fn is_group(&self) -> bool {
        matches!(self, ConversationKey::Group(_))
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        match self {
            ConversationKey::Direct(id) => Some(*id),
            ConversationKey::Group(_) => None,
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            ConversationKey::Direct(_) => None,
            ConversationKey::Group(id) => Some(*id),
        }
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationKey::Direct(id) => write!(f, "chat:{id}"),
            ConversationKey::Group(id) => write!(f, "group:{id}"),
        }
    }
}

/// Delivery status of a direct message. Group messages never carry ticks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Sent,
    Delivered,
    Seen,
}

/// Content tag of a message body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
}

/// A message as stored and delivered by the backend.
///
/// Exactly one of `chat_id` / `group_id` is set depending on which kind of
/// conversation the message belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: i64,
    #[serde(default)]
    pub chat_id: Option<ChatId>,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    pub sender_uid: UserRef,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// The canonical key of the conversation this message belongs to.
    pub fn conversation(&self) -> Option<ConversationKey> {
        match (self.chat_id, self.group_id) {
            (Some(id), _) => Some(ConversationKey::Direct(id)),
            (None, Some(id)) => Some(ConversationKey::Group(id)),
            (None, None) => None,
        }
    }

    pub fn is_from(&self, user: &UserRef) -> bool {
        &self.sender_uid == user
    }
}

/// An outgoing message body, built by the composer.
///
/// Image bodies carry a URL obtained from a prior `upload_media` call; the
/// upload itself is a collaborator operation, not part of sending.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Text(String),
    Image { url: String },
}

impl MessageBody {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageBody::Text(_) => MessageKind::Text,
            MessageBody::Image { .. } => MessageKind::Image,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            MessageBody::Text(t) => t,
            MessageBody::Image { .. } => "",
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            MessageBody::Text(_) => None,
            MessageBody::Image { url } => Some(url),
        }
    }
}

/// The authenticated identity, resolved once at sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    #[serde(rename = "firebase_uid")]
    pub uid: UserRef,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

/// A presence delta for one user. Last-value-wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Presence {
    pub uid: UserRef,
    pub online: bool,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

/// An ephemeral typing signal, scoped to direct conversations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypingSignal {
    pub chat_id: ChatId,
    pub uid: UserRef,
    pub is_typing: bool,
}

/// A direct-conversation row in the sidebar roster.
///
/// The id is accepted under either `chat_id` or `id` — the two field names
/// different backend code paths use — and always re-serialized as `chat_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatEntry {
    #[serde(rename = "chat_id", alias = "id")]
    pub id: ChatId,
    #[serde(rename = "firebase_uid")]
    pub peer_uid: UserRef,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread: u32,
}

/// A member of a group conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupMember {
    #[serde(rename = "firebase_uid")]
    pub uid: UserRef,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A group-conversation row in the sidebar roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupEntry {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub members: Vec<GroupMember>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_entry_accepts_both_id_fields() {
        let from_list: ChatEntry = serde_json::from_str(
            r#"{"chat_id": 7, "firebase_uid": "u1", "name": "Ada"}"#,
        )
        .unwrap();
        let from_creation: ChatEntry =
            serde_json::from_str(r#"{"id": 7, "firebase_uid": "u1", "name": "Ada"}"#).unwrap();

        assert_eq!(from_list.id, ChatId(7));
        assert_eq!(from_creation.id, ChatId(7));
        assert_eq!(from_list.id, from_creation.id);
    }

    #[test]
    fn test_message_defaults() {
        let msg: Message = serde_json::from_str(
            r#"{"id": 1, "chat_id": 3, "sender_uid": "u2", "message": "salut",
                "created_at": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(msg.kind, MessageKind::Text);
        assert_eq!(msg.status, DeliveryStatus::Sent);
        assert_eq!(msg.conversation(), Some(ConversationKey::Direct(ChatId(3))));
    }

    #[test]
    fn test_message_image_kind() {
        let msg: Message = serde_json::from_str(
            r#"{"id": 2, "group_id": 9, "sender_uid": "u2", "message": "",
                "type": "image", "url": "https://cdn/x.png",
                "created_at": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(msg.kind, MessageKind::Image);
        assert_eq!(msg.conversation(), Some(ConversationKey::Group(GroupId(9))));
    }

    #[test]
    fn test_typing_signal_wire_casing() {
        let sig = TypingSignal {
            chat_id: ChatId(4),
            uid: UserRef::from("u3"),
            is_typing: true,
        };
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["chatId"], 4);
        assert_eq!(json["isTyping"], true);
    }
}
