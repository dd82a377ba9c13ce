//! Direct-conversation endpoints.

use serde::{Deserialize, Serialize};
use tracing::debug;

use causerie_shared::{ChatEntry, ChatId, Message, MessageBody, MessageKind, UserRef};

use crate::client::ApiClient;
use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
struct ChatListResponse {
    #[serde(default)]
    chats: Vec<ChatEntry>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

/// The conversation returned by start-or-get.
///
/// When the conversation is freshly created the backend answers with `id`;
/// when it already existed the row comes back with `chat_id`. The alias
/// collapses both spellings into one canonical [`ChatId`] here, so callers
/// never perform dual-field lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct StartedChat {
    #[serde(rename = "chat_id", alias = "id")]
    pub id: ChatId,
    #[serde(default, rename = "firebase_uid")]
    pub peer_uid: Option<UserRef>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartChatResponse {
    chat: StartedChat,
}

#[derive(Serialize)]
struct StartChatRequest<'a> {
    receiver_uid: &'a UserRef,
}

#[derive(Serialize)]
struct SendChatRequest<'a> {
    chat_id: ChatId,
    message: &'a str,
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

impl ApiClient {
    /// `GET /chat/list`
    pub async fn list_chats(&self) -> Result<Vec<ChatEntry>> {
        let resp: ChatListResponse = self.get_json("/chat/list").await?;
        Ok(resp.chats)
    }

    /// Start a conversation with `peer`, or fetch the existing one.
    ///
    /// `POST /chat/start`
    pub async fn start_chat(&self, peer: &UserRef) -> Result<StartedChat> {
        let resp: StartChatResponse = self
            .post_json("/chat/start", &StartChatRequest { receiver_uid: peer })
            .await?;
        debug!(peer = %peer, chat = %resp.chat.id, "Resolved direct conversation");
        Ok(resp.chat)
    }

    /// `GET /chat/messages/{id}`
    pub async fn chat_messages(&self, id: ChatId) -> Result<Vec<Message>> {
        let resp: MessagesResponse = self.get_json(&format!("/chat/messages/{id}")).await?;
        Ok(resp.messages)
    }

    /// Send a message into a direct conversation.
    ///
    /// The created row is not returned to the caller: the realtime echo is
    /// the only append path, so send and delivery stay consistent with the
    /// fan-out every other participant sees.
    ///
    /// `POST /chat/send`
    pub async fn send_chat_message(&self, id: ChatId, body: &MessageBody) -> Result<()> {
        let _: serde_json::Value = self
            .post_json(
                "/chat/send",
                &SendChatRequest {
                    chat_id: id,
                    message: body.text(),
                    kind: body.kind(),
                    url: body.url(),
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_chat_creation_shape() {
        let resp: StartChatResponse =
            serde_json::from_str(r#"{"chat": {"id": 7, "firebase_uid": "peer-a"}}"#).unwrap();
        assert_eq!(resp.chat.id, ChatId(7));
    }

    #[test]
    fn test_started_chat_existing_shape() {
        let resp: StartChatResponse = serde_json::from_str(
            r#"{"chat": {"chat_id": 7, "firebase_uid": "peer-a", "name": "Ada"}}"#,
        )
        .unwrap();
        assert_eq!(resp.chat.id, ChatId(7));
        assert_eq!(resp.chat.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_send_request_wire_shape() {
        let body = MessageBody::Image {
            url: "https://cdn/x.png".to_string(),
        };
        let req = SendChatRequest {
            chat_id: ChatId(3),
            message: body.text(),
            kind: body.kind(),
            url: body.url(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["chat_id"], 3);
        assert_eq!(json["type"], "image");
        assert_eq!(json["url"], "https://cdn/x.png");
    }

    #[test]
    fn test_empty_chat_list_tolerated() {
        let resp: ChatListResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.chats.is_empty());
    }
}
