//! The async driver around [`SyncState`].
//!
//! Executes effects against the API client and the realtime channel,
//! owns the generation counter discipline for stale snapshots, and
//! implements the initial-load retry policy.

use std::time::Duration;

use tracing::{debug, info, warn};

use causerie_api::{ApiClient, ApiError, StartedChat};
use causerie_realtime::{ChannelCommand, ChannelEvent, Inbound, Outbound};
use causerie_shared::constants::{INIT_RETRY_ATTEMPTS, INIT_RETRY_DELAY_MS};
use causerie_shared::{
    ChatEntry, ConversationKey, GroupEntry, Identity, MessageBody, TypingSignal, UserRef,
};

use crate::error::SyncError;
use crate::session::Session;
use crate::state::{Effect, LoadState, OpenConversation, SyncState};

/// Drives the synchronizer state against the backend.
pub struct Synchronizer {
    api: ApiClient,
    session: Session,
    pub state: SyncState,
}

impl Synchronizer {
    pub fn new(session: Session, api: ApiClient) -> Self {
        let state = SyncState::new(session.identity().clone());
        Self { api, session, state }
    }

    pub fn identity(&self) -> &Identity {
        self.session.identity()
    }

    async fn emit(&self, outbound: Outbound) -> Result<(), SyncError> {
        self.session
            .channel()
            .send(ChannelCommand::Emit(outbound))
            .await
            .map_err(|_| SyncError::ChannelClosed)
    }

    /// Initial load: fetch the roster (with bounded retries), announce
    /// presence, and — when the route targets a peer rather than an
    /// existing conversation — start-or-get the direct conversation and
    /// open it under its canonical id.
    pub async fn initialize(&mut self, route_target: Option<&UserRef>) -> Result<(), SyncError> {
        self.state.load = LoadState::Loading;

        let mut attempt = 1;
        let (chats, groups) = loop {
            match self.fetch_roster().await {
                Ok(lists) => break lists,
                Err(e) if attempt < INIT_RETRY_ATTEMPTS => {
                    warn!(error = %e, attempt, "Initial load failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(INIT_RETRY_DELAY_MS)).await;
                }
                Err(e) => {
                    self.state.load = LoadState::Failed;
                    return Err(e.into());
                }
            }
        };
        self.state.set_roster(chats, groups);
        self.state.load = LoadState::Ready;
        info!(
            chats = self.state.chats.len(),
            groups = self.state.groups.len(),
            "Roster loaded"
        );

        self.emit(Outbound::UserOnline {
            uid: self.identity().uid.clone(),
        })
        .await?;

        if let Some(peer) = route_target {
            let started = self.api.start_chat(peer).await?;
            // Refresh the sidebar immediately so the new conversation has a
            // full roster row, then resolve it by canonical id.
            let chats = self.api.list_chats().await?;
            let entry = resolve_started_chat(&started, peer, &chats);
            self.state.chats = chats;
            if !self.state.chats.iter().any(|c| c.id == entry.id) {
                self.state.chats.push(entry.clone());
            }
            self.select_conversation(ConversationKey::Direct(entry.id))
                .await?;
        }

        Ok(())
    }

    /// Re-fetch the roster on demand (group administration, manual reload).
    pub async fn refresh_roster(&mut self) -> Result<(), SyncError> {
        let (chats, groups) = self.fetch_roster().await?;
        self.state.set_roster(chats, groups);
        Ok(())
    }

    /// Open a conversation: join its realtime room and replace the open
    /// message list with a fresh snapshot.
    ///
    /// The previous room is intentionally not left; stale-room events are
    /// filtered by conversation-id checks in [`SyncState::apply`].
    pub async fn select_conversation(&mut self, key: ConversationKey) -> Result<(), SyncError> {
        let generation = self.state.begin_selection(key);

        match key {
            ConversationKey::Direct(id) => self.emit(Outbound::Join { chat_id: id }).await?,
            ConversationKey::Group(id) => self.emit(Outbound::JoinGroup { group_id: id }).await?,
        }

        let messages = match key {
            ConversationKey::Direct(id) => self.api.chat_messages(id).await?,
            ConversationKey::Group(id) => self.api.group_messages(id).await?,
        };

        if self.state.complete_selection(generation, messages) {
            self.mark_open_seen().await?;
        } else {
            debug!(%key, generation, "Discarding stale conversation snapshot");
        }
        Ok(())
    }

    /// Send a message into the open conversation.
    ///
    /// Text bodies must be non-empty after trimming; image bodies carry a
    /// pre-uploaded URL. There is no optimistic append — the realtime echo
    /// is the single append path, so what we render is exactly what every
    /// other participant was fanned.
    pub async fn send_message(&mut self, body: MessageBody) -> Result<(), SyncError> {
        if let MessageBody::Text(text) = &body {
            if text.trim().is_empty() {
                return Err(SyncError::EmptyMessage);
            }
        }

        let key = self.state.open.key().ok_or(SyncError::NoOpenConversation)?;
        match key {
            ConversationKey::Direct(id) => self.api.send_chat_message(id, &body).await?,
            ConversationKey::Group(id) => self.api.send_group_message(id, &body).await?,
        }
        debug!(conversation = %key, kind = ?body.kind(), "Message dispatched");
        Ok(())
    }

    /// Feed one realtime event through the state machine and execute the
    /// resulting effects. Background failures are logged and swallowed.
    pub async fn handle_event(&mut self, event: ChannelEvent) {
        let inbound = match event {
            ChannelEvent::Connected => {
                debug!("Realtime channel up");
                return;
            }
            ChannelEvent::Disconnected => {
                warn!("Realtime channel lost; realtime updates suspended");
                return;
            }
            ChannelEvent::Inbound(inbound) => inbound,
        };

        let thread_changed = matches!(
            inbound,
            Inbound::NewMessage(_)
                | Inbound::NewGroupMessage(_)
                | Inbound::ChatUpdated
                | Inbound::MessageSeen
        );

        let effects = self.state.apply(&inbound);
        self.run_effects(effects).await;

        if thread_changed {
            if let Err(e) = self.mark_open_seen().await {
                warn!(error = %e, "Failed to emit seen receipt");
            }
        }
    }

    async fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RefreshRoster => match self.fetch_roster().await {
                    Ok((chats, groups)) => self.state.set_roster(chats, groups),
                    Err(e) => warn!(error = %e, "Roster refresh failed; keeping previous state"),
                },
                Effect::RefreshOpenMessages => self.refresh_open_messages().await,
                Effect::AckDelivered {
                    chat_id,
                    message_id,
                } => {
                    let ack = Outbound::MessageDelivered {
                        chat_id,
                        message_id,
                        uid: self.identity().uid.clone(),
                    };
                    if let Err(e) = self.emit(ack).await {
                        warn!(error = %e, "Failed to emit delivery ack");
                    }
                }
            }
        }
    }

    async fn refresh_open_messages(&mut self) {
        let (key, generation) = match self.state.open.key().zip(self.state.open.generation()) {
            Some(pair) => pair,
            None => return,
        };

        let result = match key {
            ConversationKey::Direct(id) => self.api.chat_messages(id).await,
            ConversationKey::Group(id) => self.api.group_messages(id).await,
        };

        match result {
            Ok(messages) => {
                if !self.state.replace_open_messages(generation, messages) {
                    debug!(%key, generation, "Discarding stale message refresh");
                }
            }
            Err(e) => warn!(error = %e, "Message refresh failed; keeping previous state"),
        }
    }

    /// Emit a seen receipt for every unseen foreign message of the open
    /// direct conversation. Ticks update on the next refresh round-trip.
    pub async fn mark_open_seen(&mut self) -> Result<(), SyncError> {
        if let Some((chat_id, message_ids)) = self.state.unseen_foreign() {
            self.emit(Outbound::MessageSeen {
                chat_id,
                message_ids,
                uid: self.identity().uid.clone(),
            })
            .await?;
        }
        Ok(())
    }

    /// Forward a debounced local typing value for the open conversation.
    /// No-op for groups: typing does not exist there.
    pub async fn emit_typing(&self, is_typing: bool) -> Result<(), SyncError> {
        let chat_id = match self.state.open.key() {
            Some(ConversationKey::Direct(id)) => id,
            _ => return Ok(()),
        };
        self.emit(Outbound::Typing(TypingSignal {
            chat_id,
            uid: self.identity().uid.clone(),
            is_typing,
        }))
        .await
    }

    pub fn open(&self) -> &OpenConversation {
        &self.state.open
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Tear down the session and close the realtime channel.
    pub async fn sign_out(self) {
        self.session.sign_out().await;
    }

    async fn fetch_roster(&self) -> Result<(Vec<ChatEntry>, Vec<GroupEntry>), ApiError> {
        let chats = self.api.list_chats().await?;
        let groups = self.api.list_groups().await?;
        Ok((chats, groups))
    }
}

/// Resolve the canonical roster row for a just-started conversation.
///
/// The started id is already canonical (normalized at the API boundary);
/// here we prefer the full row from the refreshed list and fall back to a
/// minimal row built from the creation response when the list lags.
pub(crate) fn resolve_started_chat(
    started: &StartedChat,
    peer: &UserRef,
    chats: &[ChatEntry],
) -> ChatEntry {
    chats
        .iter()
        .find(|c| c.id == started.id)
        .cloned()
        .unwrap_or_else(|| ChatEntry {
            id: started.id,
            peer_uid: started.peer_uid.clone().unwrap_or_else(|| peer.clone()),
            name: started.name.clone().unwrap_or_default(),
            avatar: started.avatar.clone(),
            online: false,
            last_active: None,
            last_message: None,
            last_message_at: None,
            unread: 0,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use causerie_shared::ChatId;

    fn entry(id: i64, peer: &str) -> ChatEntry {
        ChatEntry {
            id: ChatId(id),
            peer_uid: UserRef::from(peer),
            name: peer.to_uppercase(),
            avatar: None,
            online: true,
            last_active: None,
            last_message: Some("salut".to_string()),
            last_message_at: None,
            unread: 1,
        }
    }

    #[test]
    fn test_started_chat_resolves_to_single_list_row() {
        // Creation said id 7, the refreshed list says chat_id 7: one
        // canonical conversation, the full row wins.
        let started: StartedChat =
            serde_json::from_str(r#"{"id": 7, "firebase_uid": "peer"}"#).unwrap();
        let chats = vec![entry(6, "other"), entry(7, "peer")];

        let resolved = resolve_started_chat(&started, &UserRef::from("peer"), &chats);
        assert_eq!(resolved.id, ChatId(7));
        assert_eq!(resolved.unread, 1);
    }

    #[test]
    fn test_started_chat_falls_back_to_creation_response() {
        let started: StartedChat =
            serde_json::from_str(r#"{"chat_id": 9, "name": "Ada"}"#).unwrap();
        let chats = vec![entry(6, "other")];

        let resolved = resolve_started_chat(&started, &UserRef::from("peer"), &chats);
        assert_eq!(resolved.id, ChatId(9));
        assert_eq!(resolved.peer_uid, UserRef::from("peer"));
        assert_eq!(resolved.name, "Ada");
    }
}
