//! The pure synchronizer state machine.
//!
//! Remote events are applied through [`SyncState::apply`], which mutates
//! the view model and returns the [`Effect`]s the driver must execute.
//! The open conversation follows `None → Loading → Ready`, returning to
//! `Loading` on every selection; incoming deltas are `Ready → Ready`
//! self-transitions.

use chrono::{DateTime, Utc};
use tracing::debug;

use causerie_realtime::Inbound;
use causerie_shared::{
    ChatEntry, ChatId, ConversationKey, DeliveryStatus, GroupEntry, Identity, Message, Presence,
    TypingSignal,
};

/// Progress of the initial roster load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    /// Bounded retries exhausted; the UI shows a visible failure state
    /// instead of loading forever.
    Failed,
}

/// Header data for the peer of an open direct conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerHeader {
    pub uid: causerie_shared::UserRef,
    pub online: bool,
    pub last_active: Option<DateTime<Utc>>,
}

/// Render-ready view of the open conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationView {
    pub key: ConversationKey,
    pub title: String,
    pub avatar: Option<String>,
    /// Present for direct conversations only.
    pub peer: Option<PeerHeader>,
    /// Append-ordered by arrival; never reordered, never deduplicated.
    pub messages: Vec<Message>,
}

/// State machine for the open conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenConversation {
    None,
    Loading {
        key: ConversationKey,
        generation: u64,
    },
    Ready {
        generation: u64,
        view: ConversationView,
    },
}

impl OpenConversation {
    pub fn key(&self) -> Option<ConversationKey> {
        match self {
            OpenConversation::None => None,
            OpenConversation::Loading { key, .. } => Some(*key),
            OpenConversation::Ready { view, .. } => Some(view.key),
        }
    }

    pub fn generation(&self) -> Option<u64> {
        match self {
            OpenConversation::None => None,
            OpenConversation::Loading { generation, .. }
            | OpenConversation::Ready { generation, .. } => Some(*generation),
        }
    }

    pub fn view(&self) -> Option<&ConversationView> {
        match self {
            OpenConversation::Ready { view, .. } => Some(view),
            _ => None,
        }
    }
}

/// Side effects the driver executes after [`SyncState::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Re-fetch the chat and group lists (preview/unread update path).
    RefreshRoster,
    /// Re-fetch the open conversation's message snapshot.
    RefreshOpenMessages,
    /// Acknowledge delivery of a foreign message in the open conversation.
    AckDelivered { chat_id: ChatId, message_id: i64 },
}

/// The in-memory view model owned by the synchronizer.
#[derive(Debug)]
pub struct SyncState {
    pub identity: Identity,
    pub chats: Vec<ChatEntry>,
    pub groups: Vec<GroupEntry>,
    pub open: OpenConversation,
    /// Last typing signal for the open direct conversation.
    pub typing: Option<TypingSignal>,
    pub load: LoadState,
    next_generation: u64,
}

impl SyncState {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            chats: Vec::new(),
            groups: Vec::new(),
            open: OpenConversation::None,
            typing: None,
            load: LoadState::Idle,
            next_generation: 0,
        }
    }

    /// Replace both roster lists with fresh snapshots.
    pub fn set_roster(&mut self, chats: Vec<ChatEntry>, groups: Vec<GroupEntry>) {
        self.chats = chats;
        self.groups = groups;
    }

    /// Begin a selection: bump the generation and enter `Loading`.
    ///
    /// The returned generation must be passed back to
    /// [`complete_selection`](Self::complete_selection); snapshots carrying
    /// an older generation are discarded, so an in-flight fetch from a
    /// previous selection can never overwrite a newer one.
    pub fn begin_selection(&mut self, key: ConversationKey) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.open = OpenConversation::Loading { key, generation };
        self.typing = None;
        generation
    }

    /// Install a message snapshot for the selection `generation` started.
    ///
    /// Returns `false` (state untouched) when the generation is stale.
    /// The snapshot *replaces* the message list, it is never merged.
    pub fn complete_selection(&mut self, generation: u64, messages: Vec<Message>) -> bool {
        let key = match &self.open {
            OpenConversation::Loading {
                key,
                generation: current,
            } if *current == generation => *key,
            _ => return false,
        };

        let view = self.build_view(key, messages);
        self.open = OpenConversation::Ready { generation, view };
        true
    }

    /// Replace the open message list from a background refresh.
    ///
    /// Stale generations are discarded, as with selection snapshots.
    pub fn replace_open_messages(&mut self, generation: u64, messages: Vec<Message>) -> bool {
        match &mut self.open {
            OpenConversation::Ready {
                generation: current,
                view,
            } if *current == generation => {
                view.messages = messages;
                true
            }
            _ => false,
        }
    }

    fn build_view(&self, key: ConversationKey, messages: Vec<Message>) -> ConversationView {
        match key {
            ConversationKey::Direct(id) => {
                let entry = self.chats.iter().find(|c| c.id == id);
                ConversationView {
                    key,
                    title: entry.map(|c| c.name.clone()).unwrap_or_default(),
                    avatar: entry.and_then(|c| c.avatar.clone()),
                    peer: entry.map(|c| PeerHeader {
                        uid: c.peer_uid.clone(),
                        online: c.online,
                        last_active: c.last_active,
                    }),
                    messages,
                }
            }
            ConversationKey::Group(id) => {
                let entry = self.groups.iter().find(|g| g.id == id);
                ConversationView {
                    key,
                    title: entry.map(|g| g.name.clone()).unwrap_or_default(),
                    avatar: entry.and_then(|g| g.avatar.clone()),
                    peer: None,
                    messages,
                }
            }
        }
    }

    /// Apply a remote event and return the effects to execute.
    pub fn apply(&mut self, event: &Inbound) -> Vec<Effect> {
        match event {
            Inbound::NewMessage(msg) => self.on_direct_message(msg),
            Inbound::NewGroupMessage(msg) => self.on_group_message(msg),
            Inbound::ChatUpdated | Inbound::MessageSeen => {
                // Full-refresh path: ticks and previews are only ever
                // accurate after a round-trip, never patched in place.
                vec![Effect::RefreshRoster, Effect::RefreshOpenMessages]
            }
            Inbound::Typing(sig) => {
                self.on_typing(sig);
                Vec::new()
            }
            Inbound::PresenceUpdate(p) => {
                self.on_presence(p);
                Vec::new()
            }
        }
    }

    fn on_direct_message(&mut self, msg: &Message) -> Vec<Effect> {
        let open_chat = self.open.key().and_then(|k| k.chat_id());
        match (open_chat, msg.chat_id) {
            (Some(open_id), Some(chat_id)) if open_id == chat_id => {
                let mut effects = Vec::new();
                if !msg.is_from(&self.identity.uid) {
                    effects.push(Effect::AckDelivered {
                        chat_id,
                        message_id: msg.id,
                    });
                }
                // Append in arrival order. If the snapshot fetch is still
                // in flight the append is dropped; the snapshot that lands
                // afterwards includes the message (last-write-wins).
                if let OpenConversation::Ready { view, .. } = &mut self.open {
                    view.messages.push(msg.clone());
                }
                effects
            }
            _ => vec![Effect::RefreshRoster, Effect::RefreshOpenMessages],
        }
    }

    fn on_group_message(&mut self, msg: &Message) -> Vec<Effect> {
        let open_group = self.open.key().and_then(|k| k.group_id());
        match (open_group, msg.group_id) {
            (Some(open_id), Some(group_id)) if open_id == group_id => {
                // No delivery acks and no ticks for group messages.
                if let OpenConversation::Ready { view, .. } = &mut self.open {
                    view.messages.push(msg.clone());
                }
                Vec::new()
            }
            _ => vec![Effect::RefreshRoster, Effect::RefreshOpenMessages],
        }
    }

    fn on_typing(&mut self, sig: &TypingSignal) {
        // Typing is scoped to the open direct conversation; groups ignore
        // it entirely. Last-value-wins.
        match self.open.key() {
            Some(ConversationKey::Direct(id)) if id == sig.chat_id => {
                self.typing = Some(sig.clone());
            }
            _ => {
                debug!(chat = %sig.chat_id, "Ignoring typing signal outside the open conversation");
            }
        }
    }

    fn on_presence(&mut self, p: &Presence) {
        // Last-value-wins fan-out: every roster row and the open header.
        for entry in self.chats.iter_mut().filter(|c| c.peer_uid == p.uid) {
            entry.online = p.online;
            entry.last_active = p.last_active;
        }
        if let OpenConversation::Ready { view, .. } = &mut self.open {
            if let Some(peer) = view.peer.as_mut() {
                if peer.uid == p.uid {
                    peer.online = p.online;
                    peer.last_active = p.last_active;
                }
            }
        }
    }

    /// Foreign messages of the open direct conversation not yet seen, for
    /// the seen-receipt emission. `None` for groups or an empty set.
    pub fn unseen_foreign(&self) -> Option<(ChatId, Vec<i64>)> {
        let view = self.open.view()?;
        let chat_id = view.key.chat_id()?;
        let ids: Vec<i64> = view
            .messages
            .iter()
            .filter(|m| !m.is_from(&self.identity.uid) && m.status != DeliveryStatus::Seen)
            .map(|m| m.id)
            .collect();
        if ids.is_empty() {
            None
        } else {
            Some((chat_id, ids))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causerie_shared::{GroupId, MessageKind, UserRef};

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: UserRef::from(uid),
            name: uid.to_uppercase(),
            email: None,
            avatar: None,
            online: true,
            last_active: None,
        }
    }

    fn chat_entry(id: i64, peer: &str) -> ChatEntry {
        ChatEntry {
            id: ChatId(id),
            peer_uid: UserRef::from(peer),
            name: peer.to_uppercase(),
            avatar: None,
            online: false,
            last_active: None,
            last_message: None,
            last_message_at: None,
            unread: 0,
        }
    }

    fn direct_message(id: i64, chat: i64, sender: &str) -> Message {
        Message {
            id,
            chat_id: Some(ChatId(chat)),
            group_id: None,
            sender_uid: UserRef::from(sender),
            message: format!("m{id}"),
            kind: MessageKind::Text,
            url: None,
            status: DeliveryStatus::Sent,
            created_at: Utc::now(),
        }
    }

    fn group_message(id: i64, group: i64, sender: &str) -> Message {
        Message {
            group_id: Some(GroupId(group)),
            chat_id: None,
            ..direct_message(id, 0, sender)
        }
    }

    fn open_direct(state: &mut SyncState, chat: i64) -> u64 {
        let generation = state.begin_selection(ConversationKey::Direct(ChatId(chat)));
        assert!(state.complete_selection(generation, Vec::new()));
        generation
    }

    #[test]
    fn test_open_messages_append_in_arrival_order() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer")], Vec::new());
        open_direct(&mut state, 7);

        state.apply(&Inbound::NewMessage(direct_message(101, 7, "peer")));
        state.apply(&Inbound::NewMessage(direct_message(102, 7, "peer")));

        let ids: Vec<i64> = state
            .open
            .view()
            .unwrap()
            .messages
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![101, 102]);
    }

    #[test]
    fn test_duplicate_delivery_is_not_deduplicated() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer")], Vec::new());
        open_direct(&mut state, 7);

        let msg = direct_message(101, 7, "peer");
        state.apply(&Inbound::NewMessage(msg.clone()));
        state.apply(&Inbound::NewMessage(msg));

        assert_eq!(state.open.view().unwrap().messages.len(), 2);
    }

    #[test]
    fn test_foreign_message_never_enters_open_list() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer"), chat_entry(8, "other")], Vec::new());
        open_direct(&mut state, 7);

        let effects = state.apply(&Inbound::NewMessage(direct_message(500, 8, "other")));

        assert!(state.open.view().unwrap().messages.is_empty());
        assert_eq!(
            effects,
            vec![Effect::RefreshRoster, Effect::RefreshOpenMessages]
        );
    }

    #[test]
    fn test_foreign_sender_triggers_delivered_ack() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer")], Vec::new());
        open_direct(&mut state, 7);

        let effects = state.apply(&Inbound::NewMessage(direct_message(101, 7, "peer")));
        assert_eq!(
            effects,
            vec![Effect::AckDelivered {
                chat_id: ChatId(7),
                message_id: 101
            }]
        );

        // Our own echo appends but is never acknowledged.
        let effects = state.apply(&Inbound::NewMessage(direct_message(102, 7, "me")));
        assert!(effects.is_empty());
        assert_eq!(state.open.view().unwrap().messages.len(), 2);
    }

    #[test]
    fn test_group_message_appends_without_ack() {
        let mut state = SyncState::new(identity("me"));
        let generation = state.begin_selection(ConversationKey::Group(GroupId(9)));
        state.complete_selection(generation, Vec::new());

        let effects = state.apply(&Inbound::NewGroupMessage(group_message(200, 9, "peer")));
        assert!(effects.is_empty());
        assert_eq!(state.open.view().unwrap().messages.len(), 1);
    }

    #[test]
    fn test_presence_is_last_value_wins_everywhere() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer"), chat_entry(8, "peer")], Vec::new());
        open_direct(&mut state, 7);

        let t1 = Utc::now();
        state.apply(&Inbound::PresenceUpdate(Presence {
            uid: UserRef::from("peer"),
            online: true,
            last_active: None,
        }));
        state.apply(&Inbound::PresenceUpdate(Presence {
            uid: UserRef::from("peer"),
            online: false,
            last_active: Some(t1),
        }));

        for entry in &state.chats {
            assert!(!entry.online);
            assert_eq!(entry.last_active, Some(t1));
        }
        let peer = state.open.view().unwrap().peer.as_ref().unwrap();
        assert!(!peer.online);
        assert_eq!(peer.last_active, Some(t1));
    }

    #[test]
    fn test_typing_ignored_for_groups_and_foreign_chats() {
        let mut state = SyncState::new(identity("me"));
        let generation = state.begin_selection(ConversationKey::Group(GroupId(9)));
        state.complete_selection(generation, Vec::new());

        state.apply(&Inbound::Typing(TypingSignal {
            chat_id: ChatId(7),
            uid: UserRef::from("peer"),
            is_typing: true,
        }));
        assert!(state.typing.is_none());

        state.set_roster(vec![chat_entry(7, "peer")], Vec::new());
        open_direct(&mut state, 7);
        state.apply(&Inbound::Typing(TypingSignal {
            chat_id: ChatId(8),
            uid: UserRef::from("peer"),
            is_typing: true,
        }));
        assert!(state.typing.is_none());

        state.apply(&Inbound::Typing(TypingSignal {
            chat_id: ChatId(7),
            uid: UserRef::from("peer"),
            is_typing: true,
        }));
        assert!(state.typing.as_ref().unwrap().is_typing);
    }

    #[test]
    fn test_seen_and_updated_run_full_refresh_path() {
        let mut state = SyncState::new(identity("me"));
        let refresh = vec![Effect::RefreshRoster, Effect::RefreshOpenMessages];
        assert_eq!(state.apply(&Inbound::MessageSeen), refresh);
        assert_eq!(state.apply(&Inbound::ChatUpdated), refresh);
    }

    #[test]
    fn test_stale_selection_snapshot_is_discarded() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "a"), chat_entry(8, "b")], Vec::new());

        let stale = state.begin_selection(ConversationKey::Direct(ChatId(7)));
        let fresh = state.begin_selection(ConversationKey::Direct(ChatId(8)));

        // The slow response from the first selection resolves last.
        assert!(state.complete_selection(fresh, vec![direct_message(1, 8, "b")]));
        assert!(!state.complete_selection(stale, vec![direct_message(2, 7, "a")]));

        let view = state.open.view().unwrap();
        assert_eq!(view.key, ConversationKey::Direct(ChatId(8)));
        assert_eq!(view.messages[0].id, 1);
    }

    #[test]
    fn test_stale_refresh_snapshot_is_discarded() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "a"), chat_entry(8, "b")], Vec::new());
        let old = open_direct(&mut state, 7);
        let new = state.begin_selection(ConversationKey::Direct(ChatId(8)));
        state.complete_selection(new, Vec::new());

        assert!(!state.replace_open_messages(old, vec![direct_message(2, 7, "a")]));
        assert!(state.open.view().unwrap().messages.is_empty());
    }

    #[test]
    fn test_snapshot_replaces_rather_than_merges() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer")], Vec::new());
        let generation = open_direct(&mut state, 7);
        state.apply(&Inbound::NewMessage(direct_message(101, 7, "peer")));

        assert!(state.replace_open_messages(generation, vec![direct_message(500, 7, "peer")]));
        let ids: Vec<i64> = state
            .open
            .view()
            .unwrap()
            .messages
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![500]);
    }

    #[test]
    fn test_unseen_foreign_collects_direct_only() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer")], Vec::new());
        let generation = open_direct(&mut state, 7);

        let mut seen = direct_message(1, 7, "peer");
        seen.status = DeliveryStatus::Seen;
        let mine = direct_message(2, 7, "me");
        let unseen = direct_message(3, 7, "peer");
        state.replace_open_messages(generation, vec![seen, mine, unseen]);

        assert_eq!(state.unseen_foreign(), Some((ChatId(7), vec![3])));
    }

    #[test]
    fn test_selection_clears_typing() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer")], Vec::new());
        open_direct(&mut state, 7);
        state.apply(&Inbound::Typing(TypingSignal {
            chat_id: ChatId(7),
            uid: UserRef::from("peer"),
            is_typing: true,
        }));

        state.begin_selection(ConversationKey::Direct(ChatId(8)));
        assert!(state.typing.is_none());
    }
}
