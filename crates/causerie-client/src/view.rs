//! Pure rendering of the synchronizer state into terminal lines.
//!
//! Everything here is a function of [`SyncState`]; nothing mutates it and
//! nothing talks to the network. Deltas arrive through the synchronizer,
//! the view only re-reads.

use causerie_shared::{DeliveryStatus, Message, UserRef};
use causerie_sync::{MessageSearch, PeerHeader, SyncState};

/// Delivery ticks for a message, rendered for own direct messages only.
///
/// Foreign messages and group messages carry no ticks.
pub fn delivery_ticks(msg: &Message, me: &UserRef) -> &'static str {
    if msg.group_id.is_some() || !msg.is_from(me) {
        return "";
    }
    match msg.status {
        DeliveryStatus::Sent => " ✓",
        DeliveryStatus::Delivered => " ✓✓",
        DeliveryStatus::Seen => " ✓✓ (vu)",
    }
}

/// Presence line for the open direct conversation's header.
pub fn presence_line(peer: &PeerHeader) -> String {
    if peer.online {
        "Online".to_string()
    } else {
        match peer.last_active {
            Some(t) => format!("Last active {}", t.format("%Y-%m-%d %H:%M")),
            None => "Offline".to_string(),
        }
    }
}

/// The sidebar: numbered chat rows, then numbered group rows.
pub fn sidebar(state: &SyncState) -> String {
    let mut out = String::from("Chats\n");
    if state.chats.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, chat) in state.chats.iter().enumerate() {
        let dot = if chat.online { "●" } else { "○" };
        let badge = if chat.unread > 0 {
            format!(" [{}]", chat.unread)
        } else {
            String::new()
        };
        let preview = chat.last_message.as_deref().unwrap_or("");
        out.push_str(&format!(
            "  {} {} {}{}  {}\n",
            i + 1,
            dot,
            chat.name,
            badge,
            preview
        ));
    }

    out.push_str("Groups\n");
    if state.groups.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, group) in state.groups.iter().enumerate() {
        let badge = if group.unread > 0 {
            format!(" [{}]", group.unread)
        } else {
            String::new()
        };
        let preview = group.last_message.as_deref().unwrap_or("");
        out.push_str(&format!(
            "  {} {} ({}){}  {}\n",
            i + 1,
            group.name,
            group.members.len(),
            badge,
            preview
        ));
    }
    out
}

/// One rendered message row.
pub fn message_line(msg: &Message, me: &UserRef, marked: bool) -> String {
    let marker = if marked { "» " } else { "  " };
    let who = if msg.is_from(me) {
        "me".to_string()
    } else {
        msg.sender_uid.to_string()
    };
    let body = match msg.url.as_deref() {
        Some(url) => format!("[image] {url}"),
        None => msg.message.clone(),
    };
    format!(
        "{}[{}] {}: {}{}",
        marker,
        msg.created_at.format("%H:%M"),
        who,
        body,
        delivery_ticks(msg, me)
    )
}

/// Everything a rendered thread row depends on: message identity and
/// delivery status, in list order. Used to decide what a refresh changed.
pub fn thread_fingerprint(messages: &[Message]) -> Vec<(i64, DeliveryStatus)> {
    messages.iter().map(|m| (m.id, m.status)).collect()
}

/// What changed between the printed thread and the current message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadDelta {
    Unchanged,
    /// New messages were appended; printing resumes from this index.
    Append(usize),
    /// Existing rows were rewritten (replaced snapshot, tick transition);
    /// the whole thread needs re-printing.
    Replaced,
}

pub fn thread_delta(printed: &[(i64, DeliveryStatus)], messages: &[Message]) -> ThreadDelta {
    if printed.len() > messages.len()
        || printed
            .iter()
            .zip(messages)
            .any(|(p, m)| *p != (m.id, m.status))
    {
        return ThreadDelta::Replaced;
    }
    if printed.len() == messages.len() {
        ThreadDelta::Unchanged
    } else {
        ThreadDelta::Append(printed.len())
    }
}

/// Total unread count across both roster lists.
pub fn unread_total(state: &SyncState) -> u32 {
    state.chats.iter().map(|c| c.unread).sum::<u32>()
        + state.groups.iter().map(|g| g.unread).sum::<u32>()
}

/// The open conversation: header, messages, search indicator, typing bubble.
pub fn thread(state: &SyncState, search: Option<&MessageSearch>) -> String {
    let view = match state.open.view() {
        Some(view) => view,
        None => return "No conversation open.\n".to_string(),
    };

    let mut out = format!("== {} ==\n", view.title);
    if let Some(peer) = &view.peer {
        out.push_str(&presence_line(peer));
        out.push('\n');
    }

    let current = search.and_then(|s| s.current());
    for (i, msg) in view.messages.iter().enumerate() {
        out.push_str(&message_line(msg, &state.identity.uid, current == Some(i)));
        out.push('\n');
    }

    if let Some(search) = search {
        match search.position() {
            Some((at, total)) => out.push_str(&format!("match {at}/{total}\n")),
            None => out.push_str("no matches\n"),
        }
    }

    if let Some(sig) = &state.typing {
        if sig.is_typing {
            out.push_str(&format!("{} is typing…\n", sig.uid));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use causerie_shared::{
        ChatEntry, ChatId, ConversationKey, Identity, MessageKind, TypingSignal,
    };
    use chrono::Utc;

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
            online: true,
            last_active: None,
            last_message: Some("salut".to_string()),
            last_message_at: None,
            unread: 3,
        }
    }

    fn message(id: i64, sender: &str, status: DeliveryStatus) -> Message {
        Message {
            id,
            chat_id: Some(ChatId(7)),
            group_id: None,
            sender_uid: UserRef::from(sender),
            message: format!("m{id}"),
            kind: MessageKind::Text,
            url: None,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_ticks_render_for_own_direct_messages_only() {
        let me = UserRef::from("me");
        assert_eq!(delivery_ticks(&message(1, "me", DeliveryStatus::Sent), &me), " ✓");
        assert_eq!(
            delivery_ticks(&message(2, "me", DeliveryStatus::Delivered), &me),
            " ✓✓"
        );
        assert_eq!(delivery_ticks(&message(3, "peer", DeliveryStatus::Seen), &me), "");

        let mut group_msg = message(4, "me", DeliveryStatus::Seen);
        group_msg.chat_id = None;
        group_msg.group_id = Some(causerie_shared::GroupId(9));
        assert_eq!(delivery_ticks(&group_msg, &me), "");
    }

    #[test]
    fn test_sidebar_shows_unread_badge_and_presence_dot() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer")], Vec::new());

        let rendered = sidebar(&state);
        assert!(rendered.contains("● PEER [3]"));
        assert!(rendered.contains("salut"));
    }

    #[test]
    fn test_thread_renders_typing_bubble() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer")], Vec::new());
        let generation = state.begin_selection(ConversationKey::Direct(ChatId(7)));
        state.complete_selection(generation, vec![message(1, "peer", DeliveryStatus::Sent)]);
        state.typing = Some(TypingSignal {
            chat_id: ChatId(7),
            uid: UserRef::from("peer"),
            is_typing: true,
        });

        let rendered = thread(&state, None);
        assert!(rendered.contains("== PEER =="));
        assert!(rendered.contains("Online"));
        assert!(rendered.contains("peer is typing…"));
    }

    #[test]
    fn test_tick_transition_forces_reprint() {
        // A seen-receipt refresh keeps the message count constant but
        // rewrites statuses; the delta must not report it as unchanged.
        let before = vec![
            message(1, "me", DeliveryStatus::Sent),
            message(2, "me", DeliveryStatus::Sent),
        ];
        let printed = thread_fingerprint(&before);

        let mut after = before.clone();
        after[0].status = DeliveryStatus::Seen;
        after[1].status = DeliveryStatus::Seen;

        assert_eq!(thread_delta(&printed, &after), ThreadDelta::Replaced);
        assert_eq!(thread_delta(&printed, &before), ThreadDelta::Unchanged);
    }

    #[test]
    fn test_appended_messages_delta() {
        let before = vec![message(1, "peer", DeliveryStatus::Sent)];
        let printed = thread_fingerprint(&before);

        let mut after = before.clone();
        after.push(message(2, "peer", DeliveryStatus::Sent));
        assert_eq!(thread_delta(&printed, &after), ThreadDelta::Append(1));

        // A replaced snapshot that is shorter or reordered re-prints.
        let replaced = vec![message(9, "peer", DeliveryStatus::Sent)];
        assert_eq!(thread_delta(&printed, &replaced), ThreadDelta::Replaced);
    }

    #[test]
    fn test_unread_total_spans_chats_and_groups() {
        let mut state = SyncState::new(identity("me"));
        let group = causerie_shared::GroupEntry {
            id: causerie_shared::GroupId(9),
            name: "Projet".to_string(),
            avatar: None,
            created_by: None,
            members: Vec::new(),
            last_message: None,
            last_message_at: None,
            unread: 2,
        };
        state.set_roster(vec![chat_entry(7, "peer")], vec![group]);

        assert_eq!(unread_total(&state), 5);
    }

    #[test]
    fn test_thread_marks_current_search_match() {
        let mut state = SyncState::new(identity("me"));
        state.set_roster(vec![chat_entry(7, "peer")], Vec::new());
        let generation = state.begin_selection(ConversationKey::Direct(ChatId(7)));
        state.complete_selection(
            generation,
            vec![
                message(1, "peer", DeliveryStatus::Sent),
                message(2, "peer", DeliveryStatus::Sent),
            ],
        );

        let search = MessageSearch::new("m2", &state.open.view().unwrap().messages);
        let rendered = thread(&state, Some(&search));
        assert!(rendered.contains("» ["));
        assert!(rendered.contains("match 1/1"));
    }
}
