//! In-conversation text search.
//!
//! A pure, case-insensitive substring filter over the already-loaded
//! message list. Never queries the backend. The match set is an ordered
//! index into the message list; next/previous navigation cycles through
//! it modulo the match count.

use causerie_shared::Message;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSearch {
    matches: Vec<usize>,
    cursor: usize,
}

impl MessageSearch {
    /// Run the filter. A blank query produces an empty match set.
    pub fn new(query: &str, messages: &[Message]) -> Self {
        let needle = query.trim().to_lowercase();
        let matches = if needle.is_empty() {
            Vec::new()
        } else {
            messages
                .iter()
                .enumerate()
                .filter(|(_, m)| m.message.to_lowercase().contains(&needle))
                .map(|(i, _)| i)
                .collect()
        };
        Self { matches, cursor: 0 }
    }

    /// Indices into the message list, in message order.
    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// The message index under the cursor.
    pub fn current(&self) -> Option<usize> {
        self.matches.get(self.cursor).copied()
    }

    /// 1-based `(current, total)` for a "3/7" style indicator.
    pub fn position(&self) -> Option<(usize, usize)> {
        if self.matches.is_empty() {
            None
        } else {
            Some((self.cursor + 1, self.matches.len()))
        }
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.matches.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.matches.len();
        self.current()
    }

    pub fn prev(&mut self) -> Option<usize> {
        if self.matches.is_empty() {
            return None;
        }
        self.cursor = if self.cursor == 0 {
            self.matches.len() - 1
        } else {
            self.cursor - 1
        };
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causerie_shared::{ChatId, DeliveryStatus, MessageKind, UserRef};
    use chrono::Utc;

    fn msg(id: i64, body: &str) -> Message {
        Message {
            id,
            chat_id: Some(ChatId(1)),
            group_id: None,
            sender_uid: UserRef::from("peer"),
            message: body.to_string(),
            kind: MessageKind::Text,
            url: None,
            status: DeliveryStatus::Sent,
            created_at: Utc::now(),
        }
    }

    fn thread() -> Vec<Message> {
        vec![
            msg(1, "Bonjour tout le monde"),
            msg(2, "rien à voir"),
            msg(3, "BONJOUR encore"),
            msg(4, "au revoir"),
        ]
    }

    #[test]
    fn test_match_set_is_case_insensitive() {
        let search = MessageSearch::new("bonjour", &thread());
        assert_eq!(search.matches(), &[0, 2]);
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        assert!(MessageSearch::new("", &thread()).is_empty());
        assert!(MessageSearch::new("   ", &thread()).is_empty());
    }

    #[test]
    fn test_navigation_cycles_modulo_match_count() {
        let mut search = MessageSearch::new("bonjour", &thread());
        assert_eq!(search.current(), Some(0));
        assert_eq!(search.next(), Some(2));
        assert_eq!(search.next(), Some(0));
        assert_eq!(search.prev(), Some(2));
        assert_eq!(search.position(), Some((2, 2)));
    }

    #[test]
    fn test_navigation_on_empty_set() {
        let mut search = MessageSearch::new("absent", &thread());
        assert_eq!(search.next(), None);
        assert_eq!(search.prev(), None);
        assert_eq!(search.position(), None);
    }
}
