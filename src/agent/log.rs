//! Message log
//!
//! The append-only record of a run. Every step reads one snapshot and
//! produces a new, longer snapshot; earlier snapshots are never touched.

use std::sync::Arc;

use crate::core::{Message, Role};

/// Ordered, append-only sequence of messages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageLog {
    messages: Arc<Vec<Message>>,
}

impl MessageLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log holding the task as its single human message
    pub fn seeded(task: impl Into<String>) -> Self {
        Self::new().append([Message::human(task)])
    }

    /// Return a new snapshot with `new` placed after all existing entries
    pub fn append(&self, new: impl IntoIterator<Item = Message>) -> Self {
        let mut messages = Vec::clone(&self.messages);
        messages.extend(new);
        Self {
            messages: Arc::new(messages),
        }
    }

    /// All messages in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recently appended message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get the last ai message
    pub fn last_ai_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Ai)
    }

    /// Whether this snapshot is an earlier state of `other`
    pub fn is_prefix_of(&self, other: &MessageLog) -> bool {
        self.len() <= other.len() && other.messages[..self.len()] == self.messages[..]
    }

    /// Iterate over messages
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_log() {
        let log = MessageLog::seeded("Chart the top 5 EDM songs by streams.");
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().unwrap().role, Role::Human);
    }

    #[test]
    fn test_append_leaves_snapshot_untouched() {
        let before = MessageLog::seeded("task");
        let after = before.append([Message::ai("findings"), Message::ai("chart")]);

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 3);
        assert_eq!(after.messages()[2].content, "chart");
        assert!(before.is_prefix_of(&after));
        assert!(!after.is_prefix_of(&before));
    }

    #[test]
    fn test_append_nothing() {
        let log = MessageLog::seeded("task");
        let same = log.append(Vec::new());
        assert_eq!(log, same);
        assert!(log.is_prefix_of(&same));
    }

    #[test]
    fn test_prefix_requires_same_entries() {
        let a = MessageLog::seeded("a").append([Message::ai("x")]);
        let b = MessageLog::seeded("b").append([Message::ai("x"), Message::ai("y")]);
        assert!(!a.is_prefix_of(&b));
    }

    #[test]
    fn test_last_ai_message_skips_tools() {
        let log = MessageLog::seeded("task").append([
            Message::ai("draft"),
            Message::tool("call_0", "Valid JSON"),
        ]);
        assert_eq!(log.last_ai_message().unwrap().content, "draft");
        assert_eq!(log.last().unwrap().role, Role::Tool);
    }
}
