//! Conversation context management.
//!
//! Keeps a rolling window of the most recent messages so follow-up
//! questions can refer to earlier turns.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use uuid::Uuid;

use sqlchat_core::types::{Message, Role};

/// Number of messages kept when no other bound is configured.
pub const DEFAULT_MAX_HISTORY: usize = 6;

// =============================================================================
// ConversationHistory
// =============================================================================

/// Bounded, ordered log of role-tagged messages.
///
/// Appending past capacity evicts the oldest messages first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl ConversationHistory {
    /// Create an empty history holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            capacity,
        }
    }

    /// Append a message, trim to capacity, and return a snapshot.
    ///
    /// The snapshot is an owned copy; later appends are not reflected in it.
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> Vec<Message> {
        self.messages.push_back(Message::new(role, content));
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
        self.snapshot()
    }

    /// Owned copy of the current messages, oldest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// One `role: content` line per message, as embedded in prompts.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

// =============================================================================
// Conversation
// =============================================================================

/// A single interactive session and its context window.
///
/// Owned by the caller and passed by `&mut` to each turn.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: Uuid,
    pub started_at: DateTime<Local>,
    history: ConversationHistory,
    turn_count: u64,
}

impl Conversation {
    /// Start a new session keeping at most `max_history` messages.
    pub fn new(max_history: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Local::now(),
            history: ConversationHistory::new(max_history),
            turn_count: 0,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Record a message in the context window.
    pub fn record(&mut self, role: Role, content: impl Into<String>) -> Vec<Message> {
        self.history.append(role, content)
    }

    /// Number of turns started in this session.
    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    pub(crate) fn begin_turn(&mut self) -> u64 {
        self.turn_count += 1;
        self.turn_count
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

// =============================================================================
// Tests
// =============================================================================
