//! Conversation context management.
//!
//! Keeps an ordered, bounded history of turns for one session. Storage is
//! allowed to grow to twice the window before it is cut back to the most
//! recent `window` turns, so trimming happens once per `window` appends
//! rather than on every append.

use parla_core::{Role, Turn};

/// Bounded turn history owned by a single orchestrator session.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    window: usize,
    turns: Vec<Turn>,
}

impl ConversationContext {
    /// Create an empty context. A window of 0 is clamped to 1.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            turns: Vec::with_capacity(window * 2),
        }
    }

    /// Configured window size.
    pub fn window_size(&self) -> usize {
        self.window
    }

    /// Append a turn at the tail, trimming to the last `window` turns once
    /// storage exceeds twice the window.
    pub fn append(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn::new(role, text));
        if self.turns.len() > self.window * 2 {
            let excess = self.turns.len() - self.window;
            self.turns.drain(..excess);
            tracing::debug!(window = self.window, dropped = excess, "Conversation trimmed");
        }
    }

    /// The most recent `window` turns, oldest first.
    pub fn window(&self) -> &[Turn] {
        self.recent(self.window)
    }

    /// The most recent `limit` turns, oldest first.
    pub fn recent(&self, limit: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(limit);
        &self.turns[start..]
    }

    /// Copy of the full retained history.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
