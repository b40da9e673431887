//! Conversation Log
//!
//! The ordered, append-only record of a conversation. The log assigns turn
//! ids itself so that ids always follow insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opening line the companion greets the user with.
pub const OPENING_LINE: &str = "Salut ! Je suis Paul, ton ami français. Comment ça va ?";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in the conversation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Turn {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    /// Only ever set on assistant turns.
    pub correction: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct ConversationLog {
    turns: Vec<Turn>,
    next_id: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log that already holds the companion's opening line.
    pub fn with_opening_line() -> Self {
        let mut log = Self::new();
        log.append_assistant(OPENING_LINE, None);
        log
    }

    pub fn append_user(&mut self, text: impl Into<String>) -> &Turn {
        self.append(Sender::User, text.into(), None)
    }

    pub fn append_assistant(&mut self, text: impl Into<String>, correction: Option<String>) -> &Turn {
        self.append(Sender::Assistant, text.into(), correction)
    }

    fn append(&mut self, sender: Sender, text: String, correction: Option<String>) -> &Turn {
        self.next_id += 1;
        self.turns.push(Turn {
            id: self.next_id,
            text,
            sender,
            correction,
            created_at: Utc::now(),
        });
        &self.turns[self.turns.len() - 1]
    }

    /// The full conversation in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
