//! The turn history replayed to the API and the simplified log kept beside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Content, InlineData, Role};

/// How much of the transcript is replayed on each request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryWindow {
    /// Every turn, every time
    #[default]
    Unbounded,
    /// At most the last `n` turns, widened so the window never opens on a model turn
    LastTurns(usize),
}

/// Append-only list of turns in API form
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Content>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Content) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Content] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Content> {
        self.turns.last()
    }

    /// The slice of turns to send under `window`
    pub fn window(&self, window: HistoryWindow) -> &[Content] {
        let limit = match window {
            HistoryWindow::Unbounded => return &self.turns,
            HistoryWindow::LastTurns(n) => n.max(1),
        };

        let mut start = self.turns.len().saturating_sub(limit);
        while start > 0 && self.turns[start].role != Some(Role::User) {
            start -= 1;
        }
        &self.turns[start..]
    }
}

/// Speaker of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRole {
    User,
    Bot,
}

impl From<Role> for LogRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => LogRole::User,
            Role::Model => LogRole::Bot,
        }
    }
}

/// Simplified record of one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub role: LogRole,
    pub text: String,
    pub file: Option<InlineData>,
    pub created_at: DateTime<Utc>,
}

/// Parallel history used to recall earlier attachments
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    entries: Vec<LogEntry>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, role: LogRole, text: impl Into<String>, file: Option<InlineData>) {
        self.entries.push(LogEntry {
            role,
            text: text.into(),
            file,
            created_at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry that carried a file, searching backward
    pub fn latest_attachment(&self) -> Option<&InlineData> {
        self.entries
            .iter()
            .rev()
            .find_map(|entry| entry.file.as_ref())
    }
}
