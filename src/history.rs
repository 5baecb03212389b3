//! Command history — bounded append-only log of command outcomes.
//!
//! DESIGN
//! ======
//! One entry per terminal command, created exactly once and immutable
//! afterwards except for user-triggered deletion. The log keeps the most
//! recent [`HISTORY_CAP`] entries, dropping the oldest beyond the cap.
//! Verbose diagnostics (resolver candidate lists, raw bodies) live in
//! the entry's error detail, never in user-facing messages.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::ShapeId;
use crate::plan::Plan;

/// Entries retained before the oldest are dropped.
pub const HISTORY_CAP: usize = 50;

/// Current time as milliseconds since Unix epoch.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// ENTRY TYPES
// =============================================================================

/// Where a plan was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Client,
    Server,
}

/// What one command did to the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub operations_executed: usize,
    pub operations_failed: usize,
    pub created: Vec<ShapeId>,
    pub modified: Vec<ShapeId>,
    pub deleted: Vec<ShapeId>,
    pub duration_ms: u64,
    pub mode: ExecutionMode,
}

impl ExecutionSummary {
    /// An empty summary for commands that never reached execution.
    #[must_use]
    pub fn empty(mode: ExecutionMode, duration_ms: u64) -> Self {
        Self {
            operations_executed: 0,
            operations_failed: 0,
            created: Vec::new(),
            modified: Vec::new(),
            deleted: Vec::new(),
            duration_ms,
            mode,
        }
    }
}

/// Categorized failure plus optional verbose detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// One user-facing message.
    pub message: String,
    /// Grepable `E_*` code.
    pub code: String,
    /// 0-based index of the failing operation, when execution started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_index: Option<usize>,
    /// Verbose diagnostics (candidate lists, response bodies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// One terminal command outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandHistoryEntry {
    pub id: Uuid,
    pub prompt: String,
    /// Milliseconds since Unix epoch.
    pub ts: i64,
    pub success: bool,
    pub plan: Plan,
    pub summary: ExecutionSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
}

// =============================================================================
// HISTORY
// =============================================================================

/// Filter for [`CommandHistory::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Success,
    Failed,
}

/// Bounded in-memory log, oldest first internally.
#[derive(Debug, Default)]
pub struct CommandHistory {
    entries: VecDeque<CommandHistoryEntry>,
}

impl CommandHistory {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: VecDeque::new() }
    }

    /// Append an entry, dropping the oldest beyond [`HISTORY_CAP`].
    pub fn append(&mut self, entry: CommandHistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > HISTORY_CAP {
            self.entries.pop_front();
        }
    }

    /// Most-recent-first listing. `search` is a case-insensitive
    /// substring match over the prompt.
    #[must_use]
    pub fn list(&self, filter: StatusFilter, search: Option<&str>) -> Vec<&CommandHistoryEntry> {
        let needle = search.map(str::to_lowercase);
        self.entries
            .iter()
            .rev()
            .filter(|e| match filter {
                StatusFilter::All => true,
                StatusFilter::Success => e.success,
                StatusFilter::Failed => !e.success,
            })
            .filter(|e| {
                needle
                    .as_deref()
                    .is_none_or(|n| e.prompt.to_lowercase().contains(n))
            })
            .collect()
    }

    /// Look up one entry by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&CommandHistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Remove one entry. Returns whether anything was removed.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
