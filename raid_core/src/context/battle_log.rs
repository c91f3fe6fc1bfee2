//! In-battle log shown to the player.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Combat,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: u32,
    pub level: LogLevel,
    pub message: String,
}

/// Bounded log; the oldest entries are dropped first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl BattleLog {
    /// Log keeping at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
        }
    }

    /// Append an entry, dropping the oldest when full.
    pub fn push(&mut self, turn: u32, level: LogLevel, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            turn,
            level,
            message: message.into(),
        });
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_drops_oldest() {
        let mut log = BattleLog::new(2);
        log.push(1, LogLevel::Info, "first");
        log.push(1, LogLevel::Combat, "second");
        log.push(2, LogLevel::Warning, "third");

        assert_eq!(log.len(), 2);
        assert!(!log.contains("first"));
        assert_eq!(log.last().unwrap().message, "third");
        assert_eq!(log.last().unwrap().turn, 2);
    }
}
