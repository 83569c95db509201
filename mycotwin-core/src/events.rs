use crate::error::MycotwinError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of events retained before the oldest are dropped.
pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Simulation,
    Environmental,
    Contamination,
    Loop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Monotonic sequence number; survives eviction of older entries.
    pub sequence: u64,
    pub category: EventCategory,
    pub message: String,
    pub context: serde_json::Value,
}

/// Append-only, capped audit trail of simulation activity. The core only
/// writes to it; reading and export are for callers.
#[derive(Debug)]
pub struct AuditLog {
    entries: VecDeque<AuditEvent>,
    capacity: usize,
    next_sequence: u64,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    pub fn record(&mut self, category: EventCategory, message: &str, context: serde_json::Value) {
        let event = AuditEvent {
            sequence: self.next_sequence,
            category,
            message: message.to_string(),
            context,
        };
        self.next_sequence += 1;
        self.entries.push_back(event);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &AuditEvent> {
        self.entries.iter()
    }

    pub fn entries_for(&self, category: EventCategory) -> Vec<&AuditEvent> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    pub fn export_json(&self) -> Result<String, MycotwinError> {
        let entries: Vec<&AuditEvent> = self.entries.iter().collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }
}
