//! Core record types for the a3s-crossview system
//!
//! All types use camelCase JSON serialization for reporting compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a record within one authority
///
/// Processes are keyed by pid; alerts and routine identities by their own
/// text. Serialized untagged, so `3` and `"integrity-routine"` are both valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer identity (e.g., a process id)
    Numeric(u64),
    /// Textual identity (e.g., alert text, routine name)
    Named(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Numeric(n) => write!(f, "{}", n),
            RecordId::Named(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        RecordId::Numeric(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Named(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Named(s)
    }
}

/// What kind of fact a record describes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    /// Entry in a process/execution table
    Process,
    /// Security alert raised by the system
    Alert,
    /// Identity of the routine currently installed for a function slot
    Routine,
    /// Anything else
    #[default]
    Generic,
}

/// A single fact under audit
///
/// Identity is `id` alone: the authority and views index records by it, and
/// two records sharing an `id` but differing anywhere else are a
/// substitution, not a match. `PartialEq` compares the full value, which is
/// what the auditor uses to detect that substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Stable identity within one authority
    pub id: RecordId,

    /// Kind of fact
    #[serde(default)]
    pub kind: RecordKind,

    /// Human-readable name (process name, alert text, routine tag)
    pub label: String,

    /// Auxiliary state (e.g., `{"running": true}`), not part of identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

impl Record {
    /// Create a generic record with no auxiliary state
    pub fn new(id: impl Into<RecordId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: RecordKind::Generic,
            label: label.into(),
            state: None,
        }
    }

    /// Create a process-table entry keyed by pid
    pub fn process(pid: u64, name: impl Into<String>, running: bool) -> Self {
        Self {
            id: RecordId::Numeric(pid),
            kind: RecordKind::Process,
            label: name.into(),
            state: Some(serde_json::json!({ "running": running })),
        }
    }

    /// Create an alert record; the alert text is its own identity
    pub fn alert(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: RecordId::Named(text.clone()),
            kind: RecordKind::Alert,
            label: text,
            state: None,
        }
    }

    /// Create a routine-identity record: `slot` names the function, `active`
    /// names the implementation installed in it
    pub fn routine(slot: impl Into<String>, active: impl Into<String>) -> Self {
        Self {
            id: RecordId::Named(slot.into()),
            kind: RecordKind::Routine,
            label: active.into(),
            state: None,
        }
    }

    /// Replace the auxiliary state
    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self
    }

    /// Replace the kind
    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether two records occupy the same identity slot
    pub fn same_identity(&self, other: &Record) -> bool {
        self.id == other.id
    }

    /// The `running` flag from auxiliary state, if present
    pub fn running(&self) -> Option<bool> {
        self.state
            .as_ref()
            .and_then(|s| s.get("running"))
            .and_then(|v| v.as_bool())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.running()) {
            (RecordKind::Process, Some(running)) => write!(
                f,
                "PID {}  {:<10}  running={}",
                self.id, self.label, running
            ),
            (RecordKind::Routine, _) => write!(f, "{} -> {}", self.id, self.label),
            (RecordKind::Alert, _) => f.write_str(&self.label),
            _ => write!(f, "[{}] {}", self.id, self.label),
        }
    }
}
