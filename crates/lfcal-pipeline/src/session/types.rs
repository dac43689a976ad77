//! Session log types.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Entry in a session's operation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unix timestamp of the operation (seconds since epoch).
    pub timestamp: u64,

    /// Operation name (e.g. "refine_without_distortion").
    pub operation: String,

    /// Whether the operation succeeded.
    pub success: bool,

    /// Optional notes or error message.
    pub notes: Option<String>,
}

impl LogEntry {
    /// Create a success log entry with notes.
    pub fn success_with_notes(operation: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            timestamp: current_timestamp(),
            operation: operation.into(),
            success: true,
            notes: Some(notes.into()),
        }
    }

    /// Create a failure log entry.
    pub fn failure(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            timestamp: current_timestamp(),
            operation: operation.into(),
            success: false,
            notes: Some(error.into()),
        }
    }
}

/// Seconds since the Unix epoch; 0 if the clock is set before it.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_entry_constructors() {
        let ok = LogEntry::success_with_notes("refine", "done");
        assert!(ok.success);
        assert_eq!(ok.notes.as_deref(), Some("done"));
        assert!(ok.timestamp > 0);

        let err = LogEntry::failure("refine", "boom");
        assert!(!err.success);
        assert_eq!(err.operation, "refine");
        assert_eq!(err.notes.as_deref(), Some("boom"));
    }
}
