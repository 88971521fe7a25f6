//! Shared identifiers, lifecycle states, and progress snapshots.

/// Download identifier, derived from (url, destination dir, file name).
pub type DownloadId = u64;

/// Lifecycle state of a download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Created,
    Queued,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Created => "created",
            Status::Queued => "queued",
            Status::Running => "running",
            Status::Paused => "paused",
            Status::Completed => "completed",
            Status::Failed => "failed",
            Status::Cancelled => "cancelled",
        }
    }

    /// True for states with no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Failed | Status::Cancelled)
    }
}

/// Ordering hint carried on a request. Admission is strict FIFO; the
/// priority is stored for callers and future policies but never reorders
/// the waiting queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// Point-in-time progress of a transfer. `total_bytes` is 0 until the
/// server reports a length.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(Status::Completed.is_terminal());
        assert!(Status::Failed.is_terminal());
        assert!(Status::Cancelled.is_terminal());
        assert!(!Status::Created.is_terminal());
        assert!(!Status::Queued.is_terminal());
        assert!(!Status::Running.is_terminal());
        assert!(!Status::Paused.is_terminal());
    }

    #[test]
    fn status_as_str() {
        assert_eq!(Status::Queued.as_str(), "queued");
        assert_eq!(Status::Cancelled.as_str(), "cancelled");
    }
}
