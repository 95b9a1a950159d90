use serde::{Deserialize, Serialize};

/// One in-flight transfer, reduced to the shape both backends share.
///
/// `id` is only meaningful within one backend: the catalog's numeric queue id,
/// or `"{username}:{directory}"` on the peer backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    pub id: String,
    pub title: String,
    pub state: String,
    /// Total bytes.
    pub size: u64,
    /// Bytes still to transfer.
    pub size_left: u64,
}

/// Why an entry left the queue.
///
/// Absence alone cannot tell a completed transfer from a cancelled or failed
/// one, so every finished item is `Unknown` for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueExitOutcome {
    Unknown,
}

/// A queue entry seen in the previous snapshot and gone from the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedQueueItem {
    pub record: QueueRecord,
    pub outcome: QueueExitOutcome,
}

impl From<QueueRecord> for FinishedQueueItem {
    fn from(record: QueueRecord) -> Self {
        Self {
            record,
            outcome: QueueExitOutcome::Unknown,
        }
    }
}

/// Result of [`fetch_queue_with_diff`](super::fetch_queue_with_diff).
///
/// `current_queue` becomes the caller's `previous` for the next call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueDiff {
    pub current_queue: Vec<QueueRecord>,
    pub finished_items: Vec<FinishedQueueItem>,
}
