//! Transfer queue snapshots and the diff that detects finished items.
//!
//! The diff is stateless: callers keep the previous snapshot and pass it in.
//! An entry that disappears is reported as finished without claiming whether
//! it succeeded.

mod diff;
mod source;
mod types;

pub use diff::{detect_finished_queue_items, diff_queue};
pub use source::{fetch_queue_with_diff, CatalogQueue, PeerQueue, QueueSource};
pub use types::{FinishedQueueItem, QueueDiff, QueueExitOutcome, QueueRecord};
