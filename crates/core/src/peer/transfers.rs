//! Synthesis of per-album queue records from the peer backend's transfers.

use crate::queue::QueueRecord;

use super::search::{file_name, normalize_path};
use super::types::{Transfer, UserTransfers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Active,
    Done,
}

/// States are flag lists like `"Queued, Remotely"`; the first flag decides.
fn phase(transfer: &Transfer) -> Phase {
    let primary = transfer.state.split(',').next().unwrap_or("").trim();
    match primary {
        "Completed" => Phase::Done,
        "InProgress" | "Initializing" => Phase::Active,
        _ => Phase::Waiting,
    }
}

fn remaining_bytes(transfer: &Transfer) -> u64 {
    match phase(transfer) {
        Phase::Done => 0,
        _ if transfer.bytes_remaining > 0 => transfer.bytes_remaining,
        _ => transfer.size.saturating_sub(transfer.bytes_transferred),
    }
}

/// One record per `(username, directory)` that still has unfinished files.
///
/// Directories are merged after separator normalization, so the same folder
/// reported with `\` and `/` yields one record. Fully completed directories
/// are left out: they are no longer in flight.
pub fn queue_records(users: &[UserTransfers]) -> Vec<QueueRecord> {
    let mut records = Vec::new();

    for user in users {
        let mut dirs: Vec<(String, Vec<&Transfer>)> = Vec::new();
        for dir in &user.directories {
            let directory = normalize_path(&dir.directory);
            match dirs.iter_mut().find(|(d, _)| *d == directory) {
                Some((_, files)) => files.extend(dir.files.iter()),
                None => dirs.push((directory, dir.files.iter().collect())),
            }
        }

        for (directory, files) in dirs {
            let phases: Vec<Phase> = files.iter().map(|t| phase(t)).collect();
            if phases.iter().all(|p| *p == Phase::Done) {
                continue;
            }
            let state = if phases.iter().any(|p| *p != Phase::Waiting) {
                "InProgress"
            } else {
                "Queued"
            };

            records.push(QueueRecord {
                id: format!("{}:{}", user.username, directory),
                title: file_name(directory.trim_end_matches('/')).to_string(),
                state: state.to_string(),
                size: files.iter().map(|t| t.size).sum(),
                size_left: files.iter().map(|t| remaining_bytes(t)).sum(),
            });
        }
    }

    records
}
