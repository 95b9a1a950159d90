use std::collections::HashSet;

use super::types::{FinishedQueueItem, QueueDiff, QueueRecord};

/// Records of `previous` whose id is absent from `current`, in `previous`
/// order.
///
/// An empty `previous` yields nothing, so the first snapshot never reports
/// anything as finished. Records that are new in `current` are ignored.
pub fn detect_finished_queue_items(
    previous: &[QueueRecord],
    current: &[QueueRecord],
) -> Vec<QueueRecord> {
    if previous.is_empty() {
        return Vec::new();
    }
    let current_ids: HashSet<&str> = current.iter().map(|r| r.id.as_str()).collect();
    previous
        .iter()
        .filter(|r| !current_ids.contains(r.id.as_str()))
        .cloned()
        .collect()
}

/// Pair `current` with the items that finished since `previous`.
pub fn diff_queue(previous: &[QueueRecord], current: Vec<QueueRecord>) -> QueueDiff {
    let finished_items = detect_finished_queue_items(previous, &current)
        .into_iter()
        .map(FinishedQueueItem::from)
        .collect();
    QueueDiff {
        current_queue: current,
        finished_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueExitOutcome;
    use crate::testing::fixtures::queue_record;

    fn ids(records: &[QueueRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_empty_previous_finishes_nothing() {
        let current = vec![queue_record("1", "Kid A")];
        assert!(detect_finished_queue_items(&[], &current).is_empty());
        assert!(detect_finished_queue_items(&[], &[]).is_empty());
    }

    #[test]
    fn test_exactly_the_missing_ids_in_previous_order() {
        let previous = vec![
            queue_record("3", "c"),
            queue_record("1", "a"),
            queue_record("2", "b"),
            queue_record("4", "d"),
        ];
        let current = vec![queue_record("2", "b"), queue_record("5", "e")];

        let finished = detect_finished_queue_items(&previous, &current);
        assert_eq!(ids(&finished), vec!["3", "1", "4"]);
    }

    #[test]
    fn test_identity_is_id_only() {
        let previous = vec![queue_record("1", "Kid A")];
        let mut changed = queue_record("1", "Kid A (Remaster)");
        changed.state = "completed".to_string();
        changed.size_left = 0;

        assert!(detect_finished_queue_items(&previous, &[changed]).is_empty());
    }

    #[test]
    fn test_everything_finished_when_current_is_empty() {
        let previous = vec![queue_record("1", "a"), queue_record("2", "b")];
        assert_eq!(ids(&detect_finished_queue_items(&previous, &[])), vec!["1", "2"]);
    }

    #[test]
    fn test_diff_keeps_current_and_marks_outcome_unknown() {
        let previous = vec![queue_record("1", "a"), queue_record("2", "b")];
        let current = vec![queue_record("2", "b")];

        let diff = diff_queue(&previous, current.clone());
        assert_eq!(diff.current_queue, current);
        assert_eq!(diff.finished_items.len(), 1);
        assert_eq!(diff.finished_items[0].record.id, "1");
        assert_eq!(diff.finished_items[0].outcome, QueueExitOutcome::Unknown);
    }
}
