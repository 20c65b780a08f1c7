//! Ledger aggregation.

use crate::domain::{EventKind, FailureEvent, FailureStats};
use std::collections::HashMap;

/// Group events by node name and total them, skipping `excluded` events.
///
/// Groups are ordered by count, highest first. Ties keep the order in which
/// each name first appeared.
#[must_use]
pub fn aggregate_events(events: &[FailureEvent], excluded: EventKind) -> Vec<FailureStats> {
    let mut groups: Vec<FailureStats> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for event in events.iter().filter(|e| e.kind != excluded) {
        let position = *positions.entry(event.node_name.as_str()).or_insert_with(|| {
            groups.push(FailureStats {
                node_name: event.node_name.clone(),
                failure_count: 0,
                total_lost: 0.0,
            });
            groups.len() - 1
        });

        let group = &mut groups[position];
        group.failure_count += 1;
        group.total_lost += event.cost_at_failure;
    }

    // Stable sort keeps first-appearance order among equal counts.
    groups.sort_by(|a, b| b.failure_count.cmp(&a.failure_count));
    groups
}
