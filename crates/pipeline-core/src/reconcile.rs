use std::collections::HashSet;

use crate::types::{ActionObservation, DedupKey, ObservedSet};

/// Output of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Fresh observations not seen before, oldest first.
    pub changed: Vec<ActionObservation>,
    /// Keys of every fresh observation; the `previous` set for the next poll.
    pub next_keys: HashSet<DedupKey>,
    /// The observed set with fresh state applied, still in catalog order.
    pub merged: ObservedSet,
}

/// Compare a fresh snapshot against the keys seen on the previous poll.
///
/// `fresh` is the control plane's listing, newest first. `changed` is
/// presented oldest first. When one action appears more than once the newest
/// entry is the one merged. Entries with equal timestamps keep the order the
/// control plane returned.
pub fn reconcile(
    previous: &HashSet<DedupKey>,
    observed: &ObservedSet,
    fresh: &[ActionObservation],
) -> Reconciliation {
    let changed: Vec<ActionObservation> = fresh
        .iter()
        .rev()
        .filter(|obs| !previous.contains(&obs.dedup_key()))
        .cloned()
        .collect();

    let next_keys = fresh.iter().map(ActionObservation::dedup_key).collect();

    let mut entries = observed.entries().to_vec();
    // Oldest to newest so the newest attempt of an action is written last.
    for obs in fresh.iter().rev() {
        if let Some(entry) = entries.iter_mut().find(|e| e.action == obs.action) {
            *entry = obs.clone();
        }
    }

    Reconciliation {
        changed,
        next_keys,
        merged: ObservedSet::from_entries(entries),
    }
}
