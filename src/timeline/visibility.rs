//! Selecting the events that intersect the visible domain.

use super::{Domain, TimelineEvent};
use intervaltree::IntervalTree;
use std::ops::Range;

/// Exact visibility test:
/// - an instant event is visible when its start lies in the domain,
/// - a period event is visible when its end lies in the domain,
/// - or when it starts before and ends after the domain.
pub fn is_visible(event: &TimelineEvent, domain: Domain) -> bool {
    if domain.is_degenerate() {
        return false;
    }
    match event.end_ms {
        None => domain.contains(event.start_ms),
        Some(end) => {
            domain.contains(end) || (event.start_ms < domain.start && end > domain.end)
        }
    }
}

/// Interval index over an event list, used to narrow the candidates before
/// the exact test runs.
///
/// Keys are whole milliseconds widened outwards so the tree never misses an
/// event the exact test would accept.
pub struct EventIndex {
    tree: IntervalTree<i64, usize>,
    len: usize,
}

impl std::fmt::Debug for EventIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventIndex")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl EventIndex {
    pub fn build(events: &[TimelineEvent]) -> Self {
        let tree = events
            .iter()
            .enumerate()
            .map(|(index, event)| (widen(event.start_ms, event.last_ms()), index))
            .collect();
        Self {
            tree,
            len: events.len(),
        }
    }

    /// Indices of the events visible in `domain`, in original order.
    pub fn visible(&self, events: &[TimelineEvent], domain: Domain) -> Vec<usize> {
        if domain.is_degenerate() {
            return Vec::new();
        }
        let mut indices: Vec<usize> = self
            .tree
            .query(widen(domain.start, domain.end))
            .map(|element| element.value)
            .filter(|&index| {
                events
                    .get(index)
                    .is_some_and(|event| is_visible(event, domain))
            })
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

fn widen(a: f64, b: f64) -> Range<i64> {
    let low = a.min(b).floor() as i64;
    let high = a.max(b).floor() as i64;
    low..high.saturating_add(1)
}
