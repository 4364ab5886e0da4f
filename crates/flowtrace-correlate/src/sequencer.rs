//! Sequencing - reconstructing the causal call order
//!
//! Consumes the correlation mapping and emits one linear sequence that
//! respects parent/child nesting and chronological order. When the hierarchy
//! cannot connect every record (missing parents, disconnected subtrees), the
//! earliest unreached candidate is promoted to a synthetic root so nothing
//! is lost.

use crate::correlator::CorrelationMap;
use crate::key::CorrelationKey;
use flowtrace_core::{Direction, EventRecord};
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::debug;

/// Reconstruct the ordered event sequence from a correlation mapping.
///
/// Candidates are two-way requests plus both one-way legs; paired
/// `ResponseTwoWay` records are emitted only as the closing leg of their
/// request's subtree. Every candidate appears exactly once, however
/// disconnected the parent/child graph is.
pub fn sequence(map: &CorrelationMap) -> Vec<EventRecord> {
    let candidates: Vec<&EventRecord> = map
        .values()
        .filter(|e| {
            matches!(
                e.direction,
                Direction::RequestTwoWay | Direction::RequestOneWay | Direction::ResponseOneWay
            )
        })
        .collect();

    // LIFO work-list: sorted descending by start so the earliest root pops
    // first
    let mut roots: Vec<usize> = (0..candidates.len())
        .filter(|&i| candidates[i].parent_span_id.is_none())
        .collect();
    roots.sort_by_key(|&i| Reverse(candidates[i].meta.started_at_ms));

    let mut seen: HashSet<String> = HashSet::new();
    let mut visited: HashSet<usize> = HashSet::new();
    let mut output: Vec<&EventRecord> = Vec::new();

    loop {
        if let Some(root) = roots.pop() {
            visited.insert(root);
            output.extend(walk_hierarchy(candidates[root], map, &candidates, &mut seen));
        } else {
            // The declared roots did not reach every candidate: promote the
            // earliest unseen one and keep going
            let missing = (0..candidates.len())
                .filter(|i| !visited.contains(i))
                .filter(|&i| match &candidates[i].span_id {
                    Some(span) => !seen.contains(span),
                    None => true,
                })
                .min_by_key(|&i| candidates[i].meta.started_at_ms);
            match missing {
                Some(i) => {
                    debug!(action = %candidates[i].action, "promoting disconnected record to root");
                    roots.push(i);
                }
                None => break,
            }
        }
    }

    output.into_iter().cloned().collect()
}

/// Depth-first walk from one root, interleaving each opening leg with its
/// children and its closing leg
fn walk_hierarchy<'a>(
    root: &'a EventRecord,
    map: &'a CorrelationMap,
    candidates: &[&'a EventRecord],
    seen: &mut HashSet<String>,
) -> Vec<&'a EventRecord> {
    let mut output = Vec::new();
    let mut stack = vec![root];

    while let Some(flow) = stack.pop() {
        output.push(flow);
        if flow.direction == Direction::ResponseTwoWay {
            // Closing leg: nothing to expand
            continue;
        }

        // The closing leg goes on the stack before the children so every
        // child subtree is emitted ahead of it
        if let Some(opposite) = CorrelationKey::opposite_of(flow) {
            if let Some(closing) = map.get(&opposite) {
                stack.push(closing);
            }
        }

        if let Some(span_id) = flow.span_id.as_deref() {
            if !seen.contains(span_id) {
                // Pushed descending by start so the LIFO pops them in
                // chronological order
                let mut children: Vec<&EventRecord> = candidates
                    .iter()
                    .copied()
                    .filter(|e| e.parent_span_id.as_deref() == Some(span_id))
                    .collect();
                children.sort_by_key(|e| Reverse(e.meta.started_at_ms));
                stack.extend(children);
            }
            // Duplicate slots sharing this span are still appended when
            // popped, but their children are not expanded again
            seen.insert(span_id.to_string());
        }
    }

    output
}
