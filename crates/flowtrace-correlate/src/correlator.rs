//! Correlation - pairing request and response legs
//!
//! Consumes one event set and builds the mapping from correlation key to
//! record. Derived timing metadata is assigned up front, colliding keys are
//! disambiguated with a pass-local counter, and every two-way request whose
//! counterpart was never observed gets a synthesized one.

use crate::key::CorrelationKey;
use flowtrace_core::{EventMeta, EventRecord};
use indexmap::IndexMap;
use tracing::debug;

/// Correlation mapping produced by [`correlate`]
///
/// Insertion order is preserved so downstream sequencing is deterministic.
pub type CorrelationMap = IndexMap<CorrelationKey, EventRecord>;

/// Build the correlation mapping for one event set.
///
/// Takes ownership of the input; caller-supplied metadata is discarded
/// before the pass computes its own. Records missing either participant are
/// dropped and never reach sequencing. The returned mapping holds, for every
/// two-way request, both directions - one possibly synthesized and marked
/// with `meta.is_fake`.
pub fn correlate(mut events: Vec<EventRecord>) -> CorrelationMap {
    let total = events.len();

    // Metadata reflects only this pass. The instant is parsed exactly once,
    // before any key computation, so keys stay stable across the pass.
    for event in &mut events {
        event.meta = EventMeta {
            started_at_ms: event.started_at.timestamp_millis(),
            ..EventMeta::default()
        };
    }

    // Stable sort: ties keep input order, which is the disambiguation
    // tie-break for duplicates
    events.sort_by_key(|e| e.meta.started_at_ms);

    let requests: Vec<EventRecord> = events.into_iter().filter(|e| e.has_endpoints()).collect();
    if requests.len() < total {
        debug!(
            dropped = total - requests.len(),
            "ignoring records without named participants"
        );
    }

    let mut map = CorrelationMap::new();
    let mut counter: u64 = 1;
    let mut two_way: Vec<CorrelationKey> = Vec::new();

    for mut request in requests {
        let mut key = CorrelationKey::for_record(&request);
        if map.contains_key(&key) {
            // Same call observed twice, or a coincidental collision: give
            // this record the next counter value and rekey it
            request.meta.count = counter;
            counter += 1;
            key = CorrelationKey::for_record(&request);
        }
        if request.direction.is_two_way() {
            two_way.push(key.clone());
        }
        map.insert(key, request);
    }

    let mut synthesized = 0usize;
    for key in two_way {
        let Some(request) = map.get(&key) else {
            continue;
        };
        let Some(opposite) = CorrelationKey::opposite_of(request) else {
            continue;
        };
        if map.contains_key(&opposite) {
            // A real counterpart was observed
            continue;
        }
        let Some(counterpart) = synthesize_counterpart(request) else {
            continue;
        };
        map.insert(opposite, counterpart);
        synthesized += 1;
    }

    debug!(slots = map.len(), synthesized, "correlation pass complete");
    map
}

/// Inferred counterpart for a two-way leg whose match was never observed
fn synthesize_counterpart(request: &EventRecord) -> Option<EventRecord> {
    let direction = request.direction.opposite()?;
    Some(EventRecord {
        direction,
        span_id: request.span_id.clone(),
        parent_span_id: request.parent_span_id.clone(),
        from: request.to.clone(),
        to: request.from.clone(),
        action: request.action.clone(),
        started_at: request.started_at,
        meta: EventMeta {
            started_at_ms: request.meta.started_at_ms,
            count: request.meta.count,
            is_fake: true,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use flowtrace_core::Direction;

    fn at(ms: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn request(span: &str, from: &str, to: &str, ms: i64) -> EventRecord {
        EventRecord::new(Direction::RequestTwoWay, "call")
            .with_span(span)
            .with_from(from)
            .with_to(to)
            .with_started_at(at(ms))
    }

    #[test]
    fn test_caller_metadata_is_discarded() {
        let mut event = request("s1", "a", "b", 5_000);
        event.meta = EventMeta {
            started_at_ms: 999,
            count: 7,
            is_fake: true,
        };

        let map = correlate(vec![event]);
        let stored = map
            .get(&CorrelationKey::Span {
                direction: Direction::RequestTwoWay,
                span_id: "s1".to_string(),
                count: 0,
            })
            .unwrap();
        assert_eq!(stored.meta.started_at_ms, 5_000);
        assert_eq!(stored.meta.count, 0);
        assert!(!stored.meta.is_fake);
    }

    #[test]
    fn test_records_without_endpoints_are_dropped() {
        let valid = request("s1", "a", "b", 1_000);
        let no_to = EventRecord::new(Direction::RequestTwoWay, "call")
            .with_span("s2")
            .with_from("a")
            .with_started_at(at(2_000));

        let map = correlate(vec![valid, no_to]);
        // s1 request plus its synthesized response; s2 gone entirely
        assert_eq!(map.len(), 2);
        assert!(map.values().all(|e| e.span_id.as_deref() == Some("s1")));
    }

    #[test]
    fn test_duplicates_disambiguated_in_chronological_order() {
        // Fed in reverse order; the sort puts the earlier record first, so
        // it keeps count 0 and the later one draws from the counter
        let late = request("s1", "a", "b", 2_000);
        let early = request("s1", "a", "b", 1_000);

        let map = correlate(vec![late, early]);
        assert_eq!(map.len(), 4); // two requests + two synthesized responses

        let first = map
            .get(&CorrelationKey::Span {
                direction: Direction::RequestTwoWay,
                span_id: "s1".to_string(),
                count: 0,
            })
            .unwrap();
        assert_eq!(first.meta.started_at_ms, 1_000);

        let second = map
            .get(&CorrelationKey::Span {
                direction: Direction::RequestTwoWay,
                span_id: "s1".to_string(),
                count: 1,
            })
            .unwrap();
        assert_eq!(second.meta.started_at_ms, 2_000);
    }

    #[test]
    fn test_no_synthesis_when_counterpart_observed() {
        let req = request("s1", "a", "b", 1_000);
        let resp = EventRecord::new(Direction::ResponseTwoWay, "call")
            .with_span("s1")
            .with_from("b")
            .with_to("a")
            .with_started_at(at(1_500));

        let map = correlate(vec![req, resp]);
        assert_eq!(map.len(), 2);
        assert!(map.values().all(|e| !e.meta.is_fake));
    }

    #[test]
    fn test_synthesized_counterpart_fields() {
        let map = correlate(vec![request("s1", "a", "b", 1_000)]);
        assert_eq!(map.len(), 2);

        let fake = map.values().find(|e| e.meta.is_fake).unwrap();
        assert_eq!(fake.direction, Direction::ResponseTwoWay);
        assert_eq!(fake.span_id.as_deref(), Some("s1"));
        assert_eq!(fake.action, "call");
        assert_eq!(fake.from.as_ref().unwrap().name.as_deref(), Some("b"));
        assert_eq!(fake.to.as_ref().unwrap().name.as_deref(), Some("a"));
        assert_eq!(fake.meta.started_at_ms, 1_000);
    }

    #[test]
    fn test_one_way_records_are_never_paired() {
        let notify = EventRecord::new(Direction::RequestOneWay, "notify")
            .with_span("s1")
            .with_from("a")
            .with_to("b")
            .with_started_at(at(1_000));

        let map = correlate(vec![notify]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_lone_response_synthesizes_request() {
        let resp = EventRecord::new(Direction::ResponseTwoWay, "call")
            .with_span("s1")
            .with_from("b")
            .with_to("a")
            .with_started_at(at(1_000));

        let map = correlate(vec![resp]);
        assert_eq!(map.len(), 2);
        let fake = map.values().find(|e| e.meta.is_fake).unwrap();
        assert_eq!(fake.direction, Direction::RequestTwoWay);
        assert_eq!(fake.from.as_ref().unwrap().name.as_deref(), Some("a"));
    }
}
