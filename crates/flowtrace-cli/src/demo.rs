//! Sample capture generator
//!
//! Produces a synthetic event set for trying the reconstruction without a
//! real capture source. The generated set deliberately includes the awkward
//! cases the pipeline exists for: a response that was never captured, a
//! duplicated request leg, an out-of-order file, and a record whose parent
//! span is missing.

use chrono::{DateTime, Duration, Utc};
use flowtrace_core::{Direction, EventRecord};
use ulid::Ulid;

/// Synthetic capture clock, stepping a fixed amount per observation
struct Clock {
    now: DateTime<Utc>,
}

impl Clock {
    fn new() -> Self {
        Self { now: Utc::now() }
    }

    fn tick(&mut self) -> DateTime<Utc> {
        self.now += Duration::milliseconds(17);
        self.now
    }
}

/// Generate a sample capture with `calls` top-level calls
pub fn generate(calls: usize) -> Vec<EventRecord> {
    let mut clock = Clock::new();
    let mut events = Vec::new();

    for call in 0..calls {
        let root_span = Ulid::new().to_string();
        let mut chunk = Vec::new();

        chunk.push(
            EventRecord::new(Direction::RequestTwoWay, "place_order")
                .with_span(&root_span)
                .with_from("gateway")
                .with_to("orders")
                .with_started_at(clock.tick()),
        );

        // Inventory hop: both legs observed
        let stock_span = Ulid::new().to_string();
        let stock_request = EventRecord::new(Direction::RequestTwoWay, "reserve_stock")
            .with_span(&stock_span)
            .with_parent(&root_span)
            .with_from("orders")
            .with_to("inventory")
            .with_started_at(clock.tick());
        chunk.push(stock_request.clone());
        if call == 1 {
            // The same request observed twice
            chunk.push(stock_request.with_started_at(clock.tick()));
        }
        chunk.push(
            EventRecord::new(Direction::ResponseTwoWay, "reserve_stock")
                .with_span(&stock_span)
                .with_parent(&root_span)
                .with_from("inventory")
                .with_to("orders")
                .with_started_at(clock.tick()),
        );

        // Billing hop: the response of the first call was never captured
        let billing_span = Ulid::new().to_string();
        chunk.push(
            EventRecord::new(Direction::RequestTwoWay, "charge_card")
                .with_span(&billing_span)
                .with_parent(&root_span)
                .with_from("orders")
                .with_to("billing")
                .with_started_at(clock.tick()),
        );
        if call != 0 {
            chunk.push(
                EventRecord::new(Direction::ResponseTwoWay, "charge_card")
                    .with_span(&billing_span)
                    .with_parent(&root_span)
                    .with_from("billing")
                    .with_to("orders")
                    .with_started_at(clock.tick()),
            );
        }

        // Fire-and-forget receipt
        chunk.push(
            EventRecord::new(Direction::RequestOneWay, "emit_receipt")
                .with_span(Ulid::new().to_string())
                .with_parent(&root_span)
                .with_from("orders")
                .with_to("notifier")
                .with_started_at(clock.tick()),
        );

        chunk.push(
            EventRecord::new(Direction::ResponseTwoWay, "place_order")
                .with_span(&root_span)
                .with_from("orders")
                .with_to("gateway")
                .with_started_at(clock.tick()),
        );

        // Captures rarely arrive in causal order
        if call % 2 == 1 {
            chunk.reverse();
        }
        events.extend(chunk);
    }

    // A record whose parent span was never captured; only the recovery
    // path of the sequencer can place it
    events.push(
        EventRecord::new(Direction::RequestOneWay, "audit_log")
            .with_span(Ulid::new().to_string())
            .with_parent(Ulid::new().to_string())
            .with_from("billing")
            .with_to("auditor")
            .with_started_at(clock.tick()),
    );

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowtrace_correlate::{correlate, sequence};

    #[test]
    fn test_generated_capture_reconstructs() {
        let events = generate(3);
        let map = correlate(events);

        let candidate_total = map
            .values()
            .filter(|e| e.direction != Direction::ResponseTwoWay)
            .count();

        let ordered = sequence(&map);
        let emitted = ordered
            .iter()
            .filter(|e| e.direction != Direction::ResponseTwoWay)
            .count();
        assert_eq!(emitted, candidate_total);

        // The dropped billing response comes back synthesized
        assert!(ordered
            .iter()
            .any(|e| e.action == "charge_card" && e.meta.is_fake));

        // The orphaned audit record is recovered, not lost
        assert!(ordered.iter().any(|e| e.action == "audit_log"));
    }

    #[test]
    fn test_generated_capture_has_duplicates_and_gaps() {
        let events = generate(2);

        let stock_requests = events
            .iter()
            .filter(|e| e.action == "reserve_stock" && e.direction == Direction::RequestTwoWay)
            .count();
        assert_eq!(stock_requests, 3); // one per call, plus the duplicate

        let billing_responses = events
            .iter()
            .filter(|e| e.action == "charge_card" && e.direction == Direction::ResponseTwoWay)
            .count();
        assert_eq!(billing_responses, 1); // the first call's response is gone
    }
}
