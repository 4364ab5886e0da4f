//! Typed correlation keys
//!
//! A key identifies one slot in the correlation mapping. Records carrying a
//! span id use the [`Span`](CorrelationKey::Span) form; records without one
//! fall back to the [`Route`](CorrelationKey::Route) form built from
//! lower-cased participant names, which keeps malformed records partitioned
//! away from well-formed ones sharing a direction.

use flowtrace_core::{Direction, Endpoint, EventRecord};

/// One slot in the correlation mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CorrelationKey {
    /// Well-formed records: span id shared by both legs
    Span {
        direction: Direction,
        span_id: String,
        count: u64,
    },

    /// Records missing a span id, partitioned by the route they travel
    Route {
        from: String,
        to: String,
        direction: Direction,
        count: u64,
    },
}

impl CorrelationKey {
    /// Key for the slot this record occupies
    pub fn for_record(record: &EventRecord) -> Self {
        match &record.span_id {
            Some(span_id) => CorrelationKey::Span {
                direction: record.direction,
                span_id: span_id.clone(),
                count: record.meta.count,
            },
            None => CorrelationKey::Route {
                from: endpoint_name(&record.from),
                to: endpoint_name(&record.to),
                direction: record.direction,
                count: record.meta.count,
            },
        }
    }

    /// Key for the slot of this record's paired counterpart
    ///
    /// One-way directions have no counterpart slot. In the route form the
    /// counterpart travels the reverse route, so the names swap sides.
    pub fn opposite_of(record: &EventRecord) -> Option<Self> {
        let direction = record.direction.opposite()?;
        Some(match &record.span_id {
            Some(span_id) => CorrelationKey::Span {
                direction,
                span_id: span_id.clone(),
                count: record.meta.count,
            },
            None => CorrelationKey::Route {
                from: endpoint_name(&record.to),
                to: endpoint_name(&record.from),
                direction,
                count: record.meta.count,
            },
        })
    }
}

/// Lower-cased endpoint name; empty when the endpoint or its name is absent
fn endpoint_name(endpoint: &Option<Endpoint>) -> String {
    endpoint
        .as_ref()
        .and_then(|e| e.name.as_deref())
        .map(str::to_lowercase)
        .unwrap_or_default()
}
