//! Event records - one entry per observed interaction leg
//!
//! A record describes either the request leg or the response leg of a call
//! between two named participants. Records arrive in any order, possibly
//! duplicated, possibly missing their counterpart or their parent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which leg of an interaction a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Fire-and-forget request, no paired response expected
    RequestOneWay,
    /// Fire-and-forget response observed on its own
    ResponseOneWay,
    /// Request with an expected paired response
    RequestTwoWay,
    /// Response paired to a two-way request
    ResponseTwoWay,
}

impl Direction {
    /// Whether this leg expects a separately observed counterpart
    pub fn is_two_way(&self) -> bool {
        matches!(self, Direction::RequestTwoWay | Direction::ResponseTwoWay)
    }

    /// The paired direction for two-way legs; one-way legs have none
    pub fn opposite(&self) -> Option<Direction> {
        match self {
            Direction::RequestTwoWay => Some(Direction::ResponseTwoWay),
            Direction::ResponseTwoWay => Some(Direction::RequestTwoWay),
            Direction::RequestOneWay | Direction::ResponseOneWay => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::RequestOneWay => "request_one_way",
            Direction::ResponseOneWay => "response_one_way",
            Direction::RequestTwoWay => "request_two_way",
            Direction::ResponseTwoWay => "response_two_way",
        }
    }
}

/// A participant on either side of an interaction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Endpoint {
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Endpoint {
    /// Create an endpoint with a display name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Derived fields owned by the correlation pass
///
/// Caller-supplied values are discarded when a record enters correlation;
/// after the pass these reflect only what correlation computed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventMeta {
    /// Start instant in epoch milliseconds, parsed once from `started_at`
    pub started_at_ms: i64,

    /// Disambiguation counter for colliding correlation keys
    pub count: u64,

    /// True only for synthesized counterpart records
    pub is_fake: bool,
}

/// One observed leg of a remote interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Which leg this record describes
    pub direction: Direction,

    /// Identifier shared by a request and its matching response; absent for
    /// malformed or legacy captures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,

    /// Identifier of the enclosing call; absent for root-level calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    /// Originating participant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Endpoint>,

    /// Receiving participant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Endpoint>,

    /// Opaque label describing the interaction
    pub action: String,

    /// When the interaction started
    pub started_at: DateTime<Utc>,

    /// Derived metadata, owned by the correlation pass
    #[serde(default)]
    pub meta: EventMeta,
}

impl EventRecord {
    /// Create a record with the minimal required fields
    pub fn new(direction: Direction, action: impl Into<String>) -> Self {
        Self {
            direction,
            span_id: None,
            parent_span_id: None,
            from: None,
            to: None,
            action: action.into(),
            started_at: Utc::now(),
            meta: EventMeta::default(),
        }
    }

    /// Set the span identifier
    pub fn with_span(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    /// Set the enclosing call's span identifier
    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    /// Set the originating participant by name
    pub fn with_from(mut self, name: impl Into<String>) -> Self {
        self.from = Some(Endpoint::named(name));
        self
    }

    /// Set the receiving participant by name
    pub fn with_to(mut self, name: impl Into<String>) -> Self {
        self.to = Some(Endpoint::named(name));
        self
    }

    /// Set the start timestamp
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Whether this record names both participants
    ///
    /// Records failing this check are dropped by correlation and never
    /// reach sequencing.
    pub fn has_endpoints(&self) -> bool {
        self.from.as_ref().is_some_and(|f| f.name.is_some()) && self.to.is_some()
    }
}
