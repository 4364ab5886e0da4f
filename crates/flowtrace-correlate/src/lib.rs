//! Event correlation and sequence reconstruction
//!
//! Two stages, executed in order:
//!
//! 1. [`correlate`] pairs request and response legs: derived timing metadata
//!    is assigned, colliding keys are disambiguated, and missing two-way
//!    counterparts are synthesized.
//! 2. [`sequence`] reconstructs a single linear event order that respects
//!    parent/child nesting and chronological order, recovering when the
//!    hierarchy cannot connect every record.
//!
//! Both stages degrade on malformed input instead of erroring: records
//! missing participants are dropped, records missing a span id fall back to
//! a route-based key, and records missing a parent are treated as roots.

pub mod correlator;
pub mod key;
pub mod sequencer;

pub use correlator::{correlate, CorrelationMap};
pub use key::CorrelationKey;
pub use sequencer::sequence;
