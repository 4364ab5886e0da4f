//! Flowtrace Core - the shared event model
//!
//! This crate provides the record shape consumed and produced by the
//! reconstruction pipeline:
//!
//! - **Events**: one record per observed interaction leg
//! - **Directions**: one-way and two-way request/response variants
//! - **Metadata**: derived fields owned by the correlation pass

pub mod events;

// Re-export commonly used types
pub use events::{Direction, Endpoint, EventMeta, EventRecord};
