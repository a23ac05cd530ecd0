//! Core types, stacking pipeline, and service wiring for sortstack.

/// Domain models and identifiers shared by every crate.
pub mod model;
/// Adapter turning raw dataset rows into validated records.
pub mod normalize;
/// Year filter, aggregation, and stacking of waste streams.
pub mod pipeline;
/// Traits describing dataset sources.
pub mod ports;
/// Before/after sorting lookup tables.
pub mod reclassify;
/// High-level service facade used by clients.
pub mod service;

pub use model::*;
pub use normalize::*;
pub use pipeline::*;
pub use ports::*;
pub use reclassify::*;
pub use service::*;
