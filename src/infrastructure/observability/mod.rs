//! Observability for the Toy Exchange API
//!
//! Structured logs via `tracing`, written to stdout either human-readable
//! (`pretty`) or as one JSON object per line (`json`) for log shippers.

pub mod logging;

pub use logging::init_tracing;
