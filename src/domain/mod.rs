// Port interfaces
pub mod ports;

// Readiness state machine
pub mod readiness;

// Restart policy and backoff
pub mod restart;

// Domain-specific error types
pub mod errors;
