// Migrate-then-serve entrypoint
pub mod startup;

// Readiness polling
pub mod readiness_gate;

// Restart supervision
pub mod supervisor;

// Process shutdown
pub mod shutdown;
