//! Readiness probe adapters.

mod database_probe;
mod http_probe;
mod tcp_probe;

pub use database_probe::DatabaseProbe;
pub use http_probe::HttpProbe;
pub use tcp_probe::TcpProbe;
