//! HTTP surface: router, handlers and the listening server.

pub mod routes;
pub mod server;

pub use routes::{AppState, ServiceInfo, router};
pub use server::HttpServer;
