//! Snapfeed library modules.
//!
//! A session-backed post-sharing service: domain types and ports, HTTP
//! handlers, and adapters for the remote document store and identity
//! provider.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use middleware::Trace;
