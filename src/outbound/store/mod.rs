//! Adapters for the remote JSON document store.

pub mod client;
pub mod posts;
pub mod users;

pub use client::{DocumentStore, StoreClientError};
pub use posts::RestPostStore;
pub use users::RestUserStore;
