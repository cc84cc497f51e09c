//! Outbound adapters: implementations of domain ports against remote
//! services.

pub mod identity;
pub mod store;

pub use identity::PasswordIdentityProvider;
pub use store::{DocumentStore, RestPostStore, RestUserStore};
