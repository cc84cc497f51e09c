//! Domain ports for the hexagonal boundary.

mod identity_provider;
mod post_store;
mod user_store;

pub use identity_provider::{FixtureIdentityProvider, IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use post_store::{PostStore, PostStoreError};
#[cfg(test)]
pub use post_store::MockPostStore;
pub use user_store::{UserStore, UserStoreError};
#[cfg(test)]
pub use user_store::MockUserStore;
