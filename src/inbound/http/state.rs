//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O. There is no process-wide
//! singleton: adapters are constructed explicitly at startup (or per test)
//! and injected here.

use std::sync::Arc;

use crate::domain::ports::{IdentityProvider, PostStore, UserStore};
use crate::domain::DirectoryService;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub identity: Arc<dyn IdentityProvider>,
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub directory: DirectoryService,
}

impl HttpState {
    /// Bundle the three ports; the directory service shares the user store.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserStore>,
        posts: Arc<dyn PostStore>,
    ) -> Self {
        let directory = DirectoryService::new(users.clone());
        Self {
            identity,
            users,
            posts,
            directory,
        }
    }
}
