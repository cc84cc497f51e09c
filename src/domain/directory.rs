//! User directory sync: one directory entry per external identity.
//!
//! `ensure_user` runs on every successful authentication. Lookup is by email
//! (the logical unique key); a hit returns the stored record unchanged so a
//! login never clobbers user-edited profile fields with provider claims.
//!
//! The store offers no transactions or compare-and-swap, so two concurrent
//! first logins for the same email can race and create two documents. The
//! lookup-first path makes retries converge on the older record; this is an
//! accepted gap.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use super::auth::ExternalIdentity;
use super::error::Error;
use super::ports::{UserStore, UserStoreError};
use super::user::{placeholder_image, NewUser, User};

/// Looks up or creates the directory entry backing an external identity.
#[derive(Clone)]
pub struct DirectoryService {
    users: Arc<dyn UserStore>,
}

impl DirectoryService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Resolve an authenticated identity to its directory entry, creating one
    /// on first login.
    ///
    /// Idempotent per email: a second call returns the same record and
    /// performs no store write. On failure the caller must abort sign-in;
    /// no session may be established for a user that failed directory sync.
    pub async fn ensure_user(&self, identity: &ExternalIdentity) -> Result<User, Error> {
        if let Some(existing) = self
            .users
            .find_by_email(&identity.email)
            .await
            .map_err(directory_unavailable)?
        {
            return Ok(existing);
        }

        let new_user = NewUser {
            email: identity.email.clone(),
            name: identity.name.clone().unwrap_or_default(),
            title: String::new(),
            image: identity
                .image
                .clone()
                .unwrap_or_else(|| placeholder_image(&identity.external_id)),
            created_at: Utc::now(),
        };
        let id = self
            .users
            .create(&new_user)
            .await
            .map_err(directory_unavailable)?;
        info!(user_id = %id, "created directory entry for first login");
        Ok(new_user.into_user(id))
    }

    /// Create the directory entry for a freshly registered identity, carrying
    /// the name and title supplied at sign-up.
    ///
    /// Lookup-first keeps the operation safe against a concurrent first login
    /// for the same email: an existing record wins and the supplied profile
    /// fields are discarded.
    pub async fn register_user(
        &self,
        identity: &ExternalIdentity,
        name: String,
        title: String,
    ) -> Result<User, Error> {
        if let Some(existing) = self
            .users
            .find_by_email(&identity.email)
            .await
            .map_err(directory_unavailable)?
        {
            return Ok(existing);
        }

        let new_user = NewUser {
            email: identity.email.clone(),
            name,
            title,
            image: identity
                .image
                .clone()
                .unwrap_or_else(|| placeholder_image(&identity.external_id)),
            created_at: Utc::now(),
        };
        let id = self
            .users
            .create(&new_user)
            .await
            .map_err(directory_unavailable)?;
        info!(user_id = %id, "created directory entry for new registration");
        Ok(new_user.into_user(id))
    }
}

fn directory_unavailable(err: UserStoreError) -> Error {
    error!(error = %err, "user directory sync failed");
    Error::service_unavailable("sign-in is temporarily unavailable")
}
