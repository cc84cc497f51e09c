//! Port abstraction for the `users` collection of the document store.

use async_trait::async_trait;

use crate::domain::{Email, NewUser, ProfilePatch, User, UserId};

/// Failures raised by user-store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserStoreError {
    #[error("user store unreachable: {message}")]
    Transport { message: String },
    #[error("user store request timed out: {message}")]
    Timeout { message: String },
    #[error("user document could not be decoded: {message}")]
    Decode { message: String },
    #[error("user store rejected the request: status {status}: {message}")]
    Status { status: u16, message: String },
}

impl UserStoreError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

/// Reads and writes against the `users` collection.
///
/// `find_by_email` matches the stored bytes exactly (case-sensitive), because
/// the email is the directory's logical unique key. The store itself enforces
/// no uniqueness; `DirectoryService` owns the lookup-then-create discipline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by exact email match.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserStoreError>;

    /// Fetch a user by store key.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserStoreError>;

    /// Create a directory entry; the store assigns and returns the key.
    async fn create(&self, user: &NewUser) -> Result<UserId, UserStoreError>;

    /// Partially update profile fields of an existing entry.
    async fn update_profile(&self, id: &UserId, patch: &ProfilePatch)
        -> Result<(), UserStoreError>;
}
