//! Port abstraction for the `posts` collection of the document store.

use async_trait::async_trait;

use crate::domain::{Post, PostDraft, PostId, PostPatch};

/// Failures raised by post-store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostStoreError {
    #[error("post store unreachable: {message}")]
    Transport { message: String },
    #[error("post store request timed out: {message}")]
    Timeout { message: String },
    #[error("post document could not be decoded: {message}")]
    Decode { message: String },
    #[error("post store rejected the request: status {status}: {message}")]
    Status { status: u16, message: String },
}

impl PostStoreError {
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

/// Reads and writes against the `posts` collection.
///
/// Callers gate `update`/`delete` through the ownership guard before issuing
/// the store call; the adapter performs no authorisation of its own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Fetch the whole feed.
    async fn list(&self) -> Result<Vec<Post>, PostStoreError>;

    /// Fetch a post by store key.
    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostStoreError>;

    /// Create a post; the store assigns and returns the key.
    async fn create(&self, draft: &PostDraft) -> Result<PostId, PostStoreError>;

    /// Partially update caption/image of an existing post.
    async fn update(&self, id: &PostId, patch: &PostPatch) -> Result<(), PostStoreError>;

    /// Remove a post by key.
    async fn delete(&self, id: &PostId) -> Result<(), PostStoreError>;
}
