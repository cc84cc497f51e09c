//! Document-store adapter for the `posts` collection.
//!
//! The store spells the owner field `uid`. Documents that fail validation
//! (blank caption, malformed owner key) are decode errors, not silently
//! skipped: a corrupt feed should be visible, not truncated.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ports::{PostStore, PostStoreError};
use crate::domain::{Caption, Post, PostDraft, PostId, PostPatch, UserId};

use super::client::{DocumentStore, StoreClientError};

const COLLECTION: &str = "posts";

/// Wire shape of one post document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDocument {
    caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    uid: String,
    created_at: DateTime<Utc>,
}

impl PostDocument {
    fn from_draft(draft: &PostDraft) -> Self {
        Self {
            caption: draft.caption.as_ref().to_owned(),
            image: draft.image.clone(),
            uid: draft.owner_id.as_ref().to_owned(),
            created_at: draft.created_at,
        }
    }

    fn into_post(self, key: &str) -> Result<Post, PostStoreError> {
        let id = PostId::new(key)
            .map_err(|err| PostStoreError::decode(format!("post key {key:?}: {err}")))?;
        let caption = Caption::new(self.caption)
            .map_err(|err| PostStoreError::decode(format!("post {key}: {err}")))?;
        let owner_id = UserId::new(self.uid)
            .map_err(|err| PostStoreError::decode(format!("post {key} owner: {err}")))?;
        Ok(Post::new(id, caption, self.image, owner_id, self.created_at))
    }
}

fn decode_post(key: &str, value: Value) -> Result<Post, PostStoreError> {
    let document: PostDocument = serde_json::from_value(value)
        .map_err(|err| PostStoreError::decode(format!("post {key}: {err}")))?;
    document.into_post(key)
}

/// Decode the whole collection: a keyed object, absent when empty.
fn decode_collection(value: Option<Value>) -> Result<Vec<Post>, PostStoreError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let documents: BTreeMap<String, Value> = serde_json::from_value(value)
        .map_err(|err| PostStoreError::decode(format!("posts collection: {err}")))?;
    documents
        .into_iter()
        .map(|(key, document)| decode_post(&key, document))
        .collect()
}

impl From<StoreClientError> for PostStoreError {
    fn from(err: StoreClientError) -> Self {
        match err {
            StoreClientError::Transport { message } => Self::transport(message),
            StoreClientError::Timeout { message } => Self::timeout(message),
            StoreClientError::Decode { message } => Self::decode(message),
            StoreClientError::Status { status, message } => Self::status(status, message),
        }
    }
}

/// [`PostStore`] backed by the remote document store.
#[derive(Clone)]
pub struct RestPostStore {
    store: DocumentStore,
}

impl RestPostStore {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PostStore for RestPostStore {
    async fn list(&self) -> Result<Vec<Post>, PostStoreError> {
        let value = self.store.fetch(&[COLLECTION]).await?;
        decode_collection(value)
    }

    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostStoreError> {
        let value = self.store.fetch(&[COLLECTION, id.as_ref()]).await?;
        value
            .map(|document| decode_post(id.as_ref(), document))
            .transpose()
    }

    async fn create(&self, draft: &PostDraft) -> Result<PostId, PostStoreError> {
        let document = serde_json::to_value(PostDocument::from_draft(draft))
            .map_err(|err| PostStoreError::decode(format!("post document: {err}")))?;
        let key = self.store.create(COLLECTION, &document).await?;
        PostId::new(&key)
            .map_err(|err| PostStoreError::decode(format!("assigned post key {key:?}: {err}")))
    }

    async fn update(&self, id: &PostId, patch: &PostPatch) -> Result<(), PostStoreError> {
        // A cleared image must overwrite the stored one, so null is explicit.
        let document = serde_json::json!({
            "caption": patch.caption.as_ref(),
            "image": patch.image,
        });
        self.store
            .patch(&[COLLECTION, id.as_ref()], &document)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &PostId) -> Result<(), PostStoreError> {
        self.store.delete(&[COLLECTION, id.as_ref()]).await?;
        Ok(())
    }
}
