//! Document-store adapter for the `users` collection.
//!
//! Owns the wire format of user documents. The store spells the email field
//! `mail`; that name never escapes this module. Records missing an avatar
//! decode to the deterministic placeholder keyed by the document key, so the
//! domain invariant "image is always populated" holds even for legacy data.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::ports::{UserStore, UserStoreError};
use crate::domain::{placeholder_image, Email, NewUser, ProfilePatch, User, UserId};

use super::client::{DocumentStore, StoreClientError};

const COLLECTION: &str = "users";

/// Wire shape of one user document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    mail: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    image: String,
    created_at: DateTime<Utc>,
}

impl UserDocument {
    fn from_new_user(user: &NewUser) -> Self {
        Self {
            mail: user.email.as_ref().to_owned(),
            name: user.name.clone(),
            title: user.title.clone(),
            image: user.image.clone(),
            created_at: user.created_at,
        }
    }

    fn into_user(self, key: &str) -> Result<User, UserStoreError> {
        let id = UserId::new(key)
            .map_err(|err| UserStoreError::decode(format!("user key {key:?}: {err}")))?;
        let email = Email::new(self.mail)
            .map_err(|err| UserStoreError::decode(format!("user {key}: {err}")))?;
        let image = if self.image.is_empty() {
            placeholder_image(key)
        } else {
            self.image
        };
        Ok(User::new(
            id,
            email,
            self.name,
            self.title,
            image,
            self.created_at,
        ))
    }
}

fn decode_user(key: &str, value: Value) -> Result<User, UserStoreError> {
    let document: UserDocument = serde_json::from_value(value)
        .map_err(|err| UserStoreError::decode(format!("user {key}: {err}")))?;
    document.into_user(key)
}

/// Decode an `orderBy`/`equalTo` result: a keyed object, `{}` when empty.
fn decode_matches(value: Value) -> Result<Vec<User>, UserStoreError> {
    let documents: BTreeMap<String, Value> = serde_json::from_value(value)
        .map_err(|err| UserStoreError::decode(format!("user query result: {err}")))?;
    documents
        .into_iter()
        .map(|(key, document)| decode_user(&key, document))
        .collect()
}

impl From<StoreClientError> for UserStoreError {
    fn from(err: StoreClientError) -> Self {
        match err {
            StoreClientError::Transport { message } => Self::transport(message),
            StoreClientError::Timeout { message } => Self::timeout(message),
            StoreClientError::Decode { message } => Self::decode(message),
            StoreClientError::Status { status, message } => Self::status(status, message),
        }
    }
}

/// [`UserStore`] backed by the remote document store.
#[derive(Clone)]
pub struct RestUserStore {
    store: DocumentStore,
}

impl RestUserStore {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserStore for RestUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserStoreError> {
        let matches = self
            .store
            .query_eq(COLLECTION, "mail", email.as_ref())
            .await?;
        let mut users = decode_matches(matches)?;
        if users.len() > 1 {
            // The email is a logical unique key; duplicates mean an earlier
            // create raced. Keep serving the first record deterministically.
            warn!(email = %email, count = users.len(), "duplicate directory entries for email");
        }
        Ok((!users.is_empty()).then(|| users.swap_remove(0)))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserStoreError> {
        let value = self.store.fetch(&[COLLECTION, id.as_ref()]).await?;
        value
            .map(|document| decode_user(id.as_ref(), document))
            .transpose()
    }

    async fn create(&self, user: &NewUser) -> Result<UserId, UserStoreError> {
        let document = serde_json::to_value(UserDocument::from_new_user(user))
            .map_err(|err| UserStoreError::decode(format!("user document: {err}")))?;
        let key = self.store.create(COLLECTION, &document).await?;
        UserId::new(&key)
            .map_err(|err| UserStoreError::decode(format!("assigned user key {key:?}: {err}")))
    }

    async fn update_profile(
        &self,
        id: &UserId,
        patch: &ProfilePatch,
    ) -> Result<(), UserStoreError> {
        let document = serde_json::json!({
            "name": patch.name,
            "title": patch.title,
            "image": patch.image,
        });
        self.store
            .patch(&[COLLECTION, id.as_ref()], &document)
            .await?;
        Ok(())
    }
}
