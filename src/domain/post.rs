//! Post data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Validation errors for post components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostValidationError {
    EmptyId,
    InvalidIdCharacters,
    EmptyCaption,
}

impl fmt::Display for PostValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "post id must not be empty"),
            Self::InvalidIdCharacters => {
                write!(f, "post id must not contain whitespace or path characters")
            }
            Self::EmptyCaption => write!(f, "caption must not be empty"),
        }
    }
}

impl std::error::Error for PostValidationError {}

const FORBIDDEN_KEY_CHARS: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Store-assigned post identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostId(String);

impl PostId {
    /// Validate and construct a [`PostId`].
    pub fn new(id: impl Into<String>) -> Result<Self, PostValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(PostValidationError::EmptyId);
        }
        if id.contains(char::is_whitespace) || id.contains(FORBIDDEN_KEY_CHARS) {
            return Err(PostValidationError::InvalidIdCharacters);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for PostId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PostId> for String {
    fn from(value: PostId) -> Self {
        value.0
    }
}

impl TryFrom<String> for PostId {
    type Error = PostValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Required post text, non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Caption(String);

impl Caption {
    /// Validate and construct a [`Caption`], trimming surrounding whitespace.
    pub fn new(caption: impl Into<String>) -> Result<Self, PostValidationError> {
        let caption = caption.into();
        let trimmed = caption.trim();
        if trimmed.is_empty() {
            return Err(PostValidationError::EmptyCaption);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Caption {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Caption> for String {
    fn from(value: Caption) -> Self {
        value.0
    }
}

impl TryFrom<String> for Caption {
    type Error = PostValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// User-authored content item.
///
/// ## Invariants
/// - `owner_id` is stamped from the authenticated session at creation and
///   never reassigned.
/// - `created_at` is set at creation and immutable.
/// - Updates may change `caption` and `image` only; the patch type cannot
///   express anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    id: PostId,
    caption: Caption,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    owner_id: UserId,
    created_at: DateTime<Utc>,
}

impl Post {
    /// Build a [`Post`] from validated components.
    pub fn new(
        id: PostId,
        caption: Caption,
        image: Option<String>,
        owner_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            caption,
            image,
            owner_id,
            created_at,
        }
    }

    /// Store-assigned identifier.
    pub fn id(&self) -> &PostId {
        &self.id
    }

    /// Post text.
    pub fn caption(&self) -> &Caption {
        &self.caption
    }

    /// Image URL; views fall back to a placeholder when absent.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Identifier of the owning user.
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Write shape for creating a post; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub caption: Caption,
    pub image: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Editable post fields. Ownership and creation time are absent by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPatch {
    pub caption: Caption,
    pub image: Option<String>,
}
