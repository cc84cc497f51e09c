//! User data model.
//!
//! One canonical `User` record is used everywhere inside the application.
//! Store- or provider-specific field names (`mail`, `localId`, ...) are
//! normalised at the adapter edge, never downstream.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validation errors for user identity components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    /// Store keys are path segments; separators and whitespace are forbidden.
    InvalidIdCharacters,
    EmptyEmail,
    InvalidEmail,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidIdCharacters => {
                write!(f, "user id must not contain whitespace or path characters")
            }
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must contain an @ sign"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Characters Firebase-style stores reject in document keys.
const FORBIDDEN_KEY_CHARS: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Stable user identifier.
///
/// Store-assigned push keys and provider subject ids are opaque strings, not
/// UUIDs, so validation only enforces what a key path can carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.contains(char::is_whitespace) || id.contains(FORBIDDEN_KEY_CHARS) {
            return Err(UserValidationError::InvalidIdCharacters);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Email address, stored case-sensitively.
///
/// The directory treats the email as a logical unique key, so no case folding
/// or normalisation happens here; lookups match the stored bytes exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into();
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !trimmed.contains('@') {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Deterministic placeholder avatar for a record without an image.
///
/// Matches the seeded generator the feed expects, so the same seed always
/// renders the same avatar.
pub fn placeholder_image(seed: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={seed}")
}

/// Application user: identity plus profile fields.
///
/// ## Invariants
/// - `id` is assigned once at directory sync and never changes.
/// - `created_at` is set at creation and immutable thereafter.
/// - `image` is always populated; creation falls back to the deterministic
///   placeholder when the identity provider supplies none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    email: Email,
    name: String,
    title: String,
    image: String,
    created_at: DateTime<Utc>,
}

impl User {
    /// Build a [`User`] from validated components.
    pub fn new(
        id: UserId,
        email: Email,
        name: String,
        title: String,
        image: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name,
            title,
            image,
            created_at,
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Directory lookup key.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Display name; may be empty until the user edits their profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form profile title; may be empty.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Avatar URL.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Creation timestamp, set once at directory sync.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Write shape for a first-login directory entry.
///
/// The store assigns the id, so the record carries everything but the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub title: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Promote the write shape into a full [`User`] once the store has
    /// assigned a key.
    pub fn into_user(self, id: UserId) -> User {
        User::new(
            id,
            self.email,
            self.name,
            self.title,
            self.image,
            self.created_at,
        )
    }
}

/// Profile fields a user may edit. Identity fields (`id`, `email`,
/// `created_at`) are absent by construction and therefore immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: String,
    pub title: String,
    pub image: String,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case("a/b", UserValidationError::InvalidIdCharacters)]
    #[case("with space", UserValidationError::InvalidIdCharacters)]
    #[case("dollar$", UserValidationError::InvalidIdCharacters)]
    fn rejects_invalid_ids(#[case] raw: &str, #[case] expected: UserValidationError) {
        let err = UserId::new(raw).expect_err("invalid id must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("OPPe5jue2Ghxx3mtnxevB5FwCYe2")]
    #[case("-NxKfQ3m9pTzW1a")]
    fn accepts_store_style_keys(#[case] raw: &str) {
        let id = UserId::new(raw).expect("valid id");
        assert_eq!(id.as_ref(), raw);
    }

    #[rstest]
    #[case("", UserValidationError::EmptyEmail)]
    #[case("   ", UserValidationError::EmptyEmail)]
    #[case("not-an-email", UserValidationError::InvalidEmail)]
    fn rejects_invalid_emails(#[case] raw: &str, #[case] expected: UserValidationError) {
        let err = Email::new(raw).expect_err("invalid email must fail");
        assert_eq!(err, expected);
    }

    #[test]
    fn email_preserves_case() {
        let email = Email::new("Ada@Example.com").expect("valid email");
        assert_eq!(email.as_ref(), "Ada@Example.com");
    }

    #[test]
    fn placeholder_is_deterministic_per_seed() {
        assert_eq!(placeholder_image("u1"), placeholder_image("u1"));
        assert_ne!(placeholder_image("u1"), placeholder_image("u2"));
        assert!(placeholder_image("u1").contains("seed=u1"));
    }

    #[test]
    fn new_user_promotion_preserves_fields() {
        let new_user = NewUser {
            email: Email::new("new@example.com").expect("valid email"),
            name: "Ada".to_owned(),
            title: String::new(),
            image: placeholder_image("ext-1"),
            created_at: Utc::now(),
        };
        let created_at = new_user.created_at;
        let user = new_user.into_user(UserId::new("abc123").expect("valid id"));
        assert_eq!(user.id().as_ref(), "abc123");
        assert_eq!(user.email().as_ref(), "new@example.com");
        assert_eq!(user.name(), "Ada");
        assert_eq!(user.created_at(), created_at);
    }

    #[test]
    fn user_serialises_camel_case() {
        let user = User::new(
            UserId::new("u1").expect("valid id"),
            Email::new("a@b.c").expect("valid email"),
            "Ada".to_owned(),
            "Engineer".to_owned(),
            placeholder_image("u1"),
            Utc::now(),
        );
        let value = serde_json::to_value(&user).expect("serialise user");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }
}
