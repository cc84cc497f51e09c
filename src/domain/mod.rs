//! Domain primitives, services, and ports.
//!
//! Purpose: define strongly typed entities used by the HTTP and store layers,
//! the directory-sync service, and the ownership guard. Types are immutable;
//! invariants and serde contracts live in each type's Rustdoc.

pub mod auth;
pub mod authz;
pub mod directory;
pub mod error;
pub mod ports;
pub mod post;
pub mod trace_id;
pub mod user;

pub use self::auth::{ExternalIdentity, LoginCredentials, LoginValidationError};
pub use self::authz::{can_mutate, MutationAction};
pub use self::directory::DirectoryService;
pub use self::error::{Error, ErrorCode};
pub use self::post::{Caption, Post, PostDraft, PostId, PostPatch, PostValidationError};
pub use self::trace_id::TraceId;
pub use self::user::{
    placeholder_image, Email, NewUser, ProfilePatch, User, UserId, UserValidationError,
};
