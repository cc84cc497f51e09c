//! Ownership-based authorisation for post mutations.
//!
//! The policy is a single pure predicate evaluated strictly before any store
//! mutation is issued. There are no roles and no admin bypass.

use super::post::Post;
use super::user::User;

/// Destructive actions gated by ownership.
///
/// Creation is deliberately absent: there is no prior resource to check, the
/// owner id is simply stamped from the authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationAction {
    Update,
    Delete,
}

/// Returns whether `user` may perform `action` on `post`.
///
/// True iff a user is present and their id matches the post's owner; the
/// action kind never changes the outcome.
pub fn can_mutate(user: Option<&User>, post: &Post, _action: MutationAction) -> bool {
    user.is_some_and(|user| user.id() == post.owner_id())
}
