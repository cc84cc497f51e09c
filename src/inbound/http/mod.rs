//! Inbound HTTP adapters.
//!
//! Routes, session plumbing, and the error mapping that turns domain failures
//! into JSON responses. Mutations follow the form-post flow: success and
//! refused-authorisation both answer with a `303 See Other` redirect.

pub mod auth;
pub mod error;
pub mod health;
pub mod posts;
pub mod profile;
pub mod session;
pub mod state;
#[cfg(test)]
pub(crate) mod test_utils;

pub use error::ApiResult;
pub use state::HttpState;

use actix_web::{http::header, HttpResponse};

/// Redirect used after form posts so a refresh never replays the mutation.
pub(crate) fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_owned()))
        .finish()
}
