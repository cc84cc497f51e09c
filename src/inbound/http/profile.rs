//! Profile routes: read the signed-in user's record and update its
//! display fields.
//!
//! Only name, title, and image are editable. Identity fields (id, email,
//! creation time) never appear in the form and cannot change here. A blank
//! image resets the profile to the generated placeholder so a record never
//! carries an empty image URL.

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use tracing::{error, info};

use crate::domain::ports::UserStoreError;
use crate::domain::{placeholder_image, Error, ProfilePatch, User};

use super::auth::require_user;
use super::session::SessionContext;
use super::state::HttpState;
use super::{see_other, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub image: String,
}

/// The signed-in user's own record.
#[get("/profile")]
pub async fn get_profile(
    session: SessionContext,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<User>> {
    let user = require_user(&session, state.users.as_ref()).await?;
    Ok(web::Json(user))
}

/// Apply a profile edit and return to the profile view.
#[post("/profile")]
pub async fn update_profile(
    session: SessionContext,
    state: web::Data<HttpState>,
    form: web::Form<ProfileForm>,
) -> ApiResult<HttpResponse> {
    let Some(user) = super::auth::resolve_user(&session, state.users.as_ref()).await? else {
        return Ok(see_other("/signin"));
    };

    let patch = validate_form(&form, &user)?;
    state
        .users
        .update_profile(user.id(), &patch)
        .await
        .map_err(map_store_error)?;
    info!(user_id = %user.id(), "profile updated");
    Ok(see_other("/profile"))
}

fn validate_form(form: &ProfileForm, user: &User) -> ApiResult<ProfilePatch> {
    let name = required_field(&form.name, "name")?;
    let title = required_field(&form.title, "title")?;
    let image = match form.image.trim() {
        "" => placeholder_image(user.id().as_ref()),
        trimmed => trimmed.to_owned(),
    };
    Ok(ProfilePatch { name, title, image })
}

fn required_field(value: &str, field: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_request(format!("{field} must not be blank"))
            .with_details(serde_json::json!({ "field": field })));
    }
    Ok(trimmed.to_owned())
}

fn map_store_error(err: UserStoreError) -> Error {
    error!(error = %err, "profile update failed");
    Error::service_unavailable("profile updates are temporarily unavailable")
}
