//! Post routes: feed, detail, and the three owner-gated mutations.
//!
//! Mutations are form posts answered with redirects, matching the
//! server-rendered flow. The ownership guard runs strictly before any store
//! mutation; a refused update/delete redirects to the collection view without
//! touching the store. Not-found and not-owner deliberately collapse into the
//! same redirect so the response does not reveal whether the post exists.

use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use crate::domain::ports::PostStoreError;
use crate::domain::{
    can_mutate, Caption, Error, MutationAction, Post, PostDraft, PostId, PostPatch,
};

use super::auth::resolve_user;
use super::session::SessionContext;
use super::state::HttpState;
use super::{see_other, ApiResult};

/// Caption/image form body shared by create and update.
#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub caption: String,
    #[serde(default)]
    pub image: String,
}

impl PostForm {
    fn caption(&self) -> ApiResult<Caption> {
        Caption::new(&self.caption).map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(serde_json::json!({ "field": "caption" }))
        })
    }

    /// Blank image inputs mean "no image"; views show a placeholder.
    fn image(&self) -> Option<String> {
        let trimmed = self.image.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
}

/// The whole feed, newest first.
#[get("/posts")]
pub async fn list_posts(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Post>>> {
    let mut posts = state.posts.list().await.map_err(map_store_error)?;
    posts.sort_by_key(|post| std::cmp::Reverse(post.created_at()));
    Ok(web::Json(posts))
}

/// One post by id.
#[get("/posts/{id}")]
pub async fn get_post(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Post>> {
    let id = parse_post_id(&path).ok_or_else(post_not_found)?;
    let post = state
        .posts
        .find_by_id(&id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(post_not_found)?;
    Ok(web::Json(post))
}

/// Create a post owned by the session user.
///
/// Anonymous requests are redirected to sign-in before anything touches the
/// store. The owner id is stamped from the session; the form cannot carry it.
#[post("/posts/create")]
pub async fn create_post(
    session: SessionContext,
    state: web::Data<HttpState>,
    form: web::Form<PostForm>,
) -> ApiResult<HttpResponse> {
    let Some(user) = resolve_user(&session, state.users.as_ref()).await? else {
        return Ok(see_other("/signin"));
    };
    let draft = PostDraft {
        caption: form.caption()?,
        image: form.image(),
        owner_id: user.id().clone(),
        created_at: Utc::now(),
    };
    let id = state.posts.create(&draft).await.map_err(map_store_error)?;
    info!(post_id = %id, owner_id = %draft.owner_id, "post created");
    Ok(see_other("/posts"))
}

/// Update caption/image of an owned post.
#[post("/posts/{id}/update")]
pub async fn update_post(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    form: web::Form<PostForm>,
) -> ApiResult<HttpResponse> {
    let Some(user) = resolve_user(&session, state.users.as_ref()).await? else {
        return Ok(see_other("/signin"));
    };
    let Some(post) = load_for_mutation(&state, &path).await? else {
        return Ok(see_other("/posts"));
    };
    if !can_mutate(Some(&user), &post, MutationAction::Update) {
        return Ok(see_other("/posts"));
    }
    let patch = PostPatch {
        caption: form.caption()?,
        image: form.image(),
    };
    state
        .posts
        .update(post.id(), &patch)
        .await
        .map_err(map_store_error)?;
    Ok(see_other(&format!("/posts/{}", post.id())))
}

/// Delete an owned post.
#[post("/posts/{id}/delete")]
pub async fn delete_post(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let Some(user) = resolve_user(&session, state.users.as_ref()).await? else {
        return Ok(see_other("/signin"));
    };
    let Some(post) = load_for_mutation(&state, &path).await? else {
        return Ok(see_other("/posts"));
    };
    if !can_mutate(Some(&user), &post, MutationAction::Delete) {
        return Ok(see_other("/posts"));
    }
    state
        .posts
        .delete(post.id())
        .await
        .map_err(map_store_error)?;
    info!(post_id = %post.id(), "post deleted");
    Ok(see_other("/posts"))
}

/// Fetch the mutation target; a malformed id reads as "no such post".
async fn load_for_mutation(state: &HttpState, raw_id: &str) -> ApiResult<Option<Post>> {
    let Some(id) = parse_post_id(raw_id) else {
        return Ok(None);
    };
    state.posts.find_by_id(&id).await.map_err(map_store_error)
}

fn parse_post_id(raw: &str) -> Option<PostId> {
    PostId::new(raw).ok()
}

fn post_not_found() -> Error {
    Error::not_found("post not found")
}

fn map_store_error(err: PostStoreError) -> Error {
    error!(error = %err, "post store call failed");
    Error::service_unavailable("posts are temporarily unavailable")
}
