//! Sign-in, sign-out, and session resolution.
//!
//! The session cookie carries only the user id; every request re-fetches the
//! current user record from the store so profile edits are visible on the
//! next request. Resolution failures are never thrown for the "no session"
//! case: an invalid session is equivalent to no session.

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::ports::{IdentityProviderError, UserStore, UserStoreError};
use crate::domain::{Error, LoginCredentials, LoginValidationError, User};

use super::session::SessionContext;
use super::state::HttpState;
use super::{see_other, ApiResult};

/// Resolve the session back into a verified user record.
///
/// Re-fetches by id on every call. A session whose user record has vanished
/// resolves to anonymous rather than an error.
pub async fn resolve_user(
    session: &SessionContext,
    users: &dyn UserStore,
) -> ApiResult<Option<User>> {
    let Some(id) = session.user_id()? else {
        return Ok(None);
    };
    match users.find_by_id(&id).await.map_err(lookup_unavailable)? {
        Some(user) => Ok(Some(user)),
        None => {
            warn!(user_id = %id, "session references a missing user record");
            Ok(None)
        }
    }
}

/// Resolve the session or fail with `401 Unauthorized`.
///
/// Mutation form routes pre-empt this with a redirect to `/signin` instead;
/// data reads surface the 401 directly.
pub async fn require_user(session: &SessionContext, users: &dyn UserStore) -> ApiResult<User> {
    resolve_user(session, users)
        .await?
        .ok_or_else(|| Error::unauthorized("login required"))
}

fn lookup_unavailable(err: UserStoreError) -> Error {
    error!(error = %err, "session user lookup failed");
    Error::service_unavailable("user lookup is temporarily unavailable")
}

/// Sign-in form body.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

/// Authenticate credentials, sync the directory, and establish a session.
///
/// Order matters: the session is persisted only after both the provider and
/// the directory sync succeed, so no session can reference a user that was
/// never synced.
#[post("/signin")]
pub async fn sign_in(
    session: SessionContext,
    state: web::Data<HttpState>,
    form: web::Form<SignInForm>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from_parts(&form.email, &form.password)
        .map_err(map_login_validation_error)?;
    let identity = state
        .identity
        .authenticate(&credentials)
        .await
        .map_err(map_provider_error)?;
    let user = state.directory.ensure_user(&identity).await?;
    session.persist_user(user.id())?;
    info!(user_id = %user.id(), "session established");
    Ok(see_other("/posts"))
}

/// Sign-up form body.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub title: String,
}

/// Register a new account, create its directory entry, and sign the user in.
///
/// Field checks run before the provider call so a typo never creates a
/// provider account with no matching directory entry.
#[post("/signup")]
pub async fn sign_up(
    session: SessionContext,
    state: web::Data<HttpState>,
    form: web::Form<SignUpForm>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from_parts(&form.email, &form.password)
        .map_err(map_login_validation_error)?;
    if form.password != form.confirm_password {
        return Err(Error::invalid_request("passwords do not match")
            .with_details(serde_json::json!({ "field": "confirm_password" })));
    }
    if form.password.chars().count() < 6 {
        return Err(
            Error::invalid_request("password is too weak, use at least 6 characters")
                .with_details(serde_json::json!({ "field": "password" })),
        );
    }
    let name = form.name.trim();
    if name.is_empty() {
        return Err(Error::invalid_request("name must not be empty")
            .with_details(serde_json::json!({ "field": "name" })));
    }
    let title = form.title.trim();
    if title.is_empty() {
        return Err(Error::invalid_request("title must not be empty")
            .with_details(serde_json::json!({ "field": "title" })));
    }

    let identity = state
        .identity
        .register(&credentials)
        .await
        .map_err(map_register_error)?;
    let user = state
        .directory
        .register_user(&identity, name.to_owned(), title.to_owned())
        .await?;
    session.persist_user(user.id())?;
    info!(user_id = %user.id(), "account registered and session established");
    Ok(see_other("/posts"))
}

/// Destroy the session and return to the landing page. Idempotent.
#[post("/signout")]
pub async fn sign_out(session: SessionContext) -> HttpResponse {
    session.destroy();
    see_other("/")
}

/// Current user record for the active session.
#[get("/me")]
pub async fn current_user(
    session: SessionContext,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<User>> {
    let user = require_user(&session, state.users.as_ref()).await?;
    Ok(web::Json(user))
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::InvalidEmail(inner) => Error::invalid_request(inner.to_string())
            .with_details(serde_json::json!({ "field": "email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(serde_json::json!({ "field": "password" })),
    }
}

fn map_provider_error(err: IdentityProviderError) -> Error {
    match err {
        IdentityProviderError::InvalidCredentials
        | IdentityProviderError::UnknownAccount
        | IdentityProviderError::Denied { .. } => Error::unauthorized(err.to_string()),
        IdentityProviderError::RateLimited => Error::rate_limited(err.to_string()),
        IdentityProviderError::AlreadyRegistered
        | IdentityProviderError::WeakPassword
        | IdentityProviderError::MalformedClaims { .. }
        | IdentityProviderError::Transport { .. } => {
            error!(error = %err, "identity provider failure");
            Error::service_unavailable("sign-in is temporarily unavailable")
        }
    }
}

fn map_register_error(err: IdentityProviderError) -> Error {
    match err {
        IdentityProviderError::AlreadyRegistered
        | IdentityProviderError::WeakPassword
        | IdentityProviderError::Denied { .. } => Error::invalid_request(err.to_string()),
        IdentityProviderError::RateLimited => Error::rate_limited(err.to_string()),
        IdentityProviderError::InvalidCredentials
        | IdentityProviderError::UnknownAccount
        | IdentityProviderError::MalformedClaims { .. }
        | IdentityProviderError::Transport { .. } => {
            error!(error = %err, "identity provider failure");
            Error::service_unavailable("sign-up is temporarily unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::{header, StatusCode};
    use actix_web::{test as actix_test, web, App};
    use serde_json::Value;

    use super::*;
    use crate::domain::ports::{
        FixtureIdentityProvider, MockIdentityProvider, MockPostStore, MockUserStore,
    };
    use crate::domain::{test_fixtures, Email};
    use crate::inbound::http::test_utils::test_session_middleware;

    fn fixture_identity() -> FixtureIdentityProvider {
        FixtureIdentityProvider::new(
            Email::new("ada@example.com").expect("fixture email"),
            "password",
            "ext-ada",
        )
    }

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .wrap(test_session_middleware())
            .service(sign_in)
            .service(sign_up)
            .service(sign_out)
            .service(current_user)
    }

    fn state_with(
        users: MockUserStore,
        identity: impl crate::domain::ports::IdentityProvider + 'static,
    ) -> HttpState {
        HttpState::new(
            Arc::new(identity),
            Arc::new(users),
            Arc::new(MockPostStore::new()),
        )
    }

    fn signin_request(email: &str, password: &str) -> actix_web::test::TestRequest {
        actix_test::TestRequest::post().uri("/signin").set_form([
            ("email", email.to_owned()),
            ("password", password.to_owned()),
        ])
    }

    #[actix_web::test]
    async fn sign_in_establishes_session_and_redirects_to_posts() {
        let existing = test_fixtures::user("u1", "ada@example.com");
        let mut users = MockUserStore::new();
        let found = existing.clone();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(found.clone())));
        users.expect_create().never();

        let app = actix_test::init_service(test_app(state_with(users, fixture_identity()))).await;
        let res = actix_test::call_service(
            &app,
            signin_request("ada@example.com", "password").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get(header::LOCATION).map(|v| v.as_bytes()),
            Some(b"/posts".as_ref())
        );
        assert!(res
            .response()
            .cookies()
            .any(|cookie| cookie.name() == "session"));
    }

    #[actix_web::test]
    async fn current_user_reflects_the_stored_record_not_a_snapshot() {
        let at_login = test_fixtures::user("u1", "ada@example.com");
        let mut users = MockUserStore::new();
        let found = at_login.clone();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(found.clone())));
        // The record the store holds *now*, after a profile edit elsewhere.
        let updated = crate::domain::User::new(
            at_login.id().clone(),
            at_login.email().clone(),
            "Ada Updated".to_owned(),
            "Engineer".to_owned(),
            at_login.image().to_owned(),
            at_login.created_at(),
        );
        let current = updated.clone();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(current.clone())));

        let app = actix_test::init_service(test_app(state_with(users, fixture_identity()))).await;
        let login_res = actix_test::call_service(
            &app,
            signin_request("ada@example.com", "password").to_request(),
        )
        .await;
        let cookie = login_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie");

        let me_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(me_res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(me_res).await;
        assert_eq!(body["name"], "Ada Updated");
        assert_eq!(body["title"], "Engineer");
    }

    #[actix_web::test]
    async fn wrong_password_is_unauthorised_with_a_user_facing_message() {
        let mut users = MockUserStore::new();
        users.expect_find_by_email().never();
        users.expect_create().never();

        let app = actix_test::init_service(test_app(state_with(users, fixture_identity()))).await;
        let res = actix_test::call_service(
            &app,
            signin_request("ada@example.com", "wrong").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "invalid email or password");
        assert_eq!(body["code"], "unauthorized");
    }

    #[actix_web::test]
    async fn unknown_account_is_distinguished_from_bad_password() {
        let app = actix_test::init_service(test_app(state_with(
            MockUserStore::new(),
            fixture_identity(),
        )))
        .await;
        let res = actix_test::call_service(
            &app,
            signin_request("bob@example.com", "password").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "no account found with this email");
    }

    #[actix_web::test]
    async fn provider_throttling_maps_to_429() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_authenticate()
            .returning(|_| Err(IdentityProviderError::RateLimited));

        let app = actix_test::init_service(test_app(state_with(MockUserStore::new(), identity)))
            .await;
        let res = actix_test::call_service(
            &app,
            signin_request("ada@example.com", "password").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[actix_web::test]
    async fn directory_failure_aborts_sign_in_without_a_session() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_email()
            .returning(|_| Err(UserStoreError::transport("connection refused")));

        let app = actix_test::init_service(test_app(state_with(users, fixture_identity()))).await;
        let res = actix_test::call_service(
            &app,
            signin_request("ada@example.com", "password").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!res
            .response()
            .cookies()
            .any(|cookie| cookie.name() == "session"));
    }

    #[actix_web::test]
    async fn blank_email_is_a_validation_error() {
        let app = actix_test::init_service(test_app(state_with(
            MockUserStore::new(),
            fixture_identity(),
        )))
        .await;
        let res =
            actix_test::call_service(&app, signin_request("   ", "password").to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn sign_out_then_protected_route_is_anonymous() {
        let existing = test_fixtures::user("u1", "ada@example.com");
        let mut users = MockUserStore::new();
        let found = existing.clone();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(found.clone())));
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));

        let app = actix_test::init_service(test_app(state_with(users, fixture_identity()))).await;
        let login_res = actix_test::call_service(
            &app,
            signin_request("ada@example.com", "password").to_request(),
        )
        .await;
        let login_cookie = login_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie");

        let signout_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/signout")
                .cookie(login_cookie)
                .to_request(),
        )
        .await;
        assert_eq!(signout_res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            signout_res
                .headers()
                .get(header::LOCATION)
                .map(|v| v.as_bytes()),
            Some(b"/".as_ref())
        );
        // The purge response instructs the browser to drop the cookie.
        let cleared = signout_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("removal cookie");

        let me_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/me")
                .cookie(cleared)
                .to_request(),
        )
        .await;
        assert_eq!(me_res.status(), StatusCode::UNAUTHORIZED);
    }

    fn signup_request(fields: [(&'static str, &str); 5]) -> actix_web::test::TestRequest {
        actix_test::TestRequest::post().uri("/signup").set_form(
            fields.map(|(key, value)| (key, value.to_owned())),
        )
    }

    #[actix_web::test]
    async fn sign_up_creates_the_directory_entry_and_signs_in() {
        let mut users = MockUserStore::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|new_user| {
                new_user.email.as_ref() == "grace@example.com"
                    && new_user.name == "Grace"
                    && new_user.title == "Engineer"
            })
            .returning(|_| Ok(crate::domain::UserId::new("u-new").expect("fixture id")));

        let app = actix_test::init_service(test_app(state_with(users, fixture_identity()))).await;
        let res = actix_test::call_service(
            &app,
            signup_request([
                ("email", "grace@example.com"),
                ("password", "hunter22"),
                ("confirm_password", "hunter22"),
                ("name", "Grace"),
                ("title", "Engineer"),
            ])
            .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get(header::LOCATION).map(|v| v.as_bytes()),
            Some(b"/posts".as_ref())
        );
        assert!(res
            .response()
            .cookies()
            .any(|cookie| cookie.name() == "session"));
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected_without_a_session() {
        let mut users = MockUserStore::new();
        users.expect_find_by_email().never();
        users.expect_create().never();

        let app = actix_test::init_service(test_app(state_with(users, fixture_identity()))).await;
        let res = actix_test::call_service(
            &app,
            signup_request([
                ("email", "ada@example.com"),
                ("password", "hunter22"),
                ("confirm_password", "hunter22"),
                ("name", "Ada"),
                ("title", "Engineer"),
            ])
            .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(!res
            .response()
            .cookies()
            .any(|cookie| cookie.name() == "session"));
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "an account with this email already exists");
    }

    #[actix_web::test]
    async fn mismatched_passwords_never_reach_the_provider() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_register().never();

        let app =
            actix_test::init_service(test_app(state_with(MockUserStore::new(), identity))).await;
        let res = actix_test::call_service(
            &app,
            signup_request([
                ("email", "grace@example.com"),
                ("password", "hunter22"),
                ("confirm_password", "hunter23"),
                ("name", "Grace"),
                ("title", "Engineer"),
            ])
            .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "confirm_password");
    }

    #[actix_web::test]
    async fn short_password_is_rejected_before_the_provider_call() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_register().never();

        let app =
            actix_test::init_service(test_app(state_with(MockUserStore::new(), identity))).await;
        let res = actix_test::call_service(
            &app,
            signup_request([
                ("email", "grace@example.com"),
                ("password", "abc"),
                ("confirm_password", "abc"),
                ("name", "Grace"),
                ("title", "Engineer"),
            ])
            .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "password");
    }

    #[actix_web::test]
    async fn blank_name_or_title_is_a_validation_error() {
        for (name, title, field) in [("   ", "Engineer", "name"), ("Grace", "", "title")] {
            let app = actix_test::init_service(test_app(state_with(
                MockUserStore::new(),
                fixture_identity(),
            )))
            .await;
            let res = actix_test::call_service(
                &app,
                signup_request([
                    ("email", "grace@example.com"),
                    ("password", "hunter22"),
                    ("confirm_password", "hunter22"),
                    ("name", name),
                    ("title", title),
                ])
                .to_request(),
            )
            .await;

            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            let body: Value = actix_test::read_body_json(res).await;
            assert_eq!(body["details"]["field"], field);
        }
    }

    #[actix_web::test]
    async fn sign_out_without_a_session_is_safe() {
        let app = actix_test::init_service(test_app(state_with(
            MockUserStore::new(),
            fixture_identity(),
        )))
        .await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post().uri("/signout").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }
}
