//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use actix_session::{
    config::{CookieContentSecurity, PersistentSession, TtlExtensionPolicy},
    storage::CookieSessionStore,
    SessionMiddleware,
};
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};

use crate::inbound::http::auth::{current_user, sign_in, sign_out, sign_up};
use crate::inbound::http::health::{live, ready, HealthState};
use crate::inbound::http::posts::{create_post, delete_post, get_post, list_posts, update_post};
use crate::inbound::http::profile::{get_profile, update_profile};
use crate::inbound::http::HttpState;
use crate::middleware::Trace;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
    session_ttl: Duration,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
        session_ttl,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default()
                .session_ttl(session_ttl)
                // Rolling expiry: the validity window renews on every
                // verified request, not only on session writes.
                .session_ttl_extension_policy(TtlExtensionPolicy::OnEveryRequest),
        )
        .build();

    // Specific routes before parameterised ones: /posts/create must not be
    // captured by /posts/{id}.
    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(session)
        .wrap(Trace)
        .service(sign_in)
        .service(sign_up)
        .service(sign_out)
        .service(current_user)
        .service(create_post)
        .service(list_posts)
        .service(update_post)
        .service(delete_post)
        .service(get_post)
        .service(get_profile)
        .service(update_profile)
        .service(ready)
        .service(live)
}

/// Construct an Actix HTTP server using the provided health state, dependency
/// bundle, and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(http_state);
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        session_ttl,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
            session_ttl,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    //! Route-table smoke coverage; handler behaviour is tested per module.

    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{test, web};

    use super::*;
    use crate::domain::ports::{FixtureIdentityProvider, MockPostStore, MockUserStore};
    use crate::domain::Email;

    fn deps() -> AppDependencies {
        deps_with_users(MockUserStore::new())
    }

    fn deps_with_users(users: MockUserStore) -> AppDependencies {
        let identity = FixtureIdentityProvider::new(
            Email::new("ada@example.com").expect("fixture email"),
            "password",
            "ext-ada",
        );
        let http_state = HttpState::new(
            Arc::new(identity),
            Arc::new(users),
            Arc::new(MockPostStore::new()),
        );
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        AppDependencies {
            health_state,
            http_state: web::Data::new(http_state),
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
            session_ttl: Duration::days(7),
        }
    }

    #[actix_web::test]
    async fn wires_health_probes() {
        let app = test::init_service(build_app(deps())).await;
        for uri in ["/health/ready", "/health/live"] {
            let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(res.status(), StatusCode::OK, "{uri}");
        }
    }

    #[actix_web::test]
    async fn create_route_is_not_shadowed_by_the_detail_route() {
        let app = test::init_service(build_app(deps())).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/posts/create")
                .set_form([("caption", "hello")])
                .to_request(),
        )
        .await;
        // Anonymous create redirects; a shadowing detail match would 404/405.
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[actix_web::test]
    async fn session_cookie_renews_on_requests_that_do_not_touch_the_session() {
        let user = crate::domain::test_fixtures::user("u1", "ada@example.com");
        let mut users = MockUserStore::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        let app = test::init_service(build_app(deps_with_users(users))).await;

        let signin_res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/signin")
                .set_form([("email", "ada@example.com"), ("password", "password")])
                .to_request(),
        )
        .await;
        let cookie = signin_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned();

        // A read-only request never writes session state; the rolling window
        // still re-issues the cookie.
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/health/live")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert!(
            res.response()
                .cookies()
                .any(|cookie| cookie.name() == "session"),
            "rolling expiry must renew the cookie on every verified request"
        );
    }

    #[actix_web::test]
    async fn every_response_carries_a_trace_id() {
        let app = test::init_service(build_app(deps())).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/health/live").to_request(),
        )
        .await;
        assert!(res.headers().contains_key("trace-id"));
    }
}
