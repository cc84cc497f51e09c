//! HTTP server configuration object and helpers.

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use std::net::SocketAddr;

/// Rolling session lifetime; each authenticated response renews the cookie.
const DEFAULT_SESSION_TTL: Duration = Duration::days(7);

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) session_ttl: Duration,
}

impl ServerConfig {
    /// Construct a server configuration using application preferences.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Override the session cookie lifetime.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
