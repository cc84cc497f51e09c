//! Service entry-point: reads configuration from the environment, wires the
//! outbound adapters, and starts the HTTP server.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use actix_web::web;
use reqwest::Url;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use snapfeed::inbound::http::health::HealthState;
use snapfeed::inbound::http::HttpState;
use snapfeed::outbound::{DocumentStore, PasswordIdentityProvider, RestPostStore, RestUserStore};
use snapfeed::server::{create_server, ServerConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const IDENTITY_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let key = load_session_key()?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);
    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.into())
        .parse()
        .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR: {e}")))?;

    let http_state = build_adapters()?;
    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(key, cookie_secure, SameSite::Lax, bind_addr);

    let server = create_server(health_state, http_state, config)?;
    server.await
}

/// Load the session signing/encryption key, falling back to an ephemeral key
/// only in development. An ephemeral key invalidates all sessions on restart.
fn load_session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {e}"
                )))
            }
        }
    }
}

fn build_adapters() -> std::io::Result<HttpState> {
    let store_base = required_url("STORE_BASE_URL")?;
    let identity_url = required_url("IDENTITY_URL")?;
    let api_key = env::var("IDENTITY_API_KEY")
        .map_err(|_| std::io::Error::other("IDENTITY_API_KEY must be set"))?;

    let store = DocumentStore::new(store_base)
        .map_err(|e| std::io::Error::other(format!("document store client: {e}")))?;
    let identity_client = reqwest::Client::builder()
        .timeout(IDENTITY_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| std::io::Error::other(format!("identity client: {e}")))?;
    let identity = PasswordIdentityProvider::new(identity_client, identity_url, api_key)
        .map_err(|e| std::io::Error::other(format!("identity endpoint: {e}")))?;

    Ok(HttpState::new(
        Arc::new(identity),
        Arc::new(RestUserStore::new(store.clone())),
        Arc::new(RestPostStore::new(store)),
    ))
}

fn required_url(name: &str) -> std::io::Result<Url> {
    let raw = env::var(name).map_err(|_| std::io::Error::other(format!("{name} must be set")))?;
    Url::parse(&raw).map_err(|e| std::io::Error::other(format!("invalid {name}: {e}")))
}
