//! Password identity provider backed by an identity-toolkit REST endpoint.
//!
//! Verifies email/password pairs against
//! `{base}/v1/accounts:signInWithPassword?key={api_key}` and registers new
//! accounts against `{base}/v1/accounts:signUp?key={api_key}`. Failures
//! arrive as HTTP 400 with an upper-snake error code in the body; those codes
//! are normalised into [`IdentityProviderError`] variants here and never
//! reach handlers.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{Email, ExternalIdentity, LoginCredentials};

use super::store::client::body_preview;

const SIGN_IN_PATH: &str = "v1/accounts:signInWithPassword";
const SIGN_UP_PATH: &str = "v1/accounts:signUp";

/// Successful verification payload; extra token fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifiedDto {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FailureDto {
    error: FailureDetailDto,
}

#[derive(Debug, Deserialize)]
struct FailureDetailDto {
    message: String,
}

/// [`IdentityProvider`] that verifies passwords against the remote endpoint.
pub struct PasswordIdentityProvider {
    client: Client,
    sign_in: Url,
    sign_up: Url,
    api_key: String,
}

impl PasswordIdentityProvider {
    /// Build a provider for the given identity-toolkit base URL.
    ///
    /// # Errors
    ///
    /// Returns an error when an endpoint URL cannot be derived from the base.
    pub fn new(client: Client, base: Url, api_key: impl Into<String>) -> Result<Self, url::ParseError> {
        let sign_in = base.join(SIGN_IN_PATH)?;
        let sign_up = base.join(SIGN_UP_PATH)?;
        Ok(Self {
            client,
            sign_in,
            sign_up,
            api_key: api_key.into(),
        })
    }

    async fn call(
        &self,
        endpoint: &Url,
        credentials: &LoginCredentials,
        map_codes: fn(&str) -> IdentityProviderError,
    ) -> Result<ExternalIdentity, IdentityProviderError> {
        let response = self
            .client
            .post(endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "email": credentials.email().as_ref(),
                "password": credentials.password(),
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_failure(status, body.as_ref(), map_codes));
        }
        decode_identity(body.as_ref())
    }
}

#[async_trait]
impl IdentityProvider for PasswordIdentityProvider {
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<ExternalIdentity, IdentityProviderError> {
        self.call(&self.sign_in, credentials, map_sign_in_code).await
    }

    async fn register(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<ExternalIdentity, IdentityProviderError> {
        self.call(&self.sign_up, credentials, map_sign_up_code).await
    }
}

fn decode_identity(body: &[u8]) -> Result<ExternalIdentity, IdentityProviderError> {
    let verified: VerifiedDto = serde_json::from_slice(body).map_err(|err| {
        IdentityProviderError::malformed_claims(format!("invalid verification payload: {err}"))
    })?;
    let email = verified
        .email
        .ok_or_else(|| IdentityProviderError::malformed_claims("claims carry no email"))?;
    let email = Email::new(email)
        .map_err(|err| IdentityProviderError::malformed_claims(err.to_string()))?;
    Ok(ExternalIdentity {
        external_id: verified.local_id,
        email,
        name: verified.display_name.filter(|name| !name.is_empty()),
        image: verified.photo_url.filter(|url| !url.is_empty()),
    })
}

fn map_transport_error(error: reqwest::Error) -> IdentityProviderError {
    IdentityProviderError::transport(error.to_string())
}

fn map_failure(
    status: StatusCode,
    body: &[u8],
    map_codes: fn(&str) -> IdentityProviderError,
) -> IdentityProviderError {
    let Ok(failure) = serde_json::from_slice::<FailureDto>(body) else {
        return IdentityProviderError::transport(format!(
            "status {}: {}",
            status.as_u16(),
            body_preview(body)
        ));
    };
    map_codes(&failure.error.message)
}

/// Throttling and weak-password codes arrive with a suffix
/// (`TOO_MANY_ATTEMPTS_TRY_LATER : ...`), so those match on prefix.
fn map_sign_in_code(code: &str) -> IdentityProviderError {
    if code.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER") {
        return IdentityProviderError::RateLimited;
    }
    match code {
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            IdentityProviderError::InvalidCredentials
        }
        "EMAIL_NOT_FOUND" => IdentityProviderError::UnknownAccount,
        other => IdentityProviderError::denied(other.to_owned()),
    }
}

fn map_sign_up_code(code: &str) -> IdentityProviderError {
    if code.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER") {
        return IdentityProviderError::RateLimited;
    }
    if code.starts_with("WEAK_PASSWORD") {
        return IdentityProviderError::WeakPassword;
    }
    match code {
        "EMAIL_EXISTS" => IdentityProviderError::AlreadyRegistered,
        other => IdentityProviderError::denied(other.to_owned()),
    }
}
