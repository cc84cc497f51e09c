//! Driving port for identity verification.
//!
//! In hexagonal terms this is the seam between the application and whichever
//! identity provider variant is wired in: a delegated OAuth exchange or a
//! local email/password verifier. Both normalise into one
//! [`ExternalIdentity`] shape; handlers never see provider field names.

use async_trait::async_trait;

use crate::domain::{Email, ExternalIdentity, LoginCredentials};

/// Failures raised while verifying credentials with a provider.
///
/// The subkinds matter: sign-in surfaces distinct user-facing messages for
/// bad credentials, unknown accounts, and provider throttling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityProviderError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("no account found with this email")]
    UnknownAccount,
    #[error("an account with this email already exists")]
    AlreadyRegistered,
    #[error("password is too weak, use at least 6 characters")]
    WeakPassword,
    #[error("too many failed attempts, try again later")]
    RateLimited,
    /// The provider refused the sign-in for a reason other than credentials.
    #[error("identity provider denied sign-in: {message}")]
    Denied { message: String },
    /// The provider answered but the claims were unusable (e.g. no email).
    #[error("identity provider returned malformed claims: {message}")]
    MalformedClaims { message: String },
    #[error("identity provider unreachable: {message}")]
    Transport { message: String },
}

impl IdentityProviderError {
    pub fn denied(message: impl Into<String>) -> Self {
        Self::Denied {
            message: message.into(),
        }
    }

    pub fn malformed_claims(message: impl Into<String>) -> Self {
        Self::MalformedClaims {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Produce a verified external identity from login credentials.
///
/// Side-effect free beyond the provider network call; implementations must
/// not touch the user directory. `register` creates the provider-side account;
/// the directory entry is the caller's responsibility.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials for an existing account.
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<ExternalIdentity, IdentityProviderError>;

    /// Create a new provider account for the credentials.
    async fn register(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<ExternalIdentity, IdentityProviderError>;
}

/// Deterministic provider for tests and local development: one configured
/// email/password pair authenticates, everything else is refused.
#[derive(Debug, Clone)]
pub struct FixtureIdentityProvider {
    email: Email,
    password: String,
    external_id: String,
}

impl FixtureIdentityProvider {
    pub fn new(email: Email, password: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            email,
            password: password.into(),
            external_id: external_id.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<ExternalIdentity, IdentityProviderError> {
        if credentials.email() != &self.email {
            return Err(IdentityProviderError::UnknownAccount);
        }
        if credentials.password() != self.password {
            return Err(IdentityProviderError::InvalidCredentials);
        }
        Ok(ExternalIdentity {
            external_id: self.external_id.clone(),
            email: self.email.clone(),
            name: None,
            image: None,
        })
    }

    async fn register(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<ExternalIdentity, IdentityProviderError> {
        if credentials.email() == &self.email {
            return Err(IdentityProviderError::AlreadyRegistered);
        }
        Ok(ExternalIdentity {
            external_id: format!("ext-{}", credentials.email().as_ref()),
            email: credentials.email().clone(),
            name: None,
            image: None,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn provider() -> FixtureIdentityProvider {
        FixtureIdentityProvider::new(
            Email::new("ada@example.com").expect("fixture email"),
            "password",
            "ext-ada",
        )
    }

    #[rstest]
    #[case("ada@example.com", "password", None)]
    #[case("ada@example.com", "wrong", Some(IdentityProviderError::InvalidCredentials))]
    #[case("bob@example.com", "password", Some(IdentityProviderError::UnknownAccount))]
    #[tokio::test]
    async fn fixture_provider_distinguishes_failure_kinds(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected_err: Option<IdentityProviderError>,
    ) {
        let creds = LoginCredentials::try_from_parts(email, password).expect("credential shape");
        let result = provider().authenticate(&creds).await;
        match expected_err {
            None => {
                let identity = result.expect("authentication success");
                assert_eq!(identity.external_id, "ext-ada");
                assert_eq!(identity.email.as_ref(), "ada@example.com");
            }
            Some(expected) => {
                assert_eq!(result.expect_err("authentication failure"), expected);
            }
        }
    }

    #[tokio::test]
    async fn fixture_provider_registers_unknown_emails_only() {
        let provider = provider();

        let taken = LoginCredentials::try_from_parts("ada@example.com", "password")
            .expect("credential shape");
        assert_eq!(
            provider.register(&taken).await.expect_err("duplicate email"),
            IdentityProviderError::AlreadyRegistered
        );

        let fresh = LoginCredentials::try_from_parts("bob@example.com", "hunter22")
            .expect("credential shape");
        let identity = provider.register(&fresh).await.expect("registration");
        assert_eq!(identity.email.as_ref(), "bob@example.com");
        assert!(!identity.external_id.is_empty());
    }
}
