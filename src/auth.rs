use async_trait::async_trait;
use log::{debug, error};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{InstalledFlowAuthenticator, InstalledFlowReturnMethod};

use crate::error::{Error, Result};

/// Persisted token document, read at startup and overwritten after every
/// refresh or fresh acquisition.
pub const TOKEN_PATH: &str = "token.json";
/// OAuth client identity for the installed-application flow.
pub const CLIENT_SECRET_PATH: &str = "credentials.json";
/// Full mailbox access, requested unconditionally.
pub const SCOPES: &[&str] = &["https://mail.google.com/"];

// Define a trait for token acquisition to allow mocking
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a bearer token that is valid right now, refreshing or running
    /// the interactive consent flow as needed.
    async fn access_token(&self) -> Result<String>;

    /// Discards any cached token, refreshes against the provider, and
    /// returns the replacement.
    async fn refreshed_token(&self) -> Result<String>;
}

/// Token provider backed by yup-oauth2's installed-application flow.
///
/// The authenticator owns the whole credential lifecycle: it loads the token
/// file if present, refreshes expired tokens in place, runs the
/// browser-based consent flow (with a transient local redirect listener)
/// when nothing can be recovered, and re-persists the result to disk.
pub struct InstalledAuthenticator {
    auth: DefaultAuthenticator,
}

impl InstalledAuthenticator {
    /// Builds the authenticator from the fixed client-secret and token file
    /// paths. Does not touch the network; tokens are acquired lazily on the
    /// first `access_token` call.
    pub async fn from_disk() -> Result<Self> {
        let secret = match yup_oauth2::read_application_secret(CLIENT_SECRET_PATH).await {
            Ok(secret) => secret,
            Err(e) => {
                error!(
                    "could not read {}: {}; download the OAuth client file from the \
                     provider console and place it next to the binary",
                    CLIENT_SECRET_PATH, e
                );
                return Err(Error::Io(e));
            }
        };

        let auth =
            InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
                .persist_tokens_to_disk(TOKEN_PATH)
                .build()
                .await?;

        Ok(Self { auth })
    }
}

#[async_trait]
impl TokenProvider for InstalledAuthenticator {
    async fn access_token(&self) -> Result<String> {
        debug!("requesting access token for {:?}", SCOPES);
        let token = self.auth.token(SCOPES).await?;
        match token.token() {
            Some(token) => Ok(token.to_string()),
            None => Err(Error::NoAccessToken),
        }
    }

    async fn refreshed_token(&self) -> Result<String> {
        debug!("forcing token refresh");
        let token = self.auth.force_refreshed_token(SCOPES).await?;
        match token.token() {
            Some(token) => Ok(token.to_string()),
            None => Err(Error::NoAccessToken),
        }
    }
}
