use log::{debug, warn};
use serde_json::Value;

use crate::auth::{InstalledAuthenticator, TokenProvider};
use crate::error::{Error, Result};
use crate::transport::{ApiResponse, HttpTransport, Method, Transport};
use crate::types::Profile;

/// Base URL for all calls; the library only ever acts as the authenticated
/// user, so the account segment is fixed to "me".
pub const GMAIL_ENDPOINT: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// An authenticated connection to the provider.
///
/// Construct one with [`GmailSession::connect`] and pass it by reference into
/// every operation. Credentials are acquired lazily on the first call, not at
/// construction.
pub struct GmailSession {
    transport: Box<dyn Transport>,
    tokens: Box<dyn TokenProvider>,
}

impl GmailSession {
    /// Builds a session over the real HTTP transport and the disk-backed
    /// installed-flow authenticator.
    pub async fn connect() -> Result<Self> {
        let tokens = InstalledAuthenticator::from_disk().await?;
        Ok(Self::with_parts(
            Box::new(HttpTransport::new()),
            Box::new(tokens),
        ))
    }

    /// Assembles a session from caller-supplied parts. This is how tests
    /// substitute a stub provider and canned tokens.
    pub fn with_parts(transport: Box<dyn Transport>, tokens: Box<dyn TokenProvider>) -> Self {
        Self { transport, tokens }
    }

    /// Issues one call. A 401 answer triggers exactly one forced token
    /// refresh and one retry; any other non-success status is returned as
    /// [`Error::Api`].
    pub(crate) async fn call(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<String> {
        let token = self.tokens.access_token().await?;
        debug!("{:?} {}", method, url);
        let mut response: ApiResponse = self
            .transport
            .execute(method, url, &token, body.clone())
            .await?;

        if response.status == 401 {
            warn!("provider rejected the access token, refreshing and retrying once");
            let token = self.tokens.refreshed_token().await?;
            response = self.transport.execute(method, url, &token, body).await?;
        }

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(Error::Api {
                status: response.status,
                body: response.body,
            })
        }
    }

    /// Returns the authenticated account's primary address. Queries the
    /// provider every time; nothing is cached.
    pub async fn user_address(&self) -> Result<String> {
        let url = format!("{}/profile", GMAIL_ENDPOINT);
        let body = self.call(Method::Get, &url, None).await?;
        let profile: Profile = serde_json::from_str(&body)?;
        Ok(profile.email_address)
    }
}
