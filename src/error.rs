use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the crate.
///
/// The first four variants are usage errors: the caller invoked an operation
/// on an entity in the wrong state. Everything else is operational and comes
/// straight from the credential, transport, or filesystem layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The message already tracks a remote message and cannot be uploaded
    /// again.
    #[error("message already tracks a remote message and cannot be uploaded again")]
    AlreadyTracked,

    /// The operation needs a message that tracks a remote message, but this
    /// one never reached the provider.
    #[error("message does not track any remote message")]
    NotTracked,

    /// Sending was attempted from an address the authenticated account does
    /// not own.
    #[error("cannot send as {sender}: authenticated account is {account}")]
    ForeignSender { sender: String, account: String },

    /// No MIME type could be inferred from the attachment's file name.
    #[error("cannot infer a MIME type for attachment {}", path.display())]
    UnknownAttachmentType { path: PathBuf },

    #[error("authorization failed: {0}")]
    OAuth(#[from] yup_oauth2::Error),

    /// The authorization flow completed but yielded no access token.
    #[error("authorization produced no access token")]
    NoAccessToken,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("gmail api returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unexpected response body: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caused by misusing the API rather than by the
    /// credential store, the network, or the provider.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::AlreadyTracked
                | Error::NotTracked
                | Error::ForeignSender { .. }
                | Error::UnknownAttachmentType { .. }
        )
    }
}
