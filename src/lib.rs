//! Thin async client for the Gmail REST API, organized into:
//! - auth: OAuth2 installed-application flow and token persistence
//! - transport: bearer-authenticated HTTP plumbing
//! - session: the authenticated session operations run through
//! - message: the message entity and its MIME serialization
//! - operations: message actions (import, insert, send, delete)
//!
//! A caller connects once, authors a [`MailMessage`], and hands both to an
//! operation:
//!
//! ```no_run
//! use gmailbox::{send_message, GmailSession, MailMessage};
//!
//! # async fn demo() -> gmailbox::Result<()> {
//! let session = GmailSession::connect().await?;
//! let mut message = MailMessage::new(
//!     "Hi",
//!     "Test",
//!     "me@example.com",
//!     vec!["you@example.com".to_string()],
//! );
//! message.add_attachment("report.pdf")?;
//! send_message(&session, &mut message).await?;
//! assert!(message.is_tracked());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod message;
pub mod operations;
pub mod session;
pub mod transport;
pub mod types;

// Re-export the working surface at the crate root
pub use auth::{InstalledAuthenticator, TokenProvider, CLIENT_SECRET_PATH, SCOPES, TOKEN_PATH};
pub use error::{Error, Result};
pub use message::{Attachment, MailMessage};
pub use operations::{
    delete_message, import_message, insert_message, send_message, write_new_message,
};
pub use session::{GmailSession, GMAIL_ENDPOINT};
pub use transport::{ApiResponse, HttpTransport, Method, Transport};
pub use types::{Profile, RemoteMessage};
