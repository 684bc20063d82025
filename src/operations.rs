use log::info;
use serde_json::json;

use crate::error::{Error, Result};
use crate::message::MailMessage;
use crate::session::{GmailSession, GMAIL_ENDPOINT};
use crate::transport::Method;
use crate::types::RemoteMessage;

// Serialize, upload to the given endpoint, and fold the provider's
// identifiers back into the entity. The message is only mutated after a
// successful response.
async fn upload(session: &GmailSession, message: &mut MailMessage, endpoint: &str) -> Result<()> {
    let raw = message.encoded()?;
    let url = format!("{}/messages/{}", GMAIL_ENDPOINT, endpoint);
    let body = session
        .call(Method::Post, &url, Some(json!({ "raw": raw })))
        .await?;
    let response: RemoteMessage = serde_json::from_str(&body)?;
    info!("uploaded message {} via {}", response.id, endpoint);
    message.track(response);
    Ok(())
}

/// Adds the message to the mailbox through the import endpoint, which files
/// it like ordinary received mail without delivering anything.
///
/// Fails with [`Error::AlreadyTracked`] if the message was already uploaded.
pub async fn import_message(session: &GmailSession, message: &mut MailMessage) -> Result<()> {
    message.ensure_untracked()?;
    upload(session, message, "import").await
}

/// Adds the message to the mailbox through the insert endpoint (no delivery,
/// provider-side label handling differs from import).
///
/// Fails with [`Error::AlreadyTracked`] if the message was already uploaded.
pub async fn insert_message(session: &GmailSession, message: &mut MailMessage) -> Result<()> {
    message.ensure_untracked()?;
    upload(session, message, "insert").await
}

/// Delivers the message to its recipients and files it in the sender's
/// mailbox.
///
/// The sender address must be the authenticated account's own address; the
/// check runs before anything is sent, and a mismatch fails with
/// [`Error::ForeignSender`] without touching the send endpoint.
pub async fn send_message(session: &GmailSession, message: &mut MailMessage) -> Result<()> {
    message.ensure_untracked()?;

    let account = session.user_address().await?;
    if message.sender != account {
        return Err(Error::ForeignSender {
            sender: message.sender.clone(),
            account,
        });
    }

    upload(session, message, "send").await
}

/// Removes the tracked message from the provider.
///
/// With `trash` set, the message moves to the trash and can be restored; the
/// entity keeps tracking it. Otherwise the message is permanently and
/// irreversibly deleted, and the entity reverts to untracked so it can be
/// uploaded again.
///
/// Fails with [`Error::NotTracked`] if the message was never uploaded.
pub async fn delete_message(
    session: &GmailSession,
    message: &mut MailMessage,
    trash: bool,
) -> Result<()> {
    let id = message.ensure_tracked()?.to_string();

    if trash {
        let url = format!("{}/messages/{}/trash", GMAIL_ENDPOINT, id);
        session.call(Method::Post, &url, None).await?;
        info!("moved message {} to trash", id);
    } else {
        let url = format!("{}/messages/{}", GMAIL_ENDPOINT, id);
        session.call(Method::Delete, &url, None).await?;
        info!("permanently deleted message {}", id);
        message.untrack();
    }
    Ok(())
}

/// Starts a new message from the authenticated account: resolves the
/// account's own address and uses it as the sender.
pub async fn write_new_message(
    session: &GmailSession,
    subject: impl Into<String>,
    body: impl Into<String>,
    recipients: Vec<String>,
) -> Result<MailMessage> {
    let sender = session.user_address().await?;
    Ok(MailMessage::new(subject, body, sender, recipients))
}
