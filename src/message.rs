use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use mime_guess::Mime;

use crate::error::{Error, Result};
use crate::types::RemoteMessage;

/// A file attached to a message. The content is not read until the message
/// is serialized, so the file must still exist (and may change) up to the
/// moment an upload operation runs.
#[derive(Debug, Clone)]
pub struct Attachment {
    path: PathBuf,
    mime: Mime,
}

impl Attachment {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Major MIME type, e.g. "image" for a PNG.
    pub fn mime_type(&self) -> &str {
        self.mime.type_().as_str()
    }

    /// MIME subtype, e.g. "png".
    pub fn mime_subtype(&self) -> &str {
        self.mime.subtype().as_str()
    }
}

/// Identifiers of the provider-side message this entity tracks. Held as one
/// unit so a message is either fully tracked or not tracked at all.
#[derive(Debug, Clone)]
struct RemoteHandle {
    id: String,
    thread_id: String,
    label_ids: Vec<String>,
}

/// An email message under local authorship, optionally tracking its remote
/// counterpart once uploaded.
///
/// A fresh message is untracked. Exactly one successful import, insert, or
/// send transitions it to tracked; uploading it a second time is a usage
/// error. [`MailMessage::duplicate`] produces a new untracked copy for
/// resending.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
    pub sender: String,
    pub recipients: Vec<String>,
    attachments: Vec<Attachment>,
    remote: Option<RemoteHandle>,
}

impl MailMessage {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        sender: impl Into<String>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            sender: sender.into(),
            recipients,
            attachments: Vec::new(),
            remote: None,
        }
    }

    /// Attaches a file, inferring its MIME type from the file name. Fails
    /// with [`Error::UnknownAttachmentType`] when no type can be inferred;
    /// nothing is appended in that case.
    pub fn add_attachment(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let mime = mime_guess::from_path(&path)
            .first()
            .ok_or_else(|| Error::UnknownAttachmentType { path: path.clone() })?;
        self.attachments.push(Attachment { path, mime });
        Ok(())
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// True once the message has been uploaded and carries a remote id.
    pub fn is_tracked(&self) -> bool {
        self.remote.is_some()
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote.as_ref().map(|remote| remote.id.as_str())
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.remote.as_ref().map(|remote| remote.thread_id.as_str())
    }

    pub fn label_ids(&self) -> Option<&[String]> {
        self.remote.as_ref().map(|remote| remote.label_ids.as_slice())
    }

    /// New untracked message with the same authored content, independent of
    /// this one.
    pub fn duplicate(&self) -> Self {
        Self {
            subject: self.subject.clone(),
            body: self.body.clone(),
            sender: self.sender.clone(),
            recipients: self.recipients.clone(),
            attachments: self.attachments.clone(),
            remote: None,
        }
    }

    pub(crate) fn ensure_untracked(&self) -> Result<()> {
        if self.is_tracked() {
            Err(Error::AlreadyTracked)
        } else {
            Ok(())
        }
    }

    /// Returns the remote id, or fails if the message was never uploaded.
    pub(crate) fn ensure_tracked(&self) -> Result<&str> {
        match &self.remote {
            Some(remote) => Ok(&remote.id),
            None => Err(Error::NotTracked),
        }
    }

    pub(crate) fn track(&mut self, response: RemoteMessage) {
        self.remote = Some(RemoteHandle {
            id: response.id,
            thread_id: response.thread_id,
            label_ids: response.label_ids,
        });
    }

    pub(crate) fn untrack(&mut self) {
        self.remote = None;
    }

    /// Serializes to the URL-safe base64 form the provider's `raw` field
    /// expects. Attachment content is read from disk here, fresh on every
    /// call.
    pub(crate) fn encoded(&self) -> Result<String> {
        let document = self.to_rfc822()?;
        Ok(URL_SAFE.encode(document.as_bytes()))
    }

    // Assemble the RFC 2822 document: plain text when there are no
    // attachments, multipart/mixed otherwise.
    fn to_rfc822(&self) -> Result<String> {
        let mut document = String::new();
        document.push_str(&format!("To: {}\r\n", self.recipients.join(", ")));
        document.push_str(&format!("From: {}\r\n", self.sender));
        document.push_str(&format!("Subject: {}\r\n", self.subject));
        document.push_str("MIME-Version: 1.0\r\n");

        if self.attachments.is_empty() {
            document.push_str("Content-Type: text/plain; charset=utf-8\r\n");
            document.push_str("\r\n");
            document.push_str(&self.body);
            return Ok(document);
        }

        let boundary = self.boundary();
        document.push_str(&format!(
            "Content-Type: multipart/mixed; boundary=\"{}\"\r\n",
            boundary
        ));
        document.push_str("\r\n");

        document.push_str(&format!("--{}\r\n", boundary));
        document.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        document.push_str("\r\n");
        document.push_str(&self.body);
        document.push_str("\r\n");

        for attachment in &self.attachments {
            let content = fs::read(&attachment.path)?;
            let filename = attachment
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            document.push_str(&format!("--{}\r\n", boundary));
            document.push_str(&format!(
                "Content-Type: {}/{}\r\n",
                attachment.mime_type(),
                attachment.mime_subtype()
            ));
            document.push_str(&format!(
                "Content-Disposition: attachment; filename=\"{}\"\r\n",
                filename
            ));
            document.push_str("Content-Transfer-Encoding: base64\r\n");
            document.push_str("\r\n");

            let encoded = STANDARD.encode(&content);
            for line in encoded.as_bytes().chunks(76) {
                // Chunks fall on 4-byte base64 group boundaries, so this is
                // valid UTF-8 by construction.
                document.push_str(std::str::from_utf8(line).unwrap_or_default());
                document.push_str("\r\n");
            }
        }
        document.push_str(&format!("--{}--\r\n", boundary));

        Ok(document)
    }

    // Boundary derived from the authored fields. The "=" prefix keeps it out
    // of any base64-encoded part content, and base64 lines never start with
    // "--".
    fn boundary(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.subject.hash(&mut hasher);
        self.sender.hash(&mut hasher);
        self.recipients.hash(&mut hasher);
        for attachment in &self.attachments {
            attachment.path.hash(&mut hasher);
        }
        format!("=_part_{:016x}", hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_message() -> MailMessage {
        MailMessage::new(
            "Hi",
            "Test",
            "a@x.com",
            vec!["b@x.com".to_string(), "c@x.com".to_string()],
        )
    }

    fn tracked_response() -> RemoteMessage {
        serde_json::from_str(r#"{"id":"m1","threadId":"t1","labelIds":["INBOX"]}"#).unwrap()
    }

    #[test]
    fn test_new_message_is_untracked() {
        let message = sample_message();
        assert!(!message.is_tracked());
        assert_eq!(message.remote_id(), None);
        assert_eq!(message.thread_id(), None);
        assert_eq!(message.label_ids(), None);
    }

    #[test]
    fn test_track_sets_all_identifiers() {
        let mut message = sample_message();
        message.track(tracked_response());
        assert!(message.is_tracked());
        assert_eq!(message.remote_id(), Some("m1"));
        assert_eq!(message.thread_id(), Some("t1"));
        assert_eq!(message.label_ids(), Some(&["INBOX".to_string()][..]));
    }

    #[test]
    fn test_guards() {
        let mut message = sample_message();
        assert!(message.ensure_untracked().is_ok());
        assert!(matches!(
            message.ensure_tracked().unwrap_err(),
            Error::NotTracked
        ));

        message.track(tracked_response());
        assert!(matches!(
            message.ensure_untracked().unwrap_err(),
            Error::AlreadyTracked
        ));
        assert_eq!(message.ensure_tracked().unwrap(), "m1");
    }

    #[test]
    fn test_duplicate_strips_tracking_and_is_independent() {
        let mut original = sample_message();
        original.add_attachment("photo.png").unwrap();
        original.track(tracked_response());

        let mut copy = original.duplicate();
        assert!(!copy.is_tracked());
        assert!(original.is_tracked());
        assert_eq!(copy.subject, original.subject);
        assert_eq!(copy.body, original.body);
        assert_eq!(copy.sender, original.sender);
        assert_eq!(copy.recipients, original.recipients);
        assert_eq!(copy.attachments().len(), 1);

        copy.recipients.push("d@x.com".to_string());
        copy.subject = "Changed".to_string();
        assert_eq!(original.recipients.len(), 2);
        assert_eq!(original.subject, "Hi");
    }

    #[test]
    fn test_attachment_type_inference() {
        let mut message = sample_message();
        message.add_attachment("report.pdf").unwrap();
        message.add_attachment("photo.png").unwrap();

        assert_eq!(message.attachments()[0].mime_type(), "application");
        assert_eq!(message.attachments()[0].mime_subtype(), "pdf");
        assert_eq!(message.attachments()[1].mime_type(), "image");
        assert_eq!(message.attachments()[1].mime_subtype(), "png");
    }

    #[test]
    fn test_unguessable_attachment_is_rejected() {
        let mut message = sample_message();
        let err = message.add_attachment("mystery").unwrap_err();
        assert!(matches!(err, Error::UnknownAttachmentType { .. }));
        assert!(err.is_usage());
        assert!(message.attachments().is_empty());
    }

    #[test]
    fn test_plain_document_layout() {
        let message = sample_message();
        let document = message.to_rfc822().unwrap();
        assert!(document.starts_with("To: b@x.com, c@x.com\r\n"));
        assert!(document.contains("From: a@x.com\r\n"));
        assert!(document.contains("Subject: Hi\r\n"));
        assert!(document.contains("Content-Type: text/plain; charset=utf-8\r\n\r\nTest"));
        assert!(!document.contains("multipart"));
    }

    #[test]
    fn test_encoded_round_trips() {
        let message = sample_message();
        let encoded = message.encoded().unwrap();
        let decoded = URL_SAFE.decode(encoded.as_bytes()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            message.to_rfc822().unwrap()
        );
    }

    #[test]
    fn test_multipart_document_reads_file_at_serialization_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"first contents").unwrap();

        let mut message = sample_message();
        message.add_attachment(&path).unwrap();

        let first = message.to_rfc822().unwrap();
        assert!(first.contains("Content-Type: multipart/mixed; boundary="));
        assert!(first.contains("Content-Type: text/plain\r\n"));
        assert!(first.contains("Content-Disposition: attachment; filename=\"notes.txt\"\r\n"));
        assert!(first.contains(&STANDARD.encode(b"first contents")));

        // Rewrite the file; the next serialization must pick up the change.
        std::fs::write(&path, b"second contents").unwrap();
        let second = message.to_rfc822().unwrap();
        assert!(second.contains(&STANDARD.encode(b"second contents")));
        assert!(!second.contains(&STANDARD.encode(b"first contents")));
    }

    #[test]
    fn test_multipart_document_is_terminated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, b"a,b\n1,2\n").unwrap();

        let mut message = sample_message();
        message.add_attachment(&path).unwrap();

        let document = message.to_rfc822().unwrap();
        let boundary = message.boundary();
        assert_eq!(document.matches(&format!("--{}\r\n", boundary)).count(), 2);
        assert!(document.ends_with(&format!("--{}--\r\n", boundary)));
    }

    #[test]
    fn test_missing_attachment_file_fails_serialization() {
        let mut message = sample_message();
        message.add_attachment("does-not-exist.png").unwrap();
        assert!(matches!(message.encoded().unwrap_err(), Error::Io(_)));
    }
}
