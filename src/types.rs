use serde::Deserialize;

/// Message resource returned by the import, insert, send, and trash calls.
///
/// `labelIds` is occasionally omitted by the provider; it defaults to an
/// empty list so a tracked message always carries the full identifier set.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteMessage {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    #[serde(rename = "labelIds", default)]
    pub label_ids: Vec<String>,
}

/// Subset of the users.getProfile response this crate cares about.
#[derive(Debug, Deserialize)]
pub struct Profile {
    #[serde(rename = "emailAddress")]
    pub email_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_with_all_fields() {
        let remote: RemoteMessage = serde_json::from_str(
            r#"{"id":"m1","threadId":"t1","labelIds":["INBOX","UNREAD"]}"#,
        )
        .unwrap();
        assert_eq!(remote.id, "m1");
        assert_eq!(remote.thread_id, "t1");
        assert_eq!(remote.label_ids, vec!["INBOX", "UNREAD"]);
    }

    #[test]
    fn test_remote_message_without_labels() {
        let remote: RemoteMessage =
            serde_json::from_str(r#"{"id":"m2","threadId":"t2"}"#).unwrap();
        assert!(remote.label_ids.is_empty());
    }

    #[test]
    fn test_remote_message_requires_id() {
        let parsed = serde_json::from_str::<RemoteMessage>(r#"{"threadId":"t1"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_profile_address() {
        let profile: Profile =
            serde_json::from_str(r#"{"emailAddress":"me@example.com","messagesTotal":42}"#)
                .unwrap();
        assert_eq!(profile.email_address, "me@example.com");
    }
}
