//! Chat messages exchanged between two users.
//!
//! `Message` is the persisted record. `MessageView` is the wire form pushed to
//! clients, with both endpoints expanded to [`UserSummary`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::status::MessageStatus;
use crate::user::{UserId, UserSummary};

/// Store-assigned message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A persisted message.
///
/// Read access belongs to both endpoints. Status is only ever advanced by the
/// delivery engine and presence flush, never reverted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from_id: UserId,
    pub to_id: UserId,
    pub body: String,
    /// Opaque attachment descriptor; `None` for plain text.
    pub files: Option<String>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// True if this message was exchanged between `a` and `b` in either direction.
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.from_id == a && self.to_id == b) || (self.from_id == b && self.to_id == a)
    }

    /// True if `user` is the sender or the recipient.
    pub fn involves(&self, user: UserId) -> bool {
        self.from_id == user || self.to_id == user
    }
}

/// Fields required to persist a new message.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub from_id: UserId,
    pub to_id: UserId,
    pub body: String,
    pub files: Option<String>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    /// A freshly sent message stamped with the current time.
    pub fn sent(from_id: UserId, to_id: UserId, body: impl Into<String>) -> Self {
        Self {
            from_id,
            to_id,
            body: body.into(),
            files: None,
            status: MessageStatus::Sent,
            created_at: Utc::now(),
        }
    }

    pub fn with_files(mut self, files: Option<String>) -> Self {
        self.files = files;
        self
    }
}

/// Wire form of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub from: UserSummary,
    pub to: UserSummary,
    pub message: String,
    pub files: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageView {
    pub fn new(message: &Message, from: UserSummary, to: UserSummary) -> Self {
        Self {
            id: message.id,
            from,
            to,
            message: message.body.clone(),
            files: message.files.clone().unwrap_or_default(),
            status: message.status,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(from: i64, to: i64) -> Message {
        Message {
            id: MessageId(1),
            from_id: UserId(from),
            to_id: UserId(to),
            body: "hi".to_string(),
            files: None,
            status: MessageStatus::Sent,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_between_either_direction() {
        let m = message(1, 2);
        assert!(m.is_between(UserId(1), UserId(2)));
        assert!(m.is_between(UserId(2), UserId(1)));
        assert!(!m.is_between(UserId(1), UserId(3)));
    }

    #[test]
    fn test_involves() {
        let m = message(1, 2);
        assert!(m.involves(UserId(1)));
        assert!(m.involves(UserId(2)));
        assert!(!m.involves(UserId(3)));
    }

    #[test]
    fn test_new_message_starts_sent() {
        let m = NewMessage::sent(UserId(1), UserId(2), "hello");
        assert_eq!(m.status, MessageStatus::Sent);
        assert!(m.files.is_none());
    }
}
