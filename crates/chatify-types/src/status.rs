//! Status enumerations for users, relations, and messages.
//!
//! Each domain gets its own status type so a message can never be marked
//! `ONLINE` and a relation can never be marked `READ`. Storage and wire forms
//! are the upper-case names (`"SENT"`, `"ACTIVE"`, `"ONLINE"`).

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Whether a user currently holds a live connection.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('ONLINE', 'OFFLINE'))`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PresenceStatus {
    Online,
    #[default]
    Offline,
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceStatus::Online => write!(f, "ONLINE"),
            PresenceStatus::Offline => write!(f, "OFFLINE"),
        }
    }
}

impl FromStr for PresenceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ONLINE" => Ok(PresenceStatus::Online),
            "OFFLINE" => Ok(PresenceStatus::Offline),
            other => Err(format!("invalid presence status: '{other}'")),
        }
    }
}

/// State of a directed contact edge.
///
/// Only `Active` edges take part in summaries, rosters, and presence flushes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationStatus {
    #[default]
    Active,
    Blocked,
    Deleted,
}

impl fmt::Display for RelationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationStatus::Active => write!(f, "ACTIVE"),
            RelationStatus::Blocked => write!(f, "BLOCKED"),
            RelationStatus::Deleted => write!(f, "DELETED"),
        }
    }
}

impl FromStr for RelationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(RelationStatus::Active),
            "BLOCKED" => Ok(RelationStatus::Blocked),
            "DELETED" => Ok(RelationStatus::Deleted),
            other => Err(format!("invalid relation status: '{other}'")),
        }
    }
}

/// Delivery state of a message.
///
/// Status only moves forward: `Sent -> Delivered -> Read`. Skipping a step
/// (`Sent -> Read`) is allowed by the ordering but no code path in the
/// delivery engine does it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    /// Position in the forward-only ordering.
    pub fn rank(self) -> u8 {
        match self {
            MessageStatus::Sent => 0,
            MessageStatus::Delivered => 1,
            MessageStatus::Read => 2,
        }
    }

    /// True if moving from `self` to `next` is a strictly forward transition.
    pub fn can_advance_to(self, next: MessageStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageStatus::Sent => write!(f, "SENT"),
            MessageStatus::Delivered => write!(f, "DELIVERED"),
            MessageStatus::Read => write!(f, "READ"),
        }
    }
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SENT" => Ok(MessageStatus::Sent),
            "DELIVERED" => Ok(MessageStatus::Delivered),
            "READ" => Ok(MessageStatus::Read),
            other => Err(format!("invalid message status: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_status_only_advances_forward() {
        use MessageStatus::*;
        assert!(Sent.can_advance_to(Delivered));
        assert!(Delivered.can_advance_to(Read));
        assert!(Sent.can_advance_to(Read));

        assert!(!Read.can_advance_to(Delivered));
        assert!(!Delivered.can_advance_to(Sent));
        assert!(!Sent.can_advance_to(Sent));
    }

    #[test]
    fn test_message_status_wire_form() {
        let json = serde_json::to_string(&MessageStatus::Delivered).unwrap();
        assert_eq!(json, "\"DELIVERED\"");
        let parsed: MessageStatus = serde_json::from_str("\"READ\"").unwrap();
        assert_eq!(parsed, MessageStatus::Read);
    }

    #[test]
    fn test_status_display_matches_from_str() {
        for status in [MessageStatus::Sent, MessageStatus::Delivered, MessageStatus::Read] {
            assert_eq!(status.to_string().parse::<MessageStatus>().unwrap(), status);
        }
        for status in [PresenceStatus::Online, PresenceStatus::Offline] {
            assert_eq!(status.to_string().parse::<PresenceStatus>().unwrap(), status);
        }
        for status in [
            RelationStatus::Active,
            RelationStatus::Blocked,
            RelationStatus::Deleted,
        ] {
            assert_eq!(status.to_string().parse::<RelationStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_cross_domain_values_are_rejected() {
        assert!("ONLINE".parse::<MessageStatus>().is_err());
        assert!("READ".parse::<RelationStatus>().is_err());
        assert!("ACTIVE".parse::<PresenceStatus>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PresenceStatus::default(), PresenceStatus::Offline);
        assert_eq!(RelationStatus::default(), RelationStatus::Active);
        assert_eq!(MessageStatus::default(), MessageStatus::Sent);
    }
}
