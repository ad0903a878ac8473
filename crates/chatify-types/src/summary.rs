//! Derived per-friend conversation preview.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// One row of the chat list: the latest exchange with a friend and how many
/// of the friend's messages are delivered but not yet read.
///
/// Recomputed on every request; never persisted or cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub friend_id: UserId,
    pub friend_name: String,
    pub last_message: String,
    pub last_time_stamp: DateTime<Utc>,
    pub unread_count: u32,
    pub profile_image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_wire_field_names() {
        let summary = ConversationSummary {
            friend_id: UserId(3),
            friend_name: "Nimal Fernando".to_string(),
            last_message: "ping".to_string(),
            last_time_stamp: Utc::now(),
            unread_count: 1,
            profile_image: String::new(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["friendId"], 3);
        assert_eq!(json["lastMessage"], "ping");
        assert_eq!(json["unreadCount"], 1);
        assert_eq!(json["profileImage"], "");
        assert!(json.get("lastTimeStamp").is_some());
    }
}
