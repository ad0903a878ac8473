//! Directed contact edges between users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::RelationStatus;
use crate::user::UserId;

/// "`owner` considers `friend` a contact."
///
/// Edges are directed: an edge A -> B says nothing about B -> A.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRelation {
    pub id: i64,
    pub owner_id: UserId,
    pub friend_id: UserId,
    pub status: RelationStatus,
    /// Name the owner chose for this contact; `None` falls back to the
    /// friend's own name.
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a relation edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelation {
    pub owner_id: UserId,
    pub friend_id: UserId,
    pub status: RelationStatus,
    pub display_name: Option<String>,
}

impl NewRelation {
    /// An `Active` edge with no display-name override.
    pub fn active(owner_id: UserId, friend_id: UserId) -> Self {
        Self {
            owner_id,
            friend_id,
            status: RelationStatus::Active,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}
