//! User identity and the profile shapes derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::status::PresenceStatus;

/// Stable, externally assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A registered account.
///
/// Identity fields are owned by the account service; the chat core only
/// ever writes `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub country_code: String,
    pub contact_no: String,
    pub status: PresenceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// `"<first> <last>"`, trimmed when either part is empty.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Fields required to create a user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub country_code: String,
    pub contact_no: String,
}

/// Contact card sent by a client when adding someone to its roster.
pub type ContactCard = NewUser;

/// Compact user shape embedded in message payloads (`from` / `to`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub country_code: String,
    pub contact_no: String,
    pub status: PresenceStatus,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            country_code: user.country_code.clone(),
            contact_no: user.contact_no.clone(),
            status: user.status,
        }
    }
}

/// Public profile of another user, shown in a single-chat header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub country_code: String,
    pub contact_no: String,
    pub profile_image: String,
    pub status: PresenceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FriendProfile {
    pub fn new(user: &User, profile_image: String) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            country_code: user.country_code.clone(),
            contact_no: user.contact_no.clone(),
            profile_image,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// One row of a user's contact roster.
///
/// `display_name` is the owner's local override from the relation edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub display_name: Option<String>,
    pub country_code: String,
    pub contact_no: String,
    pub profile_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: PresenceStatus,
}

/// The caller's own profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnProfile {
    pub first_name: String,
    pub last_name: String,
    pub country_code: String,
    pub contact_no: String,
    pub profile_image: String,
}
