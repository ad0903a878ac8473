//! Wire envelopes exchanged over a live chat connection.
//!
//! Inbound text frames decode into a [`ClientCommand`], a closed set of
//! variants keyed by the `type` field. Outbound frames are [`ServerEnvelope`]
//! values, always serialized as `{"type": ..., "payload": ...}`.
//!
//! The mobile client serializes numbers through JavaScript, so ids may arrive
//! as `5`, `5.0`, or occasionally `"5"`. All three decode to the same id.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::message::{MessageId, MessageView};
use crate::summary::ConversationSummary;
use crate::user::{ContactCard, FriendProfile, OwnProfile, RosterEntry, UserId};

/// Every `type` value the dispatcher understands.
///
/// Must list exactly the `rename` of each [`ClientCommand`] variant, in
/// declaration order, matching [`ClientCommand::kind`].
pub const KNOWN_COMMANDS: &[&str] = &[
    "PING",
    "send_chat",
    "send_message",
    "get_chat_list",
    "get_single_chat",
    "get_friend_data",
    "get_all_users",
    "save_new_contact",
    "set_user_profile",
    "delete_message",
];

/// A decoded inbound envelope.
///
/// Unknown extra fields (the client appends its own `userId` to every frame)
/// are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Keep-alive. Answered with `PONG` to the caller only.
    #[serde(rename = "PING")]
    Ping,

    /// Low-level send: sender is named explicitly and no relation edges are
    /// created.
    #[serde(rename = "send_chat", rename_all = "camelCase")]
    SendChat {
        #[serde(deserialize_with = "flexible_id")]
        from_id: UserId,
        #[serde(deserialize_with = "flexible_id")]
        to_id: UserId,
        message: String,
        #[serde(default)]
        files: Option<String>,
    },

    /// Send from the connected user, creating relation edges on first contact.
    #[serde(rename = "send_message", rename_all = "camelCase")]
    SendMessage {
        #[serde(deserialize_with = "flexible_id")]
        to_user_id: UserId,
        message: String,
    },

    #[serde(rename = "get_chat_list")]
    GetChatList,

    #[serde(rename = "get_single_chat", rename_all = "camelCase")]
    GetSingleChat {
        #[serde(deserialize_with = "flexible_id")]
        friend_id: UserId,
    },

    #[serde(rename = "get_friend_data", rename_all = "camelCase")]
    GetFriendData {
        #[serde(deserialize_with = "flexible_id")]
        friend_id: UserId,
    },

    #[serde(rename = "get_all_users")]
    GetAllUsers,

    #[serde(rename = "save_new_contact")]
    SaveNewContact { user: ContactCard },

    #[serde(rename = "set_user_profile")]
    SetUserProfile,

    #[serde(rename = "delete_message", rename_all = "camelCase")]
    DeleteMessage {
        #[serde(deserialize_with = "flexible_id")]
        chat_id: MessageId,
    },
}

impl ClientCommand {
    /// Decode a raw text frame.
    ///
    /// Distinguishes frames that are not JSON, frames without a string `type`,
    /// frames with a `type` nobody handles, and known types with missing or
    /// mistyped fields, so the caller can log each case precisely.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

        let kind = match value.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            _ => return Err(DecodeError::MissingType),
        };

        if !KNOWN_COMMANDS.contains(&kind.as_str()) {
            return Err(DecodeError::UnknownType(kind));
        }

        serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
            kind,
            reason: e.to_string(),
        })
    }

    /// The wire `type` of this command.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientCommand::Ping => "PING",
            ClientCommand::SendChat { .. } => "send_chat",
            ClientCommand::SendMessage { .. } => "send_message",
            ClientCommand::GetChatList => "get_chat_list",
            ClientCommand::GetSingleChat { .. } => "get_single_chat",
            ClientCommand::GetFriendData { .. } => "get_friend_data",
            ClientCommand::GetAllUsers => "get_all_users",
            ClientCommand::SaveNewContact { .. } => "save_new_contact",
            ClientCommand::SetUserProfile => "set_user_profile",
            ClientCommand::DeleteMessage { .. } => "delete_message",
        }
    }
}

/// Outcome of a `save_new_contact` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub response_status: bool,
    pub message: String,
}

/// Outcome of a `delete_message` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNotice {
    pub chat_id: MessageId,
    pub deleted: bool,
    pub message: String,
}

/// Structured failure for a request that named a missing user or message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFound {
    /// The inbound `type` that failed.
    pub request: String,
    pub id: i64,
    pub message: String,
}

impl NotFound {
    pub fn new(request: &str, id: i64) -> Self {
        Self {
            request: request.to_string(),
            id,
            message: "not found".to_string(),
        }
    }
}

/// An outbound envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEnvelope {
    #[serde(rename = "PONG")]
    Pong,
    /// A message persisted through the `send_chat` path.
    Chat(MessageView),
    /// A message persisted through the `send_message` path.
    NewMessage(MessageView),
    /// The recipient's full conversation-summary list.
    FriendList(Vec<ConversationSummary>),
    /// Full history with one friend, newest first.
    SingleChat(Vec<MessageView>),
    FriendData(FriendProfile),
    AllUsers(Vec<RosterEntry>),
    NewContactResponseText(ContactResponse),
    UserProfile(OwnProfile),
    DeleteMessage(DeleteNotice),
    NotFound(NotFound),
}

impl ServerEnvelope {
    /// The wire `type` of this envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEnvelope::Pong => "PONG",
            ServerEnvelope::Chat(_) => "chat",
            ServerEnvelope::NewMessage(_) => "new_message",
            ServerEnvelope::FriendList(_) => "friend_list",
            ServerEnvelope::SingleChat(_) => "single_chat",
            ServerEnvelope::FriendData(_) => "friend_data",
            ServerEnvelope::AllUsers(_) => "all_users",
            ServerEnvelope::NewContactResponseText(_) => "new_contact_response_text",
            ServerEnvelope::UserProfile(_) => "user_profile",
            ServerEnvelope::DeleteMessage(_) => "delete_message",
            ServerEnvelope::NotFound(_) => "not_found",
        }
    }

    /// Serialize to the JSON text sent over the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Accepts an integer id encoded as a JSON integer, an integral float, or a
/// numeric string.
fn flexible_id<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<i64>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Int(id) => Ok(T::from(id)),
        RawId::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
            Ok(T::from(f as i64))
        }
        RawId::Float(f) => Err(de::Error::custom(format!("id is not an integer: {f}"))),
        RawId::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(T::from)
            .map_err(|e| de::Error::custom(format!("invalid id '{s}': {e}"))),
    }
}
