//! Shared domain and wire types for Chatify.
//!
//! Users, directed friend relations, messages, their per-domain status enums,
//! conversation summaries, and the JSON envelopes exchanged over a live chat
//! connection.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, chrono, thiserror.

pub mod config;
pub mod envelope;
pub mod error;
pub mod message;
pub mod relation;
pub mod status;
pub mod summary;
pub mod user;
