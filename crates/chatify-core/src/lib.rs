//! Chat core for Chatify.
//!
//! Holds the connection registry, presence tracking, message delivery,
//! summary aggregation, and the envelope dispatcher, plus the repository
//! traits ("ports") that `chatify-infra` implements. Depends only on
//! `chatify-types`, never on a database or HTTP crate.

pub mod avatar;
pub mod contacts;
pub mod delivery;
pub mod dispatcher;
pub mod hub;
pub mod presence;
pub mod repository;
pub mod session;
pub mod summary;

#[cfg(test)]
mod testing;

pub use hub::ChatHub;
