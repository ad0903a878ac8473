//! Infrastructure layer for Chatify.
//!
//! Contains implementations of the ports defined in `chatify-core`: the
//! SQLite persistence gateway, the HTTP avatar resolver, and the
//! `config.toml` loader.

pub mod avatar;
pub mod config;
pub mod sqlite;
