//! SQLite storage layer.
//!
//! A single [`SqliteChatStore`] implements every repository trait from
//! `chatify-core` over a split read/write [`DatabasePool`]. Timestamps are
//! stored as fixed-width RFC 3339 text so lexical order is time order.

pub mod message;
pub mod pool;
pub mod relation;
pub mod user;

use chatify_types::error::RepositoryError;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

pub use pool::{default_database_url, DatabasePool};

/// SQLite-backed persistence gateway for the chat core.
#[derive(Clone)]
pub struct SqliteChatStore {
    pool: DatabasePool,
}

impl SqliteChatStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Current time at the precision the store keeps.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}
