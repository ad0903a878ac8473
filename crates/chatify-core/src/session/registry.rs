//! Process-wide map from user id to that user's single live connection.
//!
//! Built on `DashMap`, so connection tasks can register, push, and
//! unregister concurrently without a global lock. Pushes are best-effort:
//! a user with no entry, or whose transport has already closed, silently
//! drops the envelope. Nothing is queued or retried here; undelivered
//! messages are recovered by the presence flush on reconnect.

use std::fmt;
use std::sync::Arc;

use chatify_types::envelope::ServerEnvelope;
use chatify_types::error::PushError;
use chatify_types::user::UserId;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Transport-level handle used to push envelopes to one connection.
pub trait ConnectionHandle: Send + Sync {
    /// True while the underlying transport can still accept frames.
    fn is_open(&self) -> bool;

    /// Hand an envelope to the transport without waiting for it to be written.
    fn push(&self, envelope: ServerEnvelope) -> Result<(), PushError>;
}

/// The WebSocket task owns the receiving half and writes each envelope to
/// the socket; dropping it closes the handle.
impl ConnectionHandle for mpsc::UnboundedSender<ServerEnvelope> {
    fn is_open(&self) -> bool {
        !self.is_closed()
    }

    fn push(&self, envelope: ServerEnvelope) -> Result<(), PushError> {
        self.send(envelope).map_err(|_| PushError::Closed)
    }
}

/// Identifies one registration, so a stale close from a replaced connection
/// cannot evict its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Registration {
    id: ConnectionId,
    handle: Arc<dyn ConnectionHandle>,
}

/// At most one live connection per user; no multi-device support.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<UserId, Registration>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the handle for `user_id`, silently replacing any previous one.
    pub fn register(&self, user_id: UserId, handle: Arc<dyn ConnectionHandle>) -> ConnectionId {
        let id = ConnectionId::new();
        let previous = self
            .connections
            .insert(user_id, Registration { id, handle });

        if let Some(previous) = previous {
            tracing::debug!(
                %user_id,
                replaced = %previous.id,
                connection = %id,
                "Replaced existing connection"
            );
        }
        id
    }

    /// Remove the mapping for `user_id` only if it still belongs to
    /// `connection`. Returns `true` if an entry was removed.
    pub fn unregister(&self, user_id: UserId, connection: ConnectionId) -> bool {
        self.connections
            .remove_if(&user_id, |_, registration| registration.id == connection)
            .is_some()
    }

    /// Push to `user_id`, reporting why nothing was sent.
    pub fn try_send(&self, user_id: UserId, envelope: ServerEnvelope) -> Result<(), PushError> {
        // Clone the handle out so the shard lock is not held across the push.
        let handle = match self.connections.get(&user_id) {
            Some(registration) => Arc::clone(&registration.handle),
            None => return Err(PushError::NotConnected),
        };

        if !handle.is_open() {
            return Err(PushError::Closed);
        }
        handle.push(envelope)
    }

    /// Fire-and-forget push. A missing or closed connection is a no-op.
    pub fn send(&self, user_id: UserId, envelope: ServerEnvelope) {
        let kind = envelope.kind();
        if let Err(err) = self.try_send(user_id, envelope) {
            tracing::debug!(%user_id, kind, reason = %err, "Dropped push");
        }
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .finish()
    }
}
