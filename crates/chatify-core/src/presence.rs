//! Online/offline transitions and the reconnect flush.
//!
//! Presence is driven entirely by the connection lifecycle: open marks the
//! user ONLINE and flushes queued messages, close (or a transport error)
//! marks them OFFLINE. Persistence failures in either direction are logged
//! and swallowed; a stale flag is corrected by the next transition.

use std::sync::Arc;

use chatify_types::error::RepositoryError;
use chatify_types::status::{MessageStatus, PresenceStatus, RelationStatus};
use chatify_types::user::UserId;
use tracing::{debug, error, info};

use crate::repository::ChatStore;

/// Persists presence and advances SENT messages to DELIVERED on reconnect.
pub struct PresenceManager<S: ChatStore> {
    store: Arc<S>,
}

impl<S: ChatStore> PresenceManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Connection opened: mark ONLINE, then flush.
    ///
    /// Never fails; errors are logged.
    pub async fn connection_opened(&self, user_id: UserId) {
        if let Err(err) = self.store.set_presence(user_id, PresenceStatus::Online).await {
            error!(%user_id, error = %err, "Failed to mark user online");
            return;
        }
        info!(%user_id, "User online");

        match self.flush_pending(user_id).await {
            Ok(0) => {}
            Ok(flushed) => info!(%user_id, flushed, "Flushed queued messages"),
            Err(err) => error!(%user_id, error = %err, "Presence flush failed"),
        }
    }

    /// Connection closed or errored: mark OFFLINE. No flush.
    pub async fn connection_closed(&self, user_id: UserId) {
        match self.store.set_presence(user_id, PresenceStatus::Offline).await {
            Ok(()) => info!(%user_id, "User offline"),
            Err(err) => error!(%user_id, error = %err, "Failed to mark user offline"),
        }
    }

    /// Advance every SENT message addressed to `user_id` from each of their
    /// active contacts to DELIVERED. Returns the number of messages advanced.
    ///
    /// Only runs while the user's persisted status is ONLINE, so a close that
    /// lands between the open and the flush leaves messages SENT for the next
    /// reconnect. Emits no pushes: readers pick the new status up lazily.
    pub async fn flush_pending(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if user.status != PresenceStatus::Online {
            debug!(%user_id, "Skipping flush for offline user");
            return Ok(0);
        }

        let contacts = self
            .store
            .find_relations(user_id, RelationStatus::Active)
            .await?;

        let mut flushed = 0;
        for relation in contacts {
            let pending = self
                .store
                .find_by_status(relation.friend_id, user_id, MessageStatus::Sent)
                .await?;
            if pending.is_empty() {
                continue;
            }

            let ids: Vec<_> = pending.iter().map(|m| m.id).collect();
            flushed += self
                .store
                .advance_status(&ids, MessageStatus::Sent, MessageStatus::Delivered)
                .await?;
        }

        Ok(flushed)
    }
}
