//! Lifecycle entry points for one process-wide chat core.
//!
//! The transport layer owns sockets and calls into [`ChatHub`] on open,
//! on each text frame, and on close. Everything else (presence, delivery,
//! summaries, pushes) is wired up here once at startup.

use std::sync::Arc;

use chatify_types::envelope::ServerEnvelope;
use chatify_types::user::UserId;
use tracing::{debug, info};

use crate::avatar::AvatarResolver;
use crate::contacts::ContactService;
use crate::delivery::DeliveryEngine;
use crate::dispatcher::Dispatcher;
use crate::presence::PresenceManager;
use crate::repository::ChatStore;
use crate::session::{ConnectionHandle, ConnectionId, ConnectionRegistry};
use crate::summary::SummaryAggregator;

pub struct ChatHub<S: ChatStore, A: AvatarResolver> {
    registry: Arc<ConnectionRegistry>,
    presence: PresenceManager<S>,
    dispatcher: Dispatcher<S, A>,
}

impl<S: ChatStore, A: AvatarResolver> ChatHub<S, A> {
    pub fn new(store: Arc<S>, avatars: Arc<A>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let summaries = Arc::new(SummaryAggregator::new(
            Arc::clone(&store),
            Arc::clone(&avatars),
        ));
        let delivery = Arc::new(DeliveryEngine::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&summaries),
        ));
        let contacts = ContactService::new(Arc::clone(&store), avatars);

        Self {
            presence: PresenceManager::new(store),
            dispatcher: Dispatcher::new(Arc::clone(&registry), delivery, summaries, contacts),
            registry,
        }
    }

    /// Register the connection, mark the user ONLINE, and flush anything
    /// queued for them.
    ///
    /// The returned id must be handed back to [`ChatHub::connection_closed`].
    pub async fn connection_opened(
        &self,
        user_id: UserId,
        handle: Arc<dyn ConnectionHandle>,
    ) -> ConnectionId {
        let connection = self.registry.register(user_id, handle);
        info!(%user_id, %connection, "Connection opened");
        self.presence.connection_opened(user_id).await;
        connection
    }

    /// Unregister and mark OFFLINE.
    ///
    /// A close from a connection that has already been replaced by a newer
    /// one for the same user is ignored, so the user stays online.
    pub async fn connection_closed(&self, user_id: UserId, connection: ConnectionId) {
        if !self.registry.unregister(user_id, connection) {
            debug!(%user_id, %connection, "Ignoring close from replaced connection");
            return;
        }
        info!(%user_id, %connection, "Connection closed");
        self.presence.connection_closed(user_id).await;
    }

    /// Handle one inbound text frame.
    pub async fn envelope_received(&self, user_id: UserId, text: &str) {
        self.dispatcher.handle_text(user_id, text).await;
    }

    /// Best-effort push to a user's live connection.
    pub fn push(&self, user_id: UserId, envelope: ServerEnvelope) {
        self.registry.send(user_id, envelope);
    }

    /// Number of users with a registered connection.
    pub fn online_count(&self) -> usize {
        self.registry.len()
    }
}
