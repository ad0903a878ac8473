//! Message persistence, status advancement, and the pushes both parties see.
//!
//! Every message starts SENT, even when the recipient is connected at send
//! time. It becomes DELIVERED only through the presence flush and READ only
//! when the recipient opens the conversation. Delivery is not idempotent:
//! calling [`DeliveryEngine::deliver`] twice stores two messages.

use std::sync::Arc;

use chatify_types::envelope::{DeleteNotice, ServerEnvelope};
use chatify_types::error::RepositoryError;
use chatify_types::message::{Message, MessageId, MessageView, NewMessage};
use chatify_types::relation::NewRelation;
use chatify_types::status::MessageStatus;
use chatify_types::user::{User, UserId, UserSummary};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::avatar::AvatarResolver;
use crate::repository::ChatStore;
use crate::session::ConnectionRegistry;
use crate::summary::SummaryAggregator;

/// Which inbound path produced a message.
///
/// The two paths differ on purpose and are kept apart: only `Message`
/// bootstraps missing relation edges, and each announces the new message
/// under its own envelope type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPath {
    /// `send_chat`: no relation bootstrap, pushed as `chat`.
    Chat,
    /// `send_message`: creates missing edges both ways, pushed as `new_message`.
    Message,
}

/// Errors from delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("user {0} not found")]
    UnknownUser(UserId),

    #[error("cannot send a message to yourself")]
    SelfMessage,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Persists messages and fans out the resulting envelopes.
pub struct DeliveryEngine<S: ChatStore, A: AvatarResolver> {
    store: Arc<S>,
    registry: Arc<ConnectionRegistry>,
    summaries: Arc<SummaryAggregator<S, A>>,
}

impl<S: ChatStore, A: AvatarResolver> DeliveryEngine<S, A> {
    pub fn new(
        store: Arc<S>,
        registry: Arc<ConnectionRegistry>,
        summaries: Arc<SummaryAggregator<S, A>>,
    ) -> Self {
        Self {
            store,
            registry,
            summaries,
        }
    }

    /// Persist a new SENT message and push it, plus refreshed summaries, to
    /// both parties.
    ///
    /// Pushes to an offline party are dropped by the registry; exactly one
    /// message push and one summary push is attempted per side. A persistence
    /// failure aborts before anything is pushed. Relation edges are written
    /// before the message, so a failed bootstrap stores no message.
    pub async fn deliver(
        &self,
        from: UserId,
        to: UserId,
        body: String,
        files: Option<String>,
        path: DeliveryPath,
    ) -> Result<Message, DeliveryError> {
        if from == to {
            return Err(DeliveryError::SelfMessage);
        }
        let sender = self.require_user(from).await?;
        let recipient = self.require_user(to).await?;

        if path == DeliveryPath::Message {
            self.ensure_relation(from, to).await?;
            self.ensure_relation(to, from).await?;
        }

        let message = self
            .store
            .save_message(&NewMessage::sent(from, to, body).with_files(files))
            .await?;

        info!(
            message_id = %message.id,
            %from,
            %to,
            ?path,
            "Message stored"
        );

        let view = view_of(&message, &sender, &recipient);
        let envelope = match path {
            DeliveryPath::Chat => ServerEnvelope::Chat(view),
            DeliveryPath::Message => ServerEnvelope::NewMessage(view),
        };
        self.registry.send(from, envelope.clone());
        self.registry.send(to, envelope);

        self.push_summaries(from).await;
        self.push_summaries(to).await;

        Ok(message)
    }

    /// Full history between `user_id` and `friend_id`, newest first, with
    /// every DELIVERED message from the friend advanced to READ.
    ///
    /// The returned views already carry the READ status. If another writer
    /// touched any of those rows in the meantime, the history is read again
    /// so the views match what was stored.
    pub async fn open_conversation(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<Vec<MessageView>, DeliveryError> {
        let user = self.require_user(user_id).await?;
        let friend = self.require_user(friend_id).await?;

        let mut history = self.store.find_conversation(user_id, friend_id).await?;

        let unread: Vec<MessageId> = history
            .iter()
            .filter(|m| {
                m.from_id == friend_id
                    && m.to_id == user_id
                    && m.status == MessageStatus::Delivered
            })
            .map(|m| m.id)
            .collect();

        if !unread.is_empty() {
            let read = self
                .store
                .advance_status(&unread, MessageStatus::Delivered, MessageStatus::Read)
                .await?;
            debug!(%user_id, %friend_id, read, "Marked messages read");

            if read == unread.len() as u64 {
                let now = Utc::now();
                for message in history.iter_mut().filter(|m| unread.contains(&m.id)) {
                    message.status = MessageStatus::Read;
                    message.updated_at = now;
                }
            } else {
                history = self.store.find_conversation(user_id, friend_id).await?;
            }
        }

        Ok(history
            .iter()
            .map(|m| {
                if m.from_id == user_id {
                    view_of(m, &user, &friend)
                } else {
                    view_of(m, &friend, &user)
                }
            })
            .collect())
    }

    /// Hard-delete a message on behalf of `requester`.
    ///
    /// Only the sender or recipient may delete; anything else, including an
    /// id that does not exist, yields a "not found" notice and no mutation.
    /// The notice goes back to the requester only.
    pub async fn delete(
        &self,
        requester: UserId,
        message_id: MessageId,
    ) -> Result<DeleteNotice, RepositoryError> {
        let not_found = DeleteNotice {
            chat_id: message_id,
            deleted: false,
            message: "Message not found".to_string(),
        };

        let Some(message) = self.store.find_message(message_id).await? else {
            return Ok(not_found);
        };

        if !message.involves(requester) {
            warn!(%requester, %message_id, "Delete refused for non-participant");
            return Ok(not_found);
        }

        if !self.store.delete_message(message_id).await? {
            return Ok(not_found);
        }

        info!(%requester, %message_id, "Message deleted");
        Ok(DeleteNotice {
            chat_id: message_id,
            deleted: true,
            message: "Message deleted".to_string(),
        })
    }

    /// Compute and push the `friend_list` envelope for one user.
    ///
    /// A failed computation is logged and nothing is pushed.
    pub async fn push_summaries(&self, user_id: UserId) {
        match self.summaries.envelope_for(user_id).await {
            Ok(envelope) => self.registry.send(user_id, envelope),
            Err(err) => error!(%user_id, error = %err, "Failed to compute summaries"),
        }
    }

    async fn require_user(&self, id: UserId) -> Result<User, DeliveryError> {
        self.store
            .find_user(id)
            .await?
            .ok_or(DeliveryError::UnknownUser(id))
    }

    async fn ensure_relation(&self, owner: UserId, friend: UserId) -> Result<(), RepositoryError> {
        if self.store.find_relation(owner, friend).await?.is_some() {
            return Ok(());
        }
        match self.store.save_relation(&NewRelation::active(owner, friend)).await {
            Ok(_) => {
                debug!(%owner, %friend, "Bootstrapped relation edge");
                Ok(())
            }
            // Another connection created the same edge first.
            Err(RepositoryError::Conflict(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

fn view_of(message: &Message, from: &User, to: &User) -> MessageView {
    MessageView::new(message, UserSummary::from(from), UserSummary::from(to))
}
