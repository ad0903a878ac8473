//! Routes decoded client commands to the services that handle them.
//!
//! One inbound frame is handled at a time per connection, in arrival order.
//! Nothing that goes wrong while handling a frame is allowed to reach the
//! transport: decode failures, rejected commands, and storage errors are all
//! logged here and the connection keeps serving.

use std::sync::Arc;

use chatify_types::envelope::{ClientCommand, NotFound, ServerEnvelope};
use chatify_types::error::{DecodeError, DispatchError};
use chatify_types::user::UserId;
use tracing::{debug, error, warn};

use crate::avatar::AvatarResolver;
use crate::contacts::ContactService;
use crate::delivery::{DeliveryEngine, DeliveryError, DeliveryPath};
use crate::repository::ChatStore;
use crate::session::ConnectionRegistry;
use crate::summary::SummaryAggregator;

pub struct Dispatcher<S: ChatStore, A: AvatarResolver> {
    registry: Arc<ConnectionRegistry>,
    delivery: Arc<DeliveryEngine<S, A>>,
    summaries: Arc<SummaryAggregator<S, A>>,
    contacts: ContactService<S, A>,
}

impl<S: ChatStore, A: AvatarResolver> Dispatcher<S, A> {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        delivery: Arc<DeliveryEngine<S, A>>,
        summaries: Arc<SummaryAggregator<S, A>>,
        contacts: ContactService<S, A>,
    ) -> Self {
        Self {
            registry,
            delivery,
            summaries,
            contacts,
        }
    }

    /// Decode and handle one raw text frame from `user_id`.
    pub async fn handle_text(&self, user_id: UserId, text: &str) {
        let (kind, result) = match ClientCommand::decode(text) {
            Ok(command) => (command.kind(), self.dispatch(user_id, command).await),
            Err(err) => ("", Err(err.into())),
        };
        let Err(err) = result else {
            return;
        };

        match &err {
            DispatchError::Decode(DecodeError::UnknownType(unknown)) => {
                warn!(%user_id, kind = %unknown, "Ignoring unknown envelope type")
            }
            // Frame bodies carry message text, so only the length is logged.
            DispatchError::Decode(err) => {
                warn!(%user_id, len = text.len(), error = %err, "Malformed envelope")
            }
            DispatchError::Repository(_) => {
                error!(%user_id, kind, error = %err, "Envelope handling failed")
            }
            DispatchError::Rejected { .. } => {
                warn!(%user_id, kind, error = %err, "Envelope rejected")
            }
        }
    }

    /// Handle one decoded command on behalf of `user_id`.
    pub async fn dispatch(
        &self,
        user_id: UserId,
        command: ClientCommand,
    ) -> Result<(), DispatchError> {
        let kind = command.kind();
        debug!(%user_id, kind, "Dispatching envelope");

        match command {
            ClientCommand::Ping => {
                self.registry.send(user_id, ServerEnvelope::Pong);
            }

            ClientCommand::SendChat {
                from_id,
                to_id,
                message,
                files,
            } => {
                if from_id != user_id {
                    return Err(DispatchError::Rejected {
                        kind,
                        reason: format!("fromId {from_id} does not match connected user"),
                    });
                }
                let result = self
                    .delivery
                    .deliver(from_id, to_id, message, files, DeliveryPath::Chat)
                    .await;
                self.settle(user_id, kind, result.map(|_| ()))?;
            }

            ClientCommand::SendMessage {
                to_user_id,
                message,
            } => {
                let result = self
                    .delivery
                    .deliver(user_id, to_user_id, message, None, DeliveryPath::Message)
                    .await;
                self.settle(user_id, kind, result.map(|_| ()))?;
            }

            ClientCommand::GetChatList => {
                let envelope = self.summaries.envelope_for(user_id).await?;
                self.registry.send(user_id, envelope);
            }

            ClientCommand::GetSingleChat { friend_id } => {
                match self.delivery.open_conversation(user_id, friend_id).await {
                    Ok(history) => {
                        self.registry.send(user_id, ServerEnvelope::SingleChat(history));
                        // Unread counts just changed.
                        self.delivery.push_summaries(user_id).await;
                    }
                    Err(err) => self.settle(user_id, kind, Err(err))?,
                }
            }

            ClientCommand::GetFriendData { friend_id } => {
                let envelope = match self.contacts.friend_profile(friend_id).await? {
                    Some(profile) => ServerEnvelope::FriendData(profile),
                    None => not_found(kind, friend_id),
                };
                self.registry.send(user_id, envelope);
            }

            ClientCommand::GetAllUsers => {
                let roster = self.contacts.roster(user_id).await?;
                self.registry.send(user_id, ServerEnvelope::AllUsers(roster));
            }

            ClientCommand::SaveNewContact { user } => {
                let response = self.contacts.save_contact(user_id, &user).await?;
                let roster = self.contacts.roster(user_id).await?;
                self.registry
                    .send(user_id, ServerEnvelope::NewContactResponseText(response));
                self.registry.send(user_id, ServerEnvelope::AllUsers(roster));
            }

            ClientCommand::SetUserProfile => {
                let envelope = match self.contacts.own_profile(user_id).await? {
                    Some(profile) => ServerEnvelope::UserProfile(profile),
                    None => not_found(kind, user_id),
                };
                self.registry.send(user_id, envelope);
            }

            ClientCommand::DeleteMessage { chat_id } => {
                let notice = self.delivery.delete(user_id, chat_id).await?;
                self.registry
                    .send(user_id, ServerEnvelope::DeleteMessage(notice));
            }
        }

        Ok(())
    }

    /// Turn a delivery outcome into either a caller-visible `not_found` or
    /// a dispatch error.
    fn settle(
        &self,
        user_id: UserId,
        kind: &'static str,
        result: Result<(), DeliveryError>,
    ) -> Result<(), DispatchError> {
        match result {
            Ok(()) => Ok(()),
            Err(DeliveryError::UnknownUser(missing)) => {
                self.registry.send(user_id, not_found(kind, missing));
                Ok(())
            }
            Err(DeliveryError::SelfMessage) => Err(DispatchError::Rejected {
                kind,
                reason: DeliveryError::SelfMessage.to_string(),
            }),
            Err(DeliveryError::Repository(err)) => Err(err.into()),
        }
    }
}

fn not_found(kind: &str, id: UserId) -> ServerEnvelope {
    ServerEnvelope::NotFound(NotFound::new(kind, id.0))
}
