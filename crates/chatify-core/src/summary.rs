//! Per-friend conversation previews for the chat list.

use std::collections::HashSet;
use std::sync::Arc;

use chatify_types::envelope::ServerEnvelope;
use chatify_types::error::RepositoryError;
use chatify_types::status::{MessageStatus, RelationStatus};
use chatify_types::summary::ConversationSummary;
use chatify_types::user::UserId;
use tracing::warn;

use crate::avatar::AvatarResolver;
use crate::repository::ChatStore;

/// Computes `ConversationSummary` rows on demand.
///
/// Output order is the discovery order of the user's active relations;
/// friends with no exchanged messages are left out entirely.
pub struct SummaryAggregator<S: ChatStore, A: AvatarResolver> {
    store: Arc<S>,
    avatars: Arc<A>,
}

impl<S: ChatStore, A: AvatarResolver> SummaryAggregator<S, A> {
    pub fn new(store: Arc<S>, avatars: Arc<A>) -> Self {
        Self { store, avatars }
    }

    /// One summary per active contact that `user_id` has exchanged at least
    /// one message with.
    pub async fn summaries_for(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let relations = self
            .store
            .find_relations(user_id, RelationStatus::Active)
            .await?;

        let mut seen = HashSet::new();
        let mut summaries = Vec::new();

        for relation in relations {
            if !seen.insert(relation.friend_id) {
                continue;
            }

            let Some(friend) = self.store.find_user(relation.friend_id).await? else {
                warn!(
                    %user_id,
                    friend_id = %relation.friend_id,
                    "Relation points at a missing user"
                );
                continue;
            };

            let history = self.store.find_conversation(user_id, friend.id).await?;
            let Some(latest) = history.first() else {
                continue;
            };

            let unread = history
                .iter()
                .filter(|m| {
                    m.from_id == friend.id
                        && m.to_id == user_id
                        && m.status == MessageStatus::Delivered
                })
                .count();

            let friend_name = relation
                .display_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| friend.full_name());

            summaries.push(ConversationSummary {
                friend_id: friend.id,
                friend_name,
                last_message: latest.body.clone(),
                last_time_stamp: latest.created_at,
                unread_count: u32::try_from(unread).unwrap_or(u32::MAX),
                profile_image: self.avatars.resolve_avatar_url(friend.id).await,
            });
        }

        Ok(summaries)
    }

    /// The `friend_list` envelope for `user_id`.
    pub async fn envelope_for(&self, user_id: UserId) -> Result<ServerEnvelope, RepositoryError> {
        Ok(ServerEnvelope::FriendList(self.summaries_for(user_id).await?))
    }
}
