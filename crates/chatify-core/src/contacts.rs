//! Profile and roster lookups, and adding people to a roster.

use std::sync::Arc;

use chatify_types::envelope::ContactResponse;
use chatify_types::error::RepositoryError;
use chatify_types::relation::NewRelation;
use chatify_types::status::RelationStatus;
use chatify_types::user::{ContactCard, FriendProfile, OwnProfile, RosterEntry, UserId};
use tracing::{info, warn};

use crate::avatar::AvatarResolver;
use crate::repository::ChatStore;

pub const CONTACT_NOT_REGISTERED: &str = "This user not in ChatApp";
pub const CONTACT_ADDED: &str = "This user added to friend list";
pub const CONTACT_ALREADY_LISTED: &str = "This user already in friend list";
pub const CONTACT_IS_SELF: &str = "You cannot add yourself";

/// Read-mostly user data for the connected client.
pub struct ContactService<S: ChatStore, A: AvatarResolver> {
    store: Arc<S>,
    avatars: Arc<A>,
}

impl<S: ChatStore, A: AvatarResolver> ContactService<S, A> {
    pub fn new(store: Arc<S>, avatars: Arc<A>) -> Self {
        Self { store, avatars }
    }

    /// Public profile of `friend_id`, or `None` if no such user exists.
    pub async fn friend_profile(
        &self,
        friend_id: UserId,
    ) -> Result<Option<FriendProfile>, RepositoryError> {
        let Some(friend) = self.store.find_user(friend_id).await? else {
            return Ok(None);
        };
        let avatar = self.avatars.resolve_avatar_url(friend.id).await;
        Ok(Some(FriendProfile::new(&friend, avatar)))
    }

    /// Every active contact of `user_id`, in relation order.
    pub async fn roster(&self, user_id: UserId) -> Result<Vec<RosterEntry>, RepositoryError> {
        let relations = self
            .store
            .find_relations(user_id, RelationStatus::Active)
            .await?;

        let mut roster = Vec::with_capacity(relations.len());
        for relation in relations {
            let Some(friend) = self.store.find_user(relation.friend_id).await? else {
                warn!(%user_id, friend_id = %relation.friend_id, "Roster entry for missing user");
                continue;
            };
            roster.push(RosterEntry {
                id: friend.id,
                profile_image: self.avatars.resolve_avatar_url(friend.id).await,
                first_name: friend.first_name,
                last_name: friend.last_name,
                display_name: relation.display_name,
                country_code: friend.country_code,
                contact_no: friend.contact_no,
                created_at: friend.created_at,
                updated_at: friend.updated_at,
                status: friend.status,
            });
        }
        Ok(roster)
    }

    /// Add the user identified by the card's phone number to `owner`'s roster.
    ///
    /// The display name is taken from the card as the owner typed it. An
    /// existing edge keeps its status and only has its display name refreshed.
    pub async fn save_contact(
        &self,
        owner: UserId,
        card: &ContactCard,
    ) -> Result<ContactResponse, RepositoryError> {
        let Some(contact) = self
            .store
            .find_by_contact(&card.country_code, &card.contact_no)
            .await?
        else {
            return Ok(response(false, CONTACT_NOT_REGISTERED));
        };

        if contact.id == owner {
            return Ok(response(false, CONTACT_IS_SELF));
        }

        let display_name = format!("{} {}", card.first_name, card.last_name)
            .trim()
            .to_string();

        match self.store.find_relation(owner, contact.id).await? {
            Some(existing) => {
                self.store
                    .update_display_name(existing.id, Some(&display_name))
                    .await?;
                Ok(response(true, CONTACT_ALREADY_LISTED))
            }
            None => {
                self.store
                    .save_relation(
                        &NewRelation::active(owner, contact.id).with_display_name(display_name),
                    )
                    .await?;
                info!(%owner, contact = %contact.id, "Contact added");
                Ok(response(true, CONTACT_ADDED))
            }
        }
    }

    /// The caller's own profile, or `None` if the account no longer exists.
    pub async fn own_profile(&self, user_id: UserId) -> Result<Option<OwnProfile>, RepositoryError> {
        let Some(user) = self.store.find_user(user_id).await? else {
            return Ok(None);
        };
        Ok(Some(OwnProfile {
            profile_image: self.avatars.resolve_avatar_url(user.id).await,
            first_name: user.first_name,
            last_name: user.last_name,
            country_code: user.country_code,
            contact_no: user.contact_no,
        }))
    }
}

fn response(status: bool, message: &str) -> ContactResponse {
    ContactResponse {
        response_status: status,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RelationRepository;
    use crate::testing::{FixedAvatars, InMemoryStore};
    use chatify_types::status::PresenceStatus;

    fn service() -> (Arc<InMemoryStore>, ContactService<InMemoryStore, FixedAvatars>) {
        let store = Arc::new(InMemoryStore::new());
        let service = ContactService::new(Arc::clone(&store), Arc::new(FixedAvatars));
        (store, service)
    }

    fn card_for(store: &InMemoryStore, id: UserId, first: &str, last: &str) -> ContactCard {
        let user = store.user(id);
        ContactCard {
            first_name: first.to_string(),
            last_name: last.to_string(),
            country_code: user.country_code,
            contact_no: user.contact_no,
        }
    }

    #[tokio::test]
    async fn friend_profile_includes_avatar() {
        let (store, service) = service();
        let friend = store.add_user("Sunil", "Silva", PresenceStatus::Online);

        let profile = service.friend_profile(friend).await.unwrap().unwrap();
        assert_eq!(profile.first_name, "Sunil");
        assert_eq!(profile.status, PresenceStatus::Online);
        assert_eq!(profile.profile_image, format!("https://img.test/{friend}.png"));

        assert!(service.friend_profile(UserId(500)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_contact_unknown_number() {
        let (store, service) = service();
        let me = store.add_user("Me", "Self", PresenceStatus::Online);
        let card = ContactCard {
            first_name: "Ghost".to_string(),
            last_name: "User".to_string(),
            country_code: "+1".to_string(),
            contact_no: "000".to_string(),
        };

        let response = service.save_contact(me, &card).await.unwrap();
        assert!(!response.response_status);
        assert_eq!(response.message, CONTACT_NOT_REGISTERED);
        assert!(store.relations().is_empty());
    }

    #[tokio::test]
    async fn save_contact_adds_then_refreshes() {
        let (store, service) = service();
        let me = store.add_user("Me", "Self", PresenceStatus::Online);
        let friend = store.add_user("Ruwan", "Jay", PresenceStatus::Offline);

        let first = service
            .save_contact(me, &card_for(&store, friend, "Ruwan", "Work"))
            .await
            .unwrap();
        assert!(first.response_status);
        assert_eq!(first.message, CONTACT_ADDED);

        let second = service
            .save_contact(me, &card_for(&store, friend, "Ruwa", "Gym"))
            .await
            .unwrap();
        assert!(second.response_status);
        assert_eq!(second.message, CONTACT_ALREADY_LISTED);

        let edge = store.find_relation(me, friend).await.unwrap().unwrap();
        assert_eq!(edge.display_name.as_deref(), Some("Ruwa Gym"));
        assert_eq!(store.relations().len(), 1);
        // Only the owner's side is created.
        assert!(store.find_relation(friend, me).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_contact_refuses_self() {
        let (store, service) = service();
        let me = store.add_user("Me", "Self", PresenceStatus::Online);

        let response = service
            .save_contact(me, &card_for(&store, me, "Me", "Again"))
            .await
            .unwrap();
        assert!(!response.response_status);
        assert!(store.relations().is_empty());
    }

    #[tokio::test]
    async fn roster_lists_active_contacts_with_display_names() {
        let (store, service) = service();
        let me = store.add_user("Me", "Self", PresenceStatus::Online);
        let a = store.add_user("A", "One", PresenceStatus::Online);
        let b = store.add_user("B", "Two", PresenceStatus::Offline);
        store.add_relation(me, a);
        service
            .save_contact(me, &card_for(&store, b, "Bee", ""))
            .await
            .unwrap();

        let roster = service.roster(me).await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].id, a);
        assert_eq!(roster[0].display_name, None);
        assert_eq!(roster[1].id, b);
        assert_eq!(roster[1].display_name.as_deref(), Some("Bee"));
        assert_eq!(roster[1].status, PresenceStatus::Offline);
    }

    #[tokio::test]
    async fn own_profile() {
        let (store, service) = service();
        let me = store.add_user("Dilani", "K", PresenceStatus::Online);

        let profile = service.own_profile(me).await.unwrap().unwrap();
        assert_eq!(profile.first_name, "Dilani");
        assert_eq!(profile.country_code, "+94");
        assert_eq!(profile.profile_image, format!("https://img.test/{me}.png"));
    }
}
