//! RelationRepository trait definition.

use chatify_types::error::RepositoryError;
use chatify_types::relation::{FriendRelation, NewRelation};
use chatify_types::status::RelationStatus;
use chatify_types::user::UserId;

/// Repository trait for directed friend-relation edges.
pub trait RelationRepository: Send + Sync {
    /// List `owner`'s outgoing edges in the given status, in insertion order.
    fn find_relations(
        &self,
        owner: UserId,
        status: RelationStatus,
    ) -> impl std::future::Future<Output = Result<Vec<FriendRelation>, RepositoryError>> + Send;

    /// Get the edge `owner -> friend`, whatever its status.
    fn find_relation(
        &self,
        owner: UserId,
        friend: UserId,
    ) -> impl std::future::Future<Output = Result<Option<FriendRelation>, RepositoryError>> + Send;

    /// Create an edge.
    ///
    /// Returns `RepositoryError::Conflict` if `owner -> friend` already exists.
    fn save_relation(
        &self,
        relation: &NewRelation,
    ) -> impl std::future::Future<Output = Result<FriendRelation, RepositoryError>> + Send;

    /// Replace the owner-local display name of an edge.
    fn update_display_name(
        &self,
        relation_id: i64,
        display_name: Option<&str>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
