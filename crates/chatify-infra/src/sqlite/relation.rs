//! SQLite `RelationRepository` implementation.

use chatify_core::repository::RelationRepository;
use chatify_types::error::RepositoryError;
use chatify_types::relation::{FriendRelation, NewRelation};
use chatify_types::status::RelationStatus;
use chatify_types::user::UserId;
use sqlx::Row;

use super::{
    SqliteChatStore, format_datetime, is_unique_violation, now, parse_datetime, query_error,
};

struct RelationRow {
    id: i64,
    owner_id: i64,
    friend_id: i64,
    status: String,
    display_name: Option<String>,
    created_at: String,
}

impl RelationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            friend_id: row.try_get("friend_id")?,
            status: row.try_get("status")?,
            display_name: row.try_get("display_name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_relation(self) -> Result<FriendRelation, RepositoryError> {
        let status: RelationStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(FriendRelation {
            id: self.id,
            owner_id: UserId(self.owner_id),
            friend_id: UserId(self.friend_id),
            status,
            display_name: self.display_name,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl RelationRepository for SqliteChatStore {
    async fn find_relations(
        &self,
        owner: UserId,
        status: RelationStatus,
    ) -> Result<Vec<FriendRelation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM friend_relations WHERE owner_id = ? AND status = ? ORDER BY id ASC",
        )
        .bind(owner.0)
        .bind(status.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                RelationRow::from_row(row)
                    .map_err(query_error)?
                    .into_relation()
            })
            .collect()
    }

    async fn find_relation(
        &self,
        owner: UserId,
        friend: UserId,
    ) -> Result<Option<FriendRelation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM friend_relations WHERE owner_id = ? AND friend_id = ?")
            .bind(owner.0)
            .bind(friend.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(
                RelationRow::from_row(&row)
                    .map_err(query_error)?
                    .into_relation()?,
            )),
            None => Ok(None),
        }
    }

    async fn save_relation(
        &self,
        relation: &NewRelation,
    ) -> Result<FriendRelation, RepositoryError> {
        let created_at = now();
        let result = sqlx::query(
            "INSERT INTO friend_relations (owner_id, friend_id, status, display_name, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(relation.owner_id.0)
        .bind(relation.friend_id.0)
        .bind(relation.status.to_string())
        .bind(&relation.display_name)
        .bind(format_datetime(&created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(done) => Ok(FriendRelation {
                id: done.last_insert_rowid(),
                owner_id: relation.owner_id,
                friend_id: relation.friend_id,
                status: relation.status,
                display_name: relation.display_name.clone(),
                created_at,
            }),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "relation {} -> {} already exists",
                relation.owner_id, relation.friend_id
            ))),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn update_display_name(
        &self,
        relation_id: i64,
        display_name: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE friend_relations SET display_name = ? WHERE id = ?")
            .bind(display_name)
            .bind(relation_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::{seed_user, test_store};

    #[tokio::test]
    async fn test_save_and_find_relation() {
        let store = test_store().await;
        let me = seed_user(&store, "Me", "700000001").await;
        let friend = seed_user(&store, "Friend", "700000002").await;

        let saved = store
            .save_relation(&NewRelation::active(me.id, friend.id).with_display_name("Bestie"))
            .await
            .unwrap();

        let found = store.find_relation(me.id, friend.id).await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert_eq!(found.status, RelationStatus::Active);
        assert_eq!(found.display_name.as_deref(), Some("Bestie"));

        // Edges are directed.
        assert!(store.find_relation(friend.id, me.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_relation_conflicts() {
        let store = test_store().await;
        let me = seed_user(&store, "Me", "700000001").await;
        let friend = seed_user(&store, "Friend", "700000002").await;

        store
            .save_relation(&NewRelation::active(me.id, friend.id))
            .await
            .unwrap();
        let err = store
            .save_relation(&NewRelation::active(me.id, friend.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_relations_filters_status_in_insertion_order() {
        let store = test_store().await;
        let me = seed_user(&store, "Me", "700000001").await;
        let a = seed_user(&store, "A", "700000002").await;
        let b = seed_user(&store, "B", "700000003").await;
        let c = seed_user(&store, "C", "700000004").await;

        store.save_relation(&NewRelation::active(me.id, b.id)).await.unwrap();
        let mut blocked = NewRelation::active(me.id, c.id);
        blocked.status = RelationStatus::Blocked;
        store.save_relation(&blocked).await.unwrap();
        store.save_relation(&NewRelation::active(me.id, a.id)).await.unwrap();

        let active: Vec<_> = store
            .find_relations(me.id, RelationStatus::Active)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.friend_id)
            .collect();
        assert_eq!(active, vec![b.id, a.id]);

        let blocked = store
            .find_relations(me.id, RelationStatus::Blocked)
            .await
            .unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].friend_id, c.id);
    }

    #[tokio::test]
    async fn test_update_display_name() {
        let store = test_store().await;
        let me = seed_user(&store, "Me", "700000001").await;
        let friend = seed_user(&store, "Friend", "700000002").await;
        let saved = store
            .save_relation(&NewRelation::active(me.id, friend.id))
            .await
            .unwrap();

        store.update_display_name(saved.id, Some("Work")).await.unwrap();
        let found = store.find_relation(me.id, friend.id).await.unwrap().unwrap();
        assert_eq!(found.display_name.as_deref(), Some("Work"));

        store.update_display_name(saved.id, None).await.unwrap();
        let found = store.find_relation(me.id, friend.id).await.unwrap().unwrap();
        assert!(found.display_name.is_none());

        assert!(matches!(
            store.update_display_name(9_999, Some("x")).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_relation_requires_existing_users() {
        let store = test_store().await;
        let me = seed_user(&store, "Me", "700000001").await;

        let err = store
            .save_relation(&NewRelation::active(me.id, UserId(404)))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }
}
