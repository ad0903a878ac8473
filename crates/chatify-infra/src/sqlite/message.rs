//! SQLite `MessageRepository` implementation.

use chatify_core::repository::MessageRepository;
use chatify_types::error::RepositoryError;
use chatify_types::message::{Message, MessageId, NewMessage};
use chatify_types::status::MessageStatus;
use chatify_types::user::UserId;
use chrono::SubsecRound;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::{SqliteChatStore, format_datetime, now, parse_datetime, query_error};

/// Ids bound per `UPDATE`, well under SQLite's host-parameter limit.
const IDS_PER_STATEMENT: usize = 500;

struct MessageRow {
    id: i64,
    from_id: i64,
    to_id: i64,
    body: String,
    files: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            from_id: row.try_get("from_id")?,
            to_id: row.try_get("to_id")?,
            body: row.try_get("body")?,
            files: row.try_get("files")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let status: MessageStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Message {
            id: MessageId(self.id),
            from_id: UserId(self.from_id),
            to_id: UserId(self.to_id),
            body: self.body,
            files: self.files,
            status,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn map_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Message>, RepositoryError> {
    rows.iter()
        .map(|row| {
            MessageRow::from_row(row)
                .map_err(query_error)?
                .into_message()
        })
        .collect()
}

impl MessageRepository for SqliteChatStore {
    async fn save_message(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        let created_at = message.created_at.trunc_subsecs(6);
        let stamp = format_datetime(&created_at);

        let result = sqlx::query(
            "INSERT INTO messages (from_id, to_id, body, files, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(message.from_id.0)
        .bind(message.to_id.0)
        .bind(&message.body)
        .bind(&message.files)
        .bind(message.status.to_string())
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(Message {
            id: MessageId(result.last_insert_rowid()),
            from_id: message.from_id,
            to_id: message.to_id,
            body: message.body.clone(),
            files: message.files.clone(),
            status: message.status,
            created_at,
            updated_at: created_at,
        })
    }

    async fn find_message(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(
                MessageRow::from_row(&row)
                    .map_err(query_error)?
                    .into_message()?,
            )),
            None => Ok(None),
        }
    }

    async fn find_conversation(&self, a: UserId, b: UserId) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages
             WHERE (from_id = ? AND to_id = ?) OR (from_id = ? AND to_id = ?)
             ORDER BY created_at DESC, id DESC",
        )
        .bind(a.0)
        .bind(b.0)
        .bind(b.0)
        .bind(a.0)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        map_messages(&rows)
    }

    async fn find_by_status(
        &self,
        from: UserId,
        to: UserId,
        status: MessageStatus,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages
             WHERE from_id = ? AND to_id = ? AND status = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(from.0)
        .bind(to.0)
        .bind(status.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        map_messages(&rows)
    }

    async fn advance_status(
        &self,
        ids: &[MessageId],
        from: MessageStatus,
        to: MessageStatus,
    ) -> Result<u64, RepositoryError> {
        if !from.can_advance_to(to) {
            return Err(RepositoryError::Conflict(format!(
                "status cannot move from {from} to {to}"
            )));
        }
        if ids.is_empty() {
            return Ok(0);
        }

        let to_status = to.to_string();
        let from_status = from.to_string();
        let updated_at = format_datetime(&now());

        // One transaction across batches, so a large backlog advances all or nothing.
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        let mut changed = 0;
        for batch in ids.chunks(IDS_PER_STATEMENT) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("UPDATE messages SET status = ");
            builder
                .push_bind(&to_status)
                .push(", updated_at = ")
                .push_bind(&updated_at)
                .push(" WHERE status = ")
                .push_bind(&from_status)
                .push(" AND id IN (");
            let mut separated = builder.separated(", ");
            for id in batch {
                separated.push_bind(id.0);
            }
            separated.push_unseparated(")");

            changed += builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(query_error)?
                .rows_affected();
        }
        tx.commit().await.map_err(query_error)?;

        Ok(changed)
    }

    async fn delete_message(&self, id: MessageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}
