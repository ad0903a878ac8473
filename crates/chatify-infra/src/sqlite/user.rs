//! SQLite `UserRepository` implementation.

use chatify_core::repository::UserRepository;
use chatify_types::error::RepositoryError;
use chatify_types::status::PresenceStatus;
use chatify_types::user::{NewUser, User, UserId};
use sqlx::Row;

use super::{
    SqliteChatStore, format_datetime, is_unique_violation, now, parse_datetime, query_error,
};

/// Internal row type for mapping SQLite rows to domain User.
struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    country_code: String,
    contact_no: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            country_code: row.try_get("country_code")?,
            contact_no: row.try_get("contact_no")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        let status: PresenceStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(User {
            id: UserId(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            country_code: self.country_code,
            contact_no: self.contact_no,
            status,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn map_user(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<User>, RepositoryError> {
    match row {
        Some(row) => {
            let user_row = UserRow::from_row(&row).map_err(query_error)?;
            Ok(Some(user_row.into_user()?))
        }
        None => Ok(None),
    }
}

impl UserRepository for SqliteChatStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        map_user(row)
    }

    async fn find_by_contact(
        &self,
        country_code: &str,
        contact_no: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE country_code = ? AND contact_no = ?")
            .bind(country_code)
            .bind(contact_no)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        map_user(row)
    }

    async fn set_presence(&self, id: UserId, status: PresenceStatus) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(format_datetime(&now()))
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let now = now();
        let result = sqlx::query(
            "INSERT INTO users (first_name, last_name, country_code, contact_no, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.country_code)
        .bind(&user.contact_no)
        .bind(PresenceStatus::Offline.to_string())
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(done) => Ok(User {
                id: UserId(done.last_insert_rowid()),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                country_code: user.country_code.clone(),
                contact_no: user.contact_no.clone(),
                status: PresenceStatus::Offline,
                created_at: now,
                updated_at: now,
            }),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "contact {} {} already registered",
                user.country_code, user.contact_no
            ))),
            Err(e) => Err(query_error(e)),
        }
    }
}
