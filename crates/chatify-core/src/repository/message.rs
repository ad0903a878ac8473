//! MessageRepository trait definition.

use chatify_types::error::RepositoryError;
use chatify_types::message::{Message, MessageId, NewMessage};
use chatify_types::status::MessageStatus;
use chatify_types::user::UserId;

/// Repository trait for message persistence.
///
/// There is no row-level locking: concurrent writers to the same message
/// resolve last-write-wins. `advance_status` is the only status mutation and
/// is conditional on the current status, which is what keeps transitions
/// forward-only under concurrency.
pub trait MessageRepository: Send + Sync {
    /// Persist a new message. The store assigns the id and sets `updated_at`
    /// equal to `created_at`.
    fn save_message(
        &self,
        message: &NewMessage,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Get a message by id.
    fn find_message(
        &self,
        id: MessageId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Every message exchanged between `a` and `b` in either direction,
    /// newest first (`created_at DESC, id DESC`).
    fn find_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Messages `from -> to` currently in `status`, oldest first.
    fn find_by_status(
        &self,
        from: UserId,
        to: UserId,
        status: MessageStatus,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Move the given messages from `from` to `to`, touching only rows still
    /// in `from`. Returns the number of rows changed.
    ///
    /// Returns `RepositoryError::Conflict` if `from -> to` is not a forward
    /// transition.
    fn advance_status(
        &self,
        ids: &[MessageId],
        from: MessageStatus,
        to: MessageStatus,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Permanently erase a message. Returns `false` if it did not exist.
    fn delete_message(
        &self,
        id: MessageId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
