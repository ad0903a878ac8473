//! Repository trait definitions (ports).
//!
//! These traits define the persistence gateway that the infrastructure layer
//! (chatify-infra) implements. Every call is its own transaction boundary;
//! the core crate never depends on any specific storage technology.

pub mod message;
pub mod relation;
pub mod user;

pub use message::MessageRepository;
pub use relation::RelationRepository;
pub use user::UserRepository;

/// The full persistence gateway the chat core consumes.
///
/// Blanket-implemented for any type providing all three repositories, so a
/// single store struct (SQLite in production, in-memory in tests) can back
/// every service.
pub trait ChatStore: UserRepository + RelationRepository + MessageRepository {}

impl<T> ChatStore for T where T: UserRepository + RelationRepository + MessageRepository {}
