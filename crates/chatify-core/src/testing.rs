//! In-memory persistence gateway and connection helpers for core tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chatify_types::envelope::ServerEnvelope;
use chatify_types::error::RepositoryError;
use chatify_types::message::{Message, MessageId, NewMessage};
use chatify_types::relation::{FriendRelation, NewRelation};
use chatify_types::status::{MessageStatus, PresenceStatus, RelationStatus};
use chatify_types::user::{NewUser, User, UserId};
use chrono::Utc;
use tokio::sync::mpsc;

use crate::avatar::AvatarResolver;
use crate::repository::{MessageRepository, RelationRepository, UserRepository};
use crate::session::ConnectionHandle;

#[derive(Default)]
pub struct Tables {
    users: Vec<User>,
    relations: Vec<FriendRelation>,
    pub messages: Vec<Message>,
    next_user: i64,
    next_relation: i64,
    next_message: i64,
}

type TablesHook = Box<dyn FnOnce(&mut Tables) + Send>;

/// Vec-backed store with the same observable semantics as the SQLite one.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    failing_op: Mutex<Option<&'static str>>,
    before_advance: Mutex<Option<TablesHook>>,
    mutations: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a query error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make only the named repository method fail.
    pub fn fail_op(&self, op: &'static str) {
        *self.failing_op.lock().unwrap() = Some(op);
    }

    /// Run `hook` against the tables right before the next `advance_status`
    /// applies, as a concurrent writer would.
    pub fn before_next_advance(&self, hook: impl FnOnce(&mut Tables) + Send + 'static) {
        *self.before_advance.lock().unwrap() = Some(Box::new(hook));
    }

    /// Number of successful writes so far.
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Seed a user directly, returning its id.
    pub fn add_user(&self, first: &str, last: &str, status: PresenceStatus) -> UserId {
        let mut tables = self.tables.lock().unwrap();
        tables.next_user += 1;
        let id = UserId(tables.next_user);
        let now = Utc::now();
        tables.users.push(User {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            country_code: "+94".to_string(),
            contact_no: format!("7700000{:02}", id.0),
            status,
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Seed an active edge `owner -> friend`.
    pub fn add_relation(&self, owner: UserId, friend: UserId) {
        let mut tables = self.tables.lock().unwrap();
        tables.next_relation += 1;
        let id = tables.next_relation;
        tables.relations.push(FriendRelation {
            id,
            owner_id: owner,
            friend_id: friend,
            status: RelationStatus::Active,
            display_name: None,
            created_at: Utc::now(),
        });
    }

    pub fn user(&self, id: UserId) -> User {
        let tables = self.tables.lock().unwrap();
        tables.users.iter().find(|u| u.id == id).cloned().unwrap()
    }

    pub fn message(&self, id: MessageId) -> Option<Message> {
        let tables = self.tables.lock().unwrap();
        tables.messages.iter().find(|m| m.id == id).cloned()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.tables.lock().unwrap().messages.clone()
    }

    pub fn relations(&self) -> Vec<FriendRelation> {
        self.tables.lock().unwrap().relations.clone()
    }

    fn check(&self, op: &'static str) -> Result<(), RepositoryError> {
        let op_failing = *self.failing_op.lock().unwrap() == Some(op);
        if op_failing || self.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::Query("simulated failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn mutated(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

impl UserRepository for InMemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.check("find_user")?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_contact(
        &self,
        country_code: &str,
        contact_no: &str,
    ) -> Result<Option<User>, RepositoryError> {
        self.check("find_by_contact")?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|u| u.country_code == country_code && u.contact_no == contact_no)
            .cloned())
    }

    async fn set_presence(&self, id: UserId, status: PresenceStatus) -> Result<(), RepositoryError> {
        self.check("set_presence")?;
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        user.status = status;
        user.updated_at = Utc::now();
        drop(tables);
        self.mutated();
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        self.check("create_user")?;
        let mut tables = self.tables.lock().unwrap();
        if tables
            .users
            .iter()
            .any(|u| u.country_code == user.country_code && u.contact_no == user.contact_no)
        {
            return Err(RepositoryError::Conflict("contact already registered".to_string()));
        }
        tables.next_user += 1;
        let now = Utc::now();
        let created = User {
            id: UserId(tables.next_user),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            country_code: user.country_code.clone(),
            contact_no: user.contact_no.clone(),
            status: PresenceStatus::Offline,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        drop(tables);
        self.mutated();
        Ok(created)
    }
}

impl RelationRepository for InMemoryStore {
    async fn find_relations(
        &self,
        owner: UserId,
        status: RelationStatus,
    ) -> Result<Vec<FriendRelation>, RepositoryError> {
        self.check("find_relations")?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .relations
            .iter()
            .filter(|r| r.owner_id == owner && r.status == status)
            .cloned()
            .collect())
    }

    async fn find_relation(
        &self,
        owner: UserId,
        friend: UserId,
    ) -> Result<Option<FriendRelation>, RepositoryError> {
        self.check("find_relation")?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .relations
            .iter()
            .find(|r| r.owner_id == owner && r.friend_id == friend)
            .cloned())
    }

    async fn save_relation(
        &self,
        relation: &NewRelation,
    ) -> Result<FriendRelation, RepositoryError> {
        self.check("save_relation")?;
        let mut tables = self.tables.lock().unwrap();
        if tables
            .relations
            .iter()
            .any(|r| r.owner_id == relation.owner_id && r.friend_id == relation.friend_id)
        {
            return Err(RepositoryError::Conflict("relation already exists".to_string()));
        }
        tables.next_relation += 1;
        let saved = FriendRelation {
            id: tables.next_relation,
            owner_id: relation.owner_id,
            friend_id: relation.friend_id,
            status: relation.status,
            display_name: relation.display_name.clone(),
            created_at: Utc::now(),
        };
        tables.relations.push(saved.clone());
        drop(tables);
        self.mutated();
        Ok(saved)
    }

    async fn update_display_name(
        &self,
        relation_id: i64,
        display_name: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.check("update_display_name")?;
        let mut tables = self.tables.lock().unwrap();
        let relation = tables
            .relations
            .iter_mut()
            .find(|r| r.id == relation_id)
            .ok_or(RepositoryError::NotFound)?;
        relation.display_name = display_name.map(str::to_string);
        drop(tables);
        self.mutated();
        Ok(())
    }
}

impl MessageRepository for InMemoryStore {
    async fn save_message(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        self.check("save_message")?;
        let mut tables = self.tables.lock().unwrap();
        tables.next_message += 1;
        let saved = Message {
            id: MessageId(tables.next_message),
            from_id: message.from_id,
            to_id: message.to_id,
            body: message.body.clone(),
            files: message.files.clone(),
            status: message.status,
            created_at: message.created_at,
            updated_at: message.created_at,
        };
        tables.messages.push(saved.clone());
        drop(tables);
        self.mutated();
        Ok(saved)
    }

    async fn find_message(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        self.check("find_message")?;
        Ok(self.message(id))
    }

    async fn find_conversation(&self, a: UserId, b: UserId) -> Result<Vec<Message>, RepositoryError> {
        self.check("find_conversation")?;
        let tables = self.tables.lock().unwrap();
        let mut found: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect();
        found.sort_by(|x, y| y.created_at.cmp(&x.created_at).then(y.id.cmp(&x.id)));
        Ok(found)
    }

    async fn find_by_status(
        &self,
        from: UserId,
        to: UserId,
        status: MessageStatus,
    ) -> Result<Vec<Message>, RepositoryError> {
        self.check("find_by_status")?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.from_id == from && m.to_id == to && m.status == status)
            .cloned()
            .collect())
    }

    async fn advance_status(
        &self,
        ids: &[MessageId],
        from: MessageStatus,
        to: MessageStatus,
    ) -> Result<u64, RepositoryError> {
        self.check("advance_status")?;
        if !from.can_advance_to(to) {
            return Err(RepositoryError::Conflict(format!(
                "status cannot move from {from} to {to}"
            )));
        }
        let mut tables = self.tables.lock().unwrap();
        if let Some(hook) = self.before_advance.lock().unwrap().take() {
            hook(&mut tables);
        }
        let now = Utc::now();
        let mut changed = 0;
        for message in tables.messages.iter_mut() {
            if ids.contains(&message.id) && message.status == from {
                message.status = to;
                message.updated_at = now;
                changed += 1;
            }
        }
        drop(tables);
        if changed > 0 {
            self.mutated();
        }
        Ok(changed)
    }

    async fn delete_message(&self, id: MessageId) -> Result<bool, RepositoryError> {
        self.check("delete_message")?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.messages.len();
        tables.messages.retain(|m| m.id != id);
        let deleted = tables.messages.len() != before;
        drop(tables);
        if deleted {
            self.mutated();
        }
        Ok(deleted)
    }
}

/// Avatar resolver returning a fixed URL per user.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedAvatars;

impl AvatarResolver for FixedAvatars {
    async fn resolve_avatar_url(&self, user_id: UserId) -> String {
        format!("https://img.test/{user_id}.png")
    }
}

/// A connection handle plus the receiver that observes what was pushed.
pub fn connection() -> (Arc<dyn ConnectionHandle>, mpsc::UnboundedReceiver<ServerEnvelope>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(tx), rx)
}

/// Drain everything currently queued on a test connection.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEnvelope>) -> Vec<ServerEnvelope> {
    let mut out = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        out.push(envelope);
    }
    out
}

/// Count envelopes of a given wire type.
pub fn count_kind(envelopes: &[ServerEnvelope], kind: &str) -> usize {
    envelopes.iter().filter(|e| e.kind() == kind).count()
}
