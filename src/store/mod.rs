//! Owner-scoped persistence for events and their todos.
//!
//! Every operation takes the owner id explicitly; a record that exists but
//! belongs to someone else is reported as not found.

pub mod memory;
pub mod postgres;
pub mod subscription;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use subscription::{Snapshot, SnapshotHub, Subscription};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, TodoItem};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn event_not_found(id: Uuid) -> Self {
        StoreError::NotFound { kind: "event", id }
    }

    pub fn todo_not_found(id: Uuid) -> Self {
        StoreError::NotFound { kind: "todo", id }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_event(&self, event: Event) -> StoreResult<Event>;

    async fn get_event(&self, owner_id: &str, id: Uuid) -> StoreResult<Event>;

    /// Replaces a stored event. The record must already exist for `event.owner_id`.
    async fn update_event(&self, event: Event) -> StoreResult<Event>;

    /// Deletes an event together with all of its todos; returns how many todos went with it.
    async fn delete_event(&self, owner_id: &str, id: Uuid) -> StoreResult<usize>;

    /// All of the owner's events, newest first.
    async fn list_events(&self, owner_id: &str) -> StoreResult<Vec<Event>>;

    /// Fails with not-found unless `todo.event_id` names an event of the same owner.
    async fn create_todo(&self, todo: TodoItem) -> StoreResult<TodoItem>;

    async fn get_todo(&self, owner_id: &str, id: Uuid) -> StoreResult<TodoItem>;

    async fn update_todo(&self, todo: TodoItem) -> StoreResult<TodoItem>;

    async fn delete_todo(&self, owner_id: &str, id: Uuid) -> StoreResult<()>;

    /// All of the owner's todos, newest first.
    async fn list_todos(&self, owner_id: &str) -> StoreResult<Vec<TodoItem>>;

    /// Live feed of the owner's full collection, starting with the current state.
    async fn subscribe(&self, owner_id: &str) -> StoreResult<Subscription>;
}
