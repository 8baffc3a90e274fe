// In-memory store for dev mode and tests.
// All data lives in one lock so an event and its todos are removed together.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{DocumentStore, Snapshot, SnapshotHub, StoreError, StoreResult, Subscription};
use crate::models::{Event, TodoItem};

#[derive(Default)]
struct Collections {
    events: HashMap<Uuid, Event>,
    todos: HashMap<Uuid, TodoItem>,
}

impl Collections {
    fn owned_event(&self, owner_id: &str, id: Uuid) -> Option<&Event> {
        self.events.get(&id).filter(|e| e.owner_id == owner_id)
    }

    fn owned_todo(&self, owner_id: &str, id: Uuid) -> Option<&TodoItem> {
        self.todos.get(&id).filter(|t| t.owner_id == owner_id)
    }

    fn events_of(&self, owner_id: &str) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .events
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        events
    }

    fn todos_of(&self, owner_id: &str) -> Vec<TodoItem> {
        let mut todos: Vec<TodoItem> = self
            .todos
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        todos
    }

    fn snapshot(&self, owner_id: &str) -> Snapshot {
        Snapshot {
            events: self.events_of(owner_id),
            todos: self.todos_of(owner_id),
        }
    }
}

/// Process-local store. Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
    hub: SnapshotHub,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, data: &Collections, owner_id: &str) {
        if self.hub.is_watched(owner_id) {
            self.hub.publish(owner_id, data.snapshot(owner_id));
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_event(&self, event: Event) -> StoreResult<Event> {
        let mut data = self.data.write();
        data.events.insert(event.id, event.clone());
        self.notify(&data, &event.owner_id);
        Ok(event)
    }

    async fn get_event(&self, owner_id: &str, id: Uuid) -> StoreResult<Event> {
        self.data
            .read()
            .owned_event(owner_id, id)
            .cloned()
            .ok_or_else(|| StoreError::event_not_found(id))
    }

    async fn update_event(&self, event: Event) -> StoreResult<Event> {
        let mut data = self.data.write();
        if data.owned_event(&event.owner_id, event.id).is_none() {
            return Err(StoreError::event_not_found(event.id));
        }
        data.events.insert(event.id, event.clone());
        self.notify(&data, &event.owner_id);
        Ok(event)
    }

    async fn delete_event(&self, owner_id: &str, id: Uuid) -> StoreResult<usize> {
        let mut data = self.data.write();
        if data.owned_event(owner_id, id).is_none() {
            return Err(StoreError::event_not_found(id));
        }
        data.events.remove(&id);

        let before = data.todos.len();
        data.todos.retain(|_, todo| todo.event_id != id);
        let removed = before - data.todos.len();

        self.notify(&data, owner_id);
        Ok(removed)
    }

    async fn list_events(&self, owner_id: &str) -> StoreResult<Vec<Event>> {
        Ok(self.data.read().events_of(owner_id))
    }

    async fn create_todo(&self, todo: TodoItem) -> StoreResult<TodoItem> {
        let mut data = self.data.write();
        if data.owned_event(&todo.owner_id, todo.event_id).is_none() {
            return Err(StoreError::event_not_found(todo.event_id));
        }
        data.todos.insert(todo.id, todo.clone());
        self.notify(&data, &todo.owner_id);
        Ok(todo)
    }

    async fn get_todo(&self, owner_id: &str, id: Uuid) -> StoreResult<TodoItem> {
        self.data
            .read()
            .owned_todo(owner_id, id)
            .cloned()
            .ok_or_else(|| StoreError::todo_not_found(id))
    }

    async fn update_todo(&self, todo: TodoItem) -> StoreResult<TodoItem> {
        let mut data = self.data.write();
        if data.owned_todo(&todo.owner_id, todo.id).is_none() {
            return Err(StoreError::todo_not_found(todo.id));
        }
        data.todos.insert(todo.id, todo.clone());
        self.notify(&data, &todo.owner_id);
        Ok(todo)
    }

    async fn delete_todo(&self, owner_id: &str, id: Uuid) -> StoreResult<()> {
        let mut data = self.data.write();
        if data.owned_todo(owner_id, id).is_none() {
            return Err(StoreError::todo_not_found(id));
        }
        data.todos.remove(&id);
        self.notify(&data, owner_id);
        Ok(())
    }

    async fn list_todos(&self, owner_id: &str) -> StoreResult<Vec<TodoItem>> {
        Ok(self.data.read().todos_of(owner_id))
    }

    async fn subscribe(&self, owner_id: &str) -> StoreResult<Subscription> {
        let data = self.data.read();
        Ok(self.hub.subscribe(owner_id, data.snapshot(owner_id)))
    }
}
