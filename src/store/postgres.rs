use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use super::{DocumentStore, Snapshot, SnapshotHub, StoreError, StoreResult, Subscription};
use crate::models::{Event, TodoItem, UnknownVariant};

const EVENT_COLUMNS: &str = "id, owner_id, category, name, start_date, end_date, \
                             external_link, topics, notes, status, created_at";
const TODO_COLUMNS: &str = "id, event_id, owner_id, title, completed, deadline, created_at";

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    owner_id: String,
    category: String,
    name: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    external_link: Option<String>,
    topics: Vec<String>,
    notes: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = move |e: UnknownVariant| StoreError::Corrupt(format!("event {id}: {e}"));
        Ok(Event {
            id,
            category: row.category.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            owner_id: row.owner_id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            external_link: row.external_link,
            topics: row.topics,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TodoRow {
    id: Uuid,
    event_id: Uuid,
    owner_id: String,
    title: String,
    completed: bool,
    deadline: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<TodoRow> for TodoItem {
    fn from(row: TodoRow) -> Self {
        TodoItem {
            id: row.id,
            event_id: row.event_id,
            owner_id: row.owner_id,
            title: row.title,
            completed: row.completed,
            deadline: row.deadline,
            created_at: row.created_at,
        }
    }
}

/// Postgres-backed store. Snapshots for subscribers are re-read after each write.
pub struct PgStore {
    pool: PgPool,
    hub: SnapshotHub,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            hub: SnapshotHub::new(),
        }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        tracing::info!("Successfully connected to database");

        sqlx::migrate!().run(&pool).await?;
        tracing::info!("Migrations run successfully");

        Ok(Self::new(pool))
    }

    async fn snapshot(&self, owner_id: &str) -> StoreResult<Snapshot> {
        Ok(Snapshot {
            events: self.list_events(owner_id).await?,
            todos: self.list_todos(owner_id).await?,
        })
    }

    /// Pushes a fresh snapshot to the owner's subscribers. The write already
    /// succeeded, so a failed re-read is logged rather than returned.
    ///
    /// The owner lock spans the read and the publish, so a slower read can
    /// never overwrite a newer snapshot.
    async fn notify(&self, owner_id: &str) {
        let _lock = self.hub.lock_owner(owner_id).await;
        if !self.hub.is_watched(owner_id) {
            return;
        }
        match self.snapshot(owner_id).await {
            Ok(snapshot) => self.hub.publish(owner_id, snapshot),
            Err(e) => tracing::warn!(owner_id, error = ?e, "Failed to refresh snapshot"),
        }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn create_event(&self, event: Event) -> StoreResult<Event> {
        sqlx::query(
            "INSERT INTO events (id, owner_id, category, name, start_date, end_date, \
             external_link, topics, notes, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(event.id)
        .bind(&event.owner_id)
        .bind(event.category.as_str())
        .bind(&event.name)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.external_link)
        .bind(&event.topics)
        .bind(&event.notes)
        .bind(event.status.as_str())
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        self.notify(&event.owner_id).await;
        Ok(event)
    }

    async fn get_event(&self, owner_id: &str, id: Uuid) -> StoreResult<Event> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| StoreError::event_not_found(id))?.try_into()
    }

    async fn update_event(&self, event: Event) -> StoreResult<Event> {
        let result = sqlx::query(
            "UPDATE events SET category = $3, name = $4, start_date = $5, end_date = $6, \
             external_link = $7, topics = $8, notes = $9, status = $10 \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(event.id)
        .bind(&event.owner_id)
        .bind(event.category.as_str())
        .bind(&event.name)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.external_link)
        .bind(&event.topics)
        .bind(&event.notes)
        .bind(event.status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::event_not_found(event.id));
        }
        self.notify(&event.owner_id).await;
        Ok(event)
    }

    async fn delete_event(&self, owner_id: &str, id: Uuid) -> StoreResult<usize> {
        // Todos go first so their count is observed before the FK cascade.
        // Dropping `tx` on any early return rolls both deletes back.
        let mut tx = self.pool.begin().await?;

        let todos = sqlx::query("DELETE FROM todos WHERE event_id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM events WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::event_not_found(id));
        }

        tx.commit().await?;
        self.notify(owner_id).await;
        Ok(todos.rows_affected() as usize)
    }

    async fn list_events(&self, owner_id: &str) -> StoreResult<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE owner_id = $1 ORDER BY created_at DESC, id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Event::try_from).collect()
    }

    async fn create_todo(&self, todo: TodoItem) -> StoreResult<TodoItem> {
        let result = sqlx::query(
            "INSERT INTO todos (id, event_id, owner_id, title, completed, deadline, created_at) \
             SELECT $1, $2, $3, $4, $5, $6, $7 \
             WHERE EXISTS (SELECT 1 FROM events WHERE id = $2 AND owner_id = $3)",
        )
        .bind(todo.id)
        .bind(todo.event_id)
        .bind(&todo.owner_id)
        .bind(&todo.title)
        .bind(todo.completed)
        .bind(todo.deadline)
        .bind(todo.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::event_not_found(todo.event_id));
        }
        self.notify(&todo.owner_id).await;
        Ok(todo)
    }

    async fn get_todo(&self, owner_id: &str, id: Uuid) -> StoreResult<TodoItem> {
        let row: Option<TodoRow> = sqlx::query_as(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TodoItem::from)
            .ok_or_else(|| StoreError::todo_not_found(id))
    }

    async fn update_todo(&self, todo: TodoItem) -> StoreResult<TodoItem> {
        let result = sqlx::query(
            "UPDATE todos SET title = $3, completed = $4, deadline = $5 \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(todo.id)
        .bind(&todo.owner_id)
        .bind(&todo.title)
        .bind(todo.completed)
        .bind(todo.deadline)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::todo_not_found(todo.id));
        }
        self.notify(&todo.owner_id).await;
        Ok(todo)
    }

    async fn delete_todo(&self, owner_id: &str, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::todo_not_found(id));
        }
        self.notify(owner_id).await;
        Ok(())
    }

    async fn list_todos(&self, owner_id: &str) -> StoreResult<Vec<TodoItem>> {
        let rows: Vec<TodoRow> = sqlx::query_as(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE owner_id = $1 ORDER BY created_at DESC, id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TodoItem::from).collect())
    }

    async fn subscribe(&self, owner_id: &str) -> StoreResult<Subscription> {
        // Writes that land while the initial snapshot is read wait on the lock
        // and publish once the channel is registered.
        let _lock = self.hub.lock_owner(owner_id).await;
        if let Some(subscription) = self.hub.join(owner_id) {
            return Ok(subscription);
        }
        let current = self.snapshot(owner_id).await?;
        Ok(self.hub.subscribe(owner_id, current))
    }
}
