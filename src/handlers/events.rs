use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::CurrentUser;
use crate::models::{Category, Event, EventDraft, EventPatch, TodoView, UnknownVariant};
use crate::state::AppState;
use crate::status::{
    apply_status, parse_timestamp, select_and_order, todo_stats, EventQuery, TodoStats,
};
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub category: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub external_link: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Only provided fields are changed.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub category: Option<String>,
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub external_link: Option<String>,
    pub topics: Option<Vec<String>>,
    pub notes: Option<String>,
}

fn parse_category(value: &str) -> Result<Category, AppError> {
    value
        .trim()
        .parse()
        .map_err(|e: UnknownVariant| AppError::ValidationError(e.to_string()))
}

fn require_name(name: String) -> Result<String, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::ValidationError("Event name must not be empty".to_string()));
    }
    Ok(name)
}

impl CreateEventRequest {
    fn into_draft(self) -> Result<EventDraft, AppError> {
        Ok(EventDraft {
            category: parse_category(&self.category)?,
            name: require_name(self.name)?,
            start_date: parse_timestamp(&self.start_date)?,
            end_date: parse_timestamp(&self.end_date)?,
            external_link: self.external_link,
            topics: self.topics,
            notes: self.notes,
        })
    }
}

impl UpdateEventRequest {
    fn into_patch(self) -> Result<EventPatch, AppError> {
        Ok(EventPatch {
            category: self.category.as_deref().map(parse_category).transpose()?,
            name: self.name.map(require_name).transpose()?,
            start_date: self.start_date.as_deref().map(parse_timestamp).transpose()?,
            end_date: self.end_date.as_deref().map(parse_timestamp).transpose()?,
            external_link: self.external_link,
            topics: self.topics,
            notes: self.notes,
        })
    }
}

/// Dashboard card: the event plus its checklist progress.
#[derive(Debug, Serialize)]
pub struct EventCard {
    #[serde(flatten)]
    pub event: Event,
    pub todos: TodoStats,
}

#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub progress: TodoStats,
    pub todos: Vec<TodoView>,
}

#[derive(Debug, Serialize)]
struct DeletedEvent {
    id: Uuid,
    todos_deleted: usize,
}

pub async fn list_events(
    State(state): State<AppState>,
    current: CurrentUser,
    query: Result<Query<EventQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|e| AppError::ValidationError(e.body_text()))?;
    let owner = &current.user.uid;

    let events = state.store.list_events(owner).await?;
    let todos = state.store.list_todos(owner).await?;
    let now = state.clock.now();

    let cards: Vec<EventCard> = select_and_order(&events, &query, now)
        .into_iter()
        .map(|event| EventCard {
            todos: todo_stats(&todos, event.id),
            event,
        })
        .collect();

    tracing::debug!(owner = %owner, total = events.len(), selected = cards.len(), "Listed events");
    Ok(success(cards, "Events retrieved"))
}

pub async fn create_event(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<Response, AppError> {
    let draft = req.into_draft()?;
    let event = Event::create(current.user.uid, draft, state.clock.now())?;
    let event = state.store.create_event(event).await?;

    tracing::info!(event_id = %event.id, status = %event.status, "Event created");
    Ok(created(event, "Event created"))
}

pub async fn get_event(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let owner = &current.user.uid;
    let event = state.store.get_event(owner, event_id).await?;
    let todos = state.store.list_todos(owner).await?;
    let now = state.clock.now();

    let progress = todo_stats(&todos, event_id);
    let mut todos: Vec<TodoView> = todos
        .into_iter()
        .filter(|todo| todo.event_id == event_id)
        .map(|todo| todo.view(now))
        .collect();
    todos.sort_by(|a, b| a.todo.created_at.cmp(&b.todo.created_at));

    let detail = EventDetail {
        event: apply_status(&event, now),
        progress,
        todos,
    };
    Ok(success(detail, "Event retrieved"))
}

pub async fn update_event(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(event_id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Response, AppError> {
    let patch = req.into_patch()?;
    let mut event = state.store.get_event(&current.user.uid, event_id).await?;
    event.apply_patch(patch, state.clock.now())?;
    let event = state.store.update_event(event).await?;

    tracing::info!(event_id = %event.id, status = %event.status, "Event updated");
    Ok(success(event, "Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let todos_deleted = state.store.delete_event(&current.user.uid, event_id).await?;

    tracing::info!(event_id = %event_id, todos_deleted, "Event deleted");
    Ok(success(
        DeletedEvent {
            id: event_id,
            todos_deleted,
        },
        "Event deleted",
    ))
}
