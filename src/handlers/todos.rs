use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::auth::CurrentUser;
use crate::models::{TodoDraft, TodoItem, TodoPatch, TodoView};
use crate::state::AppState;
use crate::status::parse_timestamp;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub deadline: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
    /// Absent leaves the deadline alone, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub deadline: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn require_title(title: String) -> Result<String, AppError> {
    if title.trim().is_empty() {
        return Err(AppError::ValidationError("Task title must not be empty".to_string()));
    }
    Ok(title)
}

impl CreateTodoRequest {
    fn into_draft(self) -> Result<TodoDraft, AppError> {
        Ok(TodoDraft {
            title: require_title(self.title)?,
            deadline: self.deadline.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

impl UpdateTodoRequest {
    fn into_patch(self) -> Result<TodoPatch, AppError> {
        let deadline = match self.deadline {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(Some(parse_timestamp(&raw)?)),
        };
        Ok(TodoPatch {
            title: self.title.map(require_title).transpose()?,
            completed: self.completed,
            deadline,
        })
    }
}

pub async fn list_event_todos(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let owner = &current.user.uid;
    // 404 for events the caller does not own, rather than an empty list
    state.store.get_event(owner, event_id).await?;

    let now = state.clock.now();
    let mut todos: Vec<TodoView> = state
        .store
        .list_todos(owner)
        .await?
        .into_iter()
        .filter(|todo| todo.event_id == event_id)
        .map(|todo| todo.view(now))
        .collect();
    todos.sort_by(|a, b| a.todo.created_at.cmp(&b.todo.created_at));

    Ok(success(todos, "Tasks retrieved"))
}

pub async fn create_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(event_id): Path<Uuid>,
    Json(req): Json<CreateTodoRequest>,
) -> Result<Response, AppError> {
    let draft = req.into_draft()?;
    let now = state.clock.now();
    let todo = TodoItem::create(current.user.uid, event_id, draft, now);
    let todo = state.store.create_todo(todo).await?;

    tracing::info!(todo_id = %todo.id, event_id = %event_id, "Task created");
    Ok(created(todo.view(now), "Task created"))
}

pub async fn update_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(todo_id): Path<Uuid>,
    Json(req): Json<UpdateTodoRequest>,
) -> Result<Response, AppError> {
    let patch = req.into_patch()?;
    let mut todo = state.store.get_todo(&current.user.uid, todo_id).await?;
    todo.apply_patch(patch);
    let todo = state.store.update_todo(todo).await?;

    Ok(success(todo.view(state.clock.now()), "Task updated"))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(todo_id): Path<Uuid>,
) -> Result<Response, AppError> {
    state.store.delete_todo(&current.user.uid, todo_id).await?;

    tracing::info!(todo_id = %todo_id, "Task deleted");
    Ok(empty_success("Task deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_absent_null_and_set() {
        let absent: UpdateTodoRequest = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert_eq!(absent.deadline, None);
        assert!(absent.into_patch().unwrap().deadline.is_none());

        let cleared: UpdateTodoRequest = serde_json::from_str(r#"{"deadline":null}"#).unwrap();
        assert_eq!(cleared.into_patch().unwrap().deadline, Some(None));

        let set: UpdateTodoRequest =
            serde_json::from_str(r#"{"deadline":"2024-06-01"}"#).unwrap();
        assert_eq!(
            set.into_patch().unwrap().deadline,
            Some(Some(parse_timestamp("2024-06-01").unwrap()))
        );
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let bad_deadline: UpdateTodoRequest =
            serde_json::from_str(r#"{"deadline":"next friday"}"#).unwrap();
        assert!(matches!(
            bad_deadline.into_patch(),
            Err(AppError::ValidationError(_))
        ));

        let blank = CreateTodoRequest {
            title: " ".to_string(),
            deadline: None,
        };
        assert!(matches!(blank.into_draft(), Err(AppError::ValidationError(_))));
    }
}
