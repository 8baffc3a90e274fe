use axum::{
    extract::State,
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        Response,
    },
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::Serialize;

use super::auth::CurrentUser;
use crate::models::{Event, TodoItem, TodoView};
use crate::state::AppState;
use crate::status::{apply_status, count_by_category, count_by_status, CategoryCounts, StatusCounts};
use crate::store::Snapshot;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct TodoSummary {
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
}

impl TodoSummary {
    fn tally(todos: &[TodoItem], now: DateTime<Utc>) -> Self {
        todos.iter().fold(Self::default(), |mut summary, todo| {
            summary.total += 1;
            if todo.completed {
                summary.completed += 1;
            }
            if todo.is_overdue(now) {
                summary.overdue += 1;
            }
            summary
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub categories: CategoryCounts,
    pub statuses: StatusCounts,
    pub todos: TodoSummary,
}

/// A store snapshot with statuses and overdue flags evaluated at one instant.
#[derive(Debug, Serialize)]
struct SnapshotView {
    events: Vec<Event>,
    todos: Vec<TodoView>,
}

impl SnapshotView {
    fn new(snapshot: &Snapshot, now: DateTime<Utc>) -> Self {
        Self {
            events: snapshot
                .events
                .iter()
                .map(|event| apply_status(event, now))
                .collect(),
            todos: snapshot
                .todos
                .iter()
                .cloned()
                .map(|todo| todo.view(now))
                .collect(),
        }
    }
}

pub async fn summary(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let owner = &current.user.uid;
    let events = state.store.list_events(owner).await?;
    let todos = state.store.list_todos(owner).await?;
    let now = state.clock.now();

    let summary = DashboardSummary {
        categories: count_by_category(&events),
        statuses: count_by_status(&events, now),
        todos: TodoSummary::tally(&todos, now),
    };
    Ok(success(summary, "Dashboard summary"))
}

/// A snapshot that cannot be encoded ends the stream instead of sending a placeholder.
fn snapshot_event(view: &SnapshotView) -> Result<SseEvent, AppError> {
    SseEvent::default()
        .event("snapshot")
        .json_data(view)
        .map_err(|e| {
            let err = AppError::InternalServerError(format!("Failed to encode snapshot: {e}"));
            tracing::error!(error = ?err, "Ending snapshot stream");
            err
        })
}

/// GET /stream - one `snapshot` event now and after every change to the caller's data.
pub async fn stream(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, AppError>>>, AppError> {
    let subscription = state.store.subscribe(&current.user.uid).await?;
    tracing::info!(uid = %current.user.uid, "Starting snapshot stream");

    let clock = state.clock.clone();
    let stream = subscription
        .into_stream()
        .map(move |snapshot| snapshot_event(&SnapshotView::new(&snapshot, clock.now())));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
