use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::is_overdue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: Uuid,
    pub event_id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub completed: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TodoDraft {
    pub title: String,
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial update. `deadline: Some(None)` clears the deadline.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub deadline: Option<Option<DateTime<Utc>>>,
}

/// A todo as returned to clients, with the derived overdue flag.
#[derive(Debug, Clone, Serialize)]
pub struct TodoView {
    #[serde(flatten)]
    pub todo: TodoItem,
    pub overdue: bool,
}

impl TodoItem {
    pub fn create(
        owner_id: impl Into<String>,
        event_id: Uuid,
        draft: TodoDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            owner_id: owner_id.into(),
            title: draft.title.trim().to_string(),
            completed: false,
            deadline: draft.deadline,
            created_at: now,
        }
    }

    pub fn apply_patch(&mut self, patch: TodoPatch) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
    }

    /// Past its deadline and still open.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && is_overdue(self.deadline, now)
    }

    pub fn view(self, now: DateTime<Utc>) -> TodoView {
        let overdue = self.is_overdue(now);
        TodoView {
            todo: self,
            overdue,
        }
    }
}
