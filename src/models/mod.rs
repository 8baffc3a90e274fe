pub mod event;
pub mod todo;
pub mod user;

pub use event::{Category, Event, EventDraft, EventPatch, Status};
pub use todo::{TodoDraft, TodoItem, TodoPatch, TodoView};
pub use user::{ProfileUpdate, User};

use thiserror::Error;

/// A string that does not name a member of one of the closed enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Trims free text and maps blank input to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
