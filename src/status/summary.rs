use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::derive_status;
use crate::models::{Category, Event, Status, TodoItem};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    /// Total number of events, regardless of category.
    pub all: usize,
    pub hackathon: usize,
    pub event: usize,
    pub webinar: usize,
    pub government: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Hackathon => self.hackathon,
            Category::Event => self.event,
            Category::Webinar => self.webinar,
            Category::Government => self.government,
        }
    }

    fn slot(&mut self, category: Category) -> &mut usize {
        match category {
            Category::Hackathon => &mut self.hackathon,
            Category::Event => &mut self.event,
            Category::Webinar => &mut self.webinar,
            Category::Government => &mut self.government,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub upcoming: usize,
    pub live: usize,
    pub ongoing: usize,
    pub ended: usize,
}

impl StatusCounts {
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Upcoming => self.upcoming,
            Status::Live => self.live,
            Status::Ongoing => self.ongoing,
            Status::Ended => self.ended,
        }
    }

    fn slot(&mut self, status: Status) -> &mut usize {
        match status {
            Status::Upcoming => &mut self.upcoming,
            Status::Live => &mut self.live,
            Status::Ongoing => &mut self.ongoing,
            Status::Ended => &mut self.ended,
        }
    }
}

/// Completion tally for one event's checklist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
}

pub fn count_by_category(events: &[Event]) -> CategoryCounts {
    let mut counts = CategoryCounts {
        all: events.len(),
        ..Default::default()
    };
    for event in events {
        *counts.slot(event.category) += 1;
    }
    counts
}

/// Tallies statuses as of `now`, ignoring whatever status the events carry.
pub fn count_by_status(events: &[Event], now: DateTime<Utc>) -> StatusCounts {
    let mut counts = StatusCounts {
        total: events.len(),
        ..Default::default()
    };
    for event in events {
        *counts.slot(derive_status(event.start_date, event.end_date, now)) += 1;
    }
    counts
}

pub fn todo_stats(todos: &[TodoItem], event_id: Uuid) -> TodoStats {
    todos
        .iter()
        .filter(|todo| todo.event_id == event_id)
        .fold(TodoStats::default(), |mut stats, todo| {
            stats.total += 1;
            if todo.completed {
                stats.completed += 1;
            }
            stats
        })
}
