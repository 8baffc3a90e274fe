use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{normalize_optional, UnknownVariant};
use crate::status::{derive_status, ensure_window, StatusError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hackathon,
    Event,
    Webinar,
    Government,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Hackathon,
        Category::Event,
        Category::Webinar,
        Category::Government,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hackathon => "hackathon",
            Category::Event => "event",
            Category::Webinar => "webinar",
            Category::Government => "government",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("category", s))
    }
}

/// Lifecycle label derived from an event's window and the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Upcoming,
    Live,
    Ongoing,
    Ended,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Upcoming, Status::Live, Status::Ongoing, Status::Ended];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Upcoming => "upcoming",
            Status::Live => "live",
            Status::Ongoing => "ongoing",
            Status::Ended => "ended",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("status", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub owner_id: String,
    pub category: Category,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub external_link: Option<String>,
    pub topics: Vec<String>,
    pub notes: Option<String>,
    /// Stamped at creation and recomputed on every read; stored copies may be stale.
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new event.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub category: Category,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub external_link: Option<String>,
    pub topics: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub category: Option<Category>,
    pub name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub external_link: Option<String>,
    pub topics: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl Event {
    /// Builds a new event owned by `owner_id`, stamping `created_at` and the initial status at `now`.
    pub fn create(
        owner_id: impl Into<String>,
        draft: EventDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, StatusError> {
        ensure_window(draft.start_date, draft.end_date)?;

        Ok(Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            category: draft.category,
            name: draft.name.trim().to_string(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            external_link: normalize_optional(draft.external_link),
            topics: normalize_topics(draft.topics),
            notes: normalize_optional(draft.notes),
            status: derive_status(draft.start_date, draft.end_date, now),
            created_at: now,
        })
    }

    /// Applies a partial update and re-stamps the status.
    ///
    /// The window is checked against the merged values, so moving only one
    /// end of the range past the other is rejected and `self` is left unchanged.
    pub fn apply_patch(&mut self, patch: EventPatch, now: DateTime<Utc>) -> Result<(), StatusError> {
        let start_date = patch.start_date.unwrap_or(self.start_date);
        let end_date = patch.end_date.unwrap_or(self.end_date);
        ensure_window(start_date, end_date)?;

        self.start_date = start_date;
        self.end_date = end_date;
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(link) = patch.external_link {
            self.external_link = normalize_optional(Some(link));
        }
        if let Some(topics) = patch.topics {
            self.topics = normalize_topics(topics);
        }
        if let Some(notes) = patch.notes {
            self.notes = normalize_optional(Some(notes));
        }
        self.status = derive_status(self.start_date, self.end_date, now);
        Ok(())
    }
}

/// Trims topics, drops blanks and repeated entries, keeping first-seen order.
pub fn normalize_topics(topics: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(topics.len());
    for topic in topics {
        let trimmed = topic.trim();
        if !trimmed.is_empty() && !seen.iter().any(|t: &String| t == trimmed) {
            seen.push(trimmed.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn draft() -> EventDraft {
        EventDraft {
            category: Category::Hackathon,
            name: "  ETHGlobal  ".to_string(),
            start_date: at(5),
            end_date: at(7),
            external_link: Some(String::new()),
            topics: vec![
                "web3".to_string(),
                " ".to_string(),
                "defi".to_string(),
                "web3".to_string(),
            ],
            notes: None,
        }
    }

    #[test]
    fn test_create_stamps_status_and_normalizes() {
        let event = Event::create("user-1", draft(), at(1)).unwrap();
        assert_eq!(event.owner_id, "user-1");
        assert_eq!(event.name, "ETHGlobal");
        assert_eq!(event.topics, vec!["web3", "defi"]);
        assert_eq!(event.external_link, None);
        assert_eq!(event.status, Status::Upcoming);
        assert_eq!(event.created_at, at(1));
    }

    #[test]
    fn test_create_rejects_inverted_window() {
        let mut input = draft();
        input.end_date = at(1);
        let err = Event::create("user-1", input, at(1)).unwrap_err();
        assert!(matches!(err, StatusError::InvertedRange { .. }));
    }

    #[test]
    fn test_patch_restamps_status() {
        let mut event = Event::create("user-1", draft(), at(1)).unwrap();
        let patch = EventPatch {
            start_date: Some(at(1)),
            notes: Some("bring laptop".to_string()),
            ..Default::default()
        };
        event.apply_patch(patch, at(2)).unwrap();
        assert_eq!(event.status, Status::Live);
        assert_eq!(event.notes.as_deref(), Some("bring laptop"));
    }

    #[test]
    fn test_patch_rejects_merged_inverted_window() {
        let mut event = Event::create("user-1", draft(), at(1)).unwrap();
        let before = event.clone();
        let patch = EventPatch {
            end_date: Some(at(5) - Duration::hours(1)),
            name: Some("renamed".to_string()),
            ..Default::default()
        };
        assert!(event.apply_patch(patch, at(2)).is_err());
        assert_eq!(event, before);
    }

    #[test]
    fn test_enum_round_trip_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        for status in Status::ALL {
            assert_eq!(status.to_string().parse::<Status>().unwrap(), status);
        }
        assert!("conference".parse::<Category>().is_err());
    }
}
