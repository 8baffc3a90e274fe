use chrono::{DateTime, Utc};
use feruca::Collator;
use serde::Deserialize;
use std::cmp::Ordering;

use super::apply_status;
use crate::models::{Category, Event, Status, UnknownVariant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl TryFrom<String> for StatusFilter {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "" | "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

impl StatusFilter {
    fn admits(&self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl TryFrom<String> for CategoryFilter {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "" | "all" => Ok(CategoryFilter::All),
            other => other.parse().map(CategoryFilter::Only),
        }
    }
}

impl CategoryFilter {
    fn admits(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Start date.
    #[default]
    Date,
    Name,
    /// Creation time.
    Created,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Dashboard listing parameters. Every field defaults to its non-restrictive value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventQuery {
    pub search: String,
    pub status: StatusFilter,
    pub category: CategoryFilter,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl EventQuery {
    fn matches(&self, event: &Event, needle: &str) -> bool {
        let matches_search = needle.is_empty()
            || event.name.to_lowercase().contains(needle)
            || event
                .topics
                .iter()
                .any(|topic| topic.to_lowercase().contains(needle));

        matches_search && self.status.admits(event.status) && self.category.admits(event.category)
    }

    fn compare(&self, a: &Event, b: &Event, collator: &mut Collator) -> Ordering {
        let ascending = match self.sort_by {
            SortBy::Date => a.start_date.cmp(&b.start_date),
            SortBy::Name => collator.collate(a.name.as_str(), b.name.as_str()),
            SortBy::Created => a.created_at.cmp(&b.created_at),
        };
        match self.sort_order {
            SortOrder::Asc => ascending,
            SortOrder::Desc => ascending.reverse(),
        }
    }
}

/// Stamps every event's status at `now`, keeps those matching `query`, and
/// sorts them stably. Ties keep their input order in either direction.
pub fn select_and_order(events: &[Event], query: &EventQuery, now: DateTime<Utc>) -> Vec<Event> {
    let needle = query.search.to_lowercase();

    let mut selected: Vec<Event> = events
        .iter()
        .map(|event| apply_status(event, now))
        .filter(|event| query.matches(event, &needle))
        .collect();

    // Unicode Collation Algorithm with the CLDR root tailoring: accents and
    // case only break ties, and lowercase sorts before uppercase.
    let mut collator = Collator::default();
    selected.sort_by(|a, b| query.compare(a, b, &mut collator));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::parse_timestamp;
    use uuid::Uuid;

    fn ts(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    fn event(name: &str, category: Category, start: &str, end: &str, created: &str) -> Event {
        Event {
            id: Uuid::new_v4(),
            owner_id: "user-1".to_string(),
            category,
            name: name.to_string(),
            start_date: ts(start),
            end_date: ts(end),
            external_link: None,
            topics: Vec::new(),
            notes: None,
            status: Status::Upcoming,
            created_at: ts(created),
        }
    }

    fn names(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.name.as_str()).collect()
    }

    fn sample() -> Vec<Event> {
        let mut devfest = event("DevFest", Category::Event, "2024-03-01", "2024-03-01", "2024-01-03");
        devfest.topics = vec!["Android".to_string(), "Cloud".to_string()];
        vec![
            event("Zeta Hack", Category::Hackathon, "2024-02-01", "2024-02-04", "2024-01-01"),
            devfest,
            event("Gov Summit", Category::Government, "2023-12-01", "2023-12-01", "2024-01-02"),
            event("Async Webinar", Category::Webinar, "2024-01-10T00:00:00Z", "2024-01-10T02:00:00Z", "2024-01-04"),
        ]
    }

    #[test]
    fn test_defaults_return_everything_sorted_by_start() {
        let now = ts("2024-01-10T01:00:00Z");
        let result = select_and_order(&sample(), &EventQuery::default(), now);
        assert_eq!(
            names(&result),
            vec!["Gov Summit", "Async Webinar", "Zeta Hack", "DevFest"]
        );
        let statuses: Vec<Status> = result.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![Status::Ended, Status::Live, Status::Upcoming, Status::Upcoming]
        );
    }

    #[test]
    fn test_name_sort_ascending_and_descending() {
        let events = vec![
            event("Zeta", Category::Event, "2024-01-01", "2024-01-01", "2024-01-01"),
            event("Alpha", Category::Event, "2024-01-01", "2024-01-01", "2024-01-01"),
            event("Mid", Category::Event, "2024-01-01", "2024-01-01", "2024-01-01"),
        ];
        let now = ts("2024-01-01");
        let mut query = EventQuery {
            sort_by: SortBy::Name,
            ..Default::default()
        };
        assert_eq!(names(&select_and_order(&events, &query, now)), vec!["Alpha", "Mid", "Zeta"]);

        query.sort_order = SortOrder::Desc;
        assert_eq!(names(&select_and_order(&events, &query, now)), vec!["Zeta", "Mid", "Alpha"]);
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let events = vec![
            event("beta", Category::Event, "2024-01-01", "2024-01-01", "2024-01-01"),
            event("Alpha", Category::Event, "2024-01-01", "2024-01-01", "2024-01-01"),
            event("Beta", Category::Event, "2024-01-01", "2024-01-01", "2024-01-01"),
        ];
        let query = EventQuery {
            sort_by: SortBy::Name,
            ..Default::default()
        };
        let result = select_and_order(&events, &query, ts("2024-01-01"));
        assert_eq!(names(&result), vec!["Alpha", "beta", "Beta"]);
    }

    #[test]
    fn test_name_sort_places_accented_names_alphabetically() {
        let events = vec![
            event("Zeta", Category::Event, "2024-01-01", "2024-01-01", "2024-01-01"),
            event("Éclair", Category::Event, "2024-01-01", "2024-01-01", "2024-01-01"),
            event("Alpha", Category::Event, "2024-01-01", "2024-01-01", "2024-01-01"),
            event("eclair", Category::Event, "2024-01-01", "2024-01-01", "2024-01-01"),
        ];
        let query = EventQuery {
            sort_by: SortBy::Name,
            ..Default::default()
        };
        let result = select_and_order(&events, &query, ts("2024-01-01"));
        assert_eq!(names(&result), vec!["Alpha", "eclair", "Éclair", "Zeta"]);
    }

    #[test]
    fn test_ties_keep_input_order_in_both_directions() {
        let events = vec![
            event("first", Category::Event, "2024-05-01", "2024-05-01", "2024-01-01"),
            event("second", Category::Event, "2024-05-01", "2024-05-01", "2024-01-01"),
            event("early", Category::Event, "2024-04-01", "2024-04-01", "2024-01-01"),
        ];
        let now = ts("2024-01-01");

        let asc = select_and_order(&events, &EventQuery::default(), now);
        assert_eq!(names(&asc), vec!["early", "first", "second"]);

        let desc_query = EventQuery {
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        let desc = select_and_order(&events, &desc_query, now);
        assert_eq!(names(&desc), vec!["first", "second", "early"]);
    }

    #[test]
    fn test_sort_by_created() {
        let query = EventQuery {
            sort_by: SortBy::Created,
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        let result = select_and_order(&sample(), &query, ts("2024-01-01"));
        assert_eq!(
            names(&result),
            vec!["Async Webinar", "DevFest", "Gov Summit", "Zeta Hack"]
        );
    }

    #[test]
    fn test_search_matches_name_or_topic_case_insensitively() {
        let now = ts("2024-01-01");
        let by_name = EventQuery {
            search: "HACK".to_string(),
            ..Default::default()
        };
        assert_eq!(names(&select_and_order(&sample(), &by_name, now)), vec!["Zeta Hack"]);

        let by_topic = EventQuery {
            search: "cloud".to_string(),
            ..Default::default()
        };
        assert_eq!(names(&select_and_order(&sample(), &by_topic, now)), vec!["DevFest"]);

        let none = EventQuery {
            search: "kubernetes".to_string(),
            ..Default::default()
        };
        assert!(select_and_order(&sample(), &none, now).is_empty());
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let now = ts("2024-02-02");
        let query = EventQuery {
            status: StatusFilter::Only(Status::Live),
            category: CategoryFilter::Only(Category::Hackathon),
            ..Default::default()
        };
        assert_eq!(names(&select_and_order(&sample(), &query, now)), vec!["Zeta Hack"]);

        let mismatched = EventQuery {
            status: StatusFilter::Only(Status::Live),
            category: CategoryFilter::Only(Category::Webinar),
            ..Default::default()
        };
        assert!(select_and_order(&sample(), &mismatched, now).is_empty());
    }

    #[test]
    fn test_status_filter_uses_recomputed_status() {
        // Stored status says upcoming; at `now` the single-day summit is over.
        let query = EventQuery {
            status: StatusFilter::Only(Status::Ended),
            ..Default::default()
        };
        let result = select_and_order(&sample(), &query, ts("2024-01-01"));
        assert_eq!(names(&result), vec!["Gov Summit"]);
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!(StatusFilter::try_from("all".to_string()), Ok(StatusFilter::All));
        assert_eq!(StatusFilter::try_from(String::new()), Ok(StatusFilter::All));
        assert_eq!(
            StatusFilter::try_from("ongoing".to_string()),
            Ok(StatusFilter::Only(Status::Ongoing))
        );
        assert!(StatusFilter::try_from("finished".to_string()).is_err());
        assert_eq!(
            CategoryFilter::try_from("government".to_string()),
            Ok(CategoryFilter::Only(Category::Government))
        );
    }
}
