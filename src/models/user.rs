use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile of an authenticated identity. `uid` is the owner id every record is scoped to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl User {
    pub fn apply_update(&mut self, update: ProfileUpdate) {
        if let Some(display_name) = update.display_name {
            self.display_name = display_name.trim().to_string();
        }
        if let Some(photo_url) = update.photo_url {
            self.photo_url = super::normalize_optional(Some(photo_url));
        }
    }
}
