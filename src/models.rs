use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sponsorship opportunity, as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub audience_size: u32,
    pub packages: Vec<String>,
    pub benefits: Vec<String>,
    pub tags: Vec<String>,
    pub location: String,
    pub poster: String,
    pub organiser: Organiser,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Organiser {
    pub name: String,
    pub college: String,
    pub verified: bool,
}

/// Raw `events` row. Optional columns are defaulted by the catalog mapper.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: String,
    pub owner_id: Option<String>,
    pub title: String,
    pub description: String,
    pub date: Option<DateTime<Utc>>,
    pub audience_size: Option<i64>,
    pub packages: String,
    pub benefits: String,
    pub tags: String,
    pub location: String,
    pub poster: Option<String>,
    pub organiser_name: String,
    pub organiser_college: String,
    pub organiser_verified: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub audience_size: u32,
    pub packages: Vec<String>,
    pub benefits: Vec<String>,
    pub tags: Vec<String>,
    pub location: String,
    pub poster: Option<String>,
    pub organiser_name: String,
    pub organiser_college: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Sponsor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Sponsor => "sponsor",
        }
    }
}

/// Profile draft kept in the local store. Missing fields fall back to
/// their defaults so older drafts keep loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub org: String,
    pub location: String,
    pub linkedin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InterestRequest {
    pub id: String,
    pub event_id: String,
    pub event_title: String,
    pub sender_id: String,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}
