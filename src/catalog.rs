//! Fetch layer: reads event rows and normalizes them into [`Event`]s.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;
use crate::models::{Event, EventRow, Organiser};
use crate::sample::{DEFAULT_POSTER, sample_events};

/// Audience estimate for rows that carry none.
pub const DEFAULT_AUDIENCE_SIZE: u32 = 0;

fn decode_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            title: row.title,
            description: row.description,
            date: row.date.unwrap_or_else(Utc::now),
            audience_size: row
                .audience_size
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(DEFAULT_AUDIENCE_SIZE),
            packages: decode_list(&row.packages),
            benefits: decode_list(&row.benefits),
            tags: decode_list(&row.tags),
            location: row.location,
            poster: row
                .poster
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_POSTER.to_string()),
            organiser: Organiser {
                name: row.organiser_name,
                college: row.organiser_college,
                verified: row.organiser_verified.unwrap_or(true),
            },
        }
    }
}

/// All events, newest first. A store failure degrades to the demo dataset.
pub async fn list_events(pool: &SqlitePool) -> Vec<Event> {
    match db::get_all_events(pool).await {
        Ok(rows) => rows.into_iter().map(Event::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load events, serving demo data");
            sample_events()
        }
    }
}

pub async fn find_event(pool: &SqlitePool, id: &str) -> Result<Option<Event>, AppError> {
    Ok(db::find_event(pool, id).await?.map(Event::from))
}

/// Saved events in saved-id order, plus ids whose event no longer exists.
pub fn resolve_saved(events: &[Event], saved_ids: &[String]) -> (Vec<Event>, Vec<String>) {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for id in saved_ids {
        match events.iter().find(|e| &e.id == id) {
            Some(event) => found.push(event.clone()),
            None => missing.push(id.clone()),
        }
    }
    (found, missing)
}

pub async fn seed_if_empty(pool: &SqlitePool) -> Result<(), AppError> {
    if db::count_events(pool).await? == 0 {
        tracing::info!("events table is empty, seeding demo events");
        for event in sample_events().iter().rev() {
            db::insert_seed_event(pool, event).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_row() -> EventRow {
        EventRow {
            id: "e1".into(),
            owner_id: None,
            title: "Quiz Night".into(),
            description: "Trivia".into(),
            date: None,
            audience_size: None,
            packages: "[\"Gold\"]".into(),
            benefits: "not json".into(),
            tags: "[]".into(),
            location: "Leeds".into(),
            poster: Some("  ".into()),
            organiser_name: "Kim".into(),
            organiser_college: "Leeds Uni".into(),
            organiser_verified: None,
        }
    }

    #[test]
    fn missing_columns_get_defaults() {
        let before = Utc::now();
        let event = Event::from(bare_row());
        assert!(event.date >= before);
        assert_eq!(event.audience_size, DEFAULT_AUDIENCE_SIZE);
        assert_eq!(event.packages, vec!["Gold".to_string()]);
        assert!(event.benefits.is_empty());
        assert_eq!(event.poster, DEFAULT_POSTER);
        assert!(event.organiser.verified);
    }

    #[test]
    fn stored_audience_size_is_used() {
        let row = EventRow {
            audience_size: Some(450),
            organiser_verified: Some(false),
            ..bare_row()
        };
        let event = Event::from(row);
        assert_eq!(event.audience_size, 450);
        assert!(!event.organiser.verified);
    }

    #[tokio::test]
    async fn unreadable_store_serves_demo_events() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let events = list_events(&pool).await;
        assert_eq!(events.len(), sample_events().len());
    }

    #[tokio::test]
    async fn seeding_only_happens_once() {
        let pool = db::test_pool().await;
        seed_if_empty(&pool).await.unwrap();
        seed_if_empty(&pool).await.unwrap();
        let events = list_events(&pool).await;
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["hack-001", "cultural-101", "sports-050"]);
        assert!(find_event(&pool, "nope").await.unwrap().is_none());
    }

    #[test]
    fn saved_ids_without_events_are_reported() {
        let events = sample_events();
        let saved = vec!["sports-050".to_string(), "gone".to_string(), "hack-001".to_string()];
        let (found, missing) = resolve_saved(&events, &saved);
        let ids: Vec<&str> = found.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["sports-050", "hack-001"]);
        assert_eq!(missing, vec!["gone".to_string()]);
    }
}
