use crate::error::AppError;
use crate::models::{Event, EventRow, InterestRequest, NewEvent, RequestStatus, Role};
use chrono::Utc;
use nanoid::nanoid;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

const EVENT_COLUMNS: &str = "id, owner_id, title, description, date, audience_size, packages, benefits, \
     tags, location, poster, organiser_name, organiser_college, organiser_verified";

pub async fn connect(db_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let connect_options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options)
        .await
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            owner_id TEXT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            date TIMESTAMP,
            audience_size INTEGER,
            packages TEXT NOT NULL DEFAULT '[]',
            benefits TEXT NOT NULL DEFAULT '[]',
            tags TEXT NOT NULL DEFAULT '[]',
            location TEXT NOT NULL,
            poster TEXT,
            organiser_name TEXT NOT NULL DEFAULT '',
            organiser_college TEXT NOT NULL DEFAULT '',
            organiser_verified BOOLEAN,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS bookmarks (
            user_id TEXT NOT NULL,
            event_id TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_id, event_id)
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS profiles (
            user_id TEXT PRIMARY KEY,
            role TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS interest_requests (
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL,
            sender_id TEXT NOT NULL,
            message TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (event_id) REFERENCES events (id) ON DELETE CASCADE
        );",
    )
    .execute(pool)
    .await?;
    Ok(())
}

fn encode_list(items: &[String]) -> String {
    serde_json::Value::from(items.to_vec()).to_string()
}

pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRow>, AppError> {
    sqlx::query_as(&format!(
        "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC, rowid DESC"
    ))
    .fetch_all(pool)
    .await
    .map_err(AppError::from)
}

pub async fn find_event(pool: &SqlitePool, id: &str) -> Result<Option<EventRow>, AppError> {
    sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn count_events(pool: &SqlitePool) -> Result<i64, AppError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

pub async fn create_event(pool: &SqlitePool, new: &NewEvent) -> Result<EventRow, AppError> {
    let public_id = nanoid!(10);
    let event = sqlx::query_as(&format!(
        "INSERT INTO events (id, owner_id, title, description, date, audience_size, packages, benefits, \
         tags, location, poster, organiser_name, organiser_college, organiser_verified, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?) RETURNING {EVENT_COLUMNS}"
    ))
    .bind(public_id)
    .bind(&new.owner_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.date)
    .bind(i64::from(new.audience_size))
    .bind(encode_list(&new.packages))
    .bind(encode_list(&new.benefits))
    .bind(encode_list(&new.tags))
    .bind(&new.location)
    .bind(&new.poster)
    .bind(&new.organiser_name)
    .bind(&new.organiser_college)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(event)
}

/// Inserts a fully formed event under its own id, without an owner.
pub async fn insert_seed_event(pool: &SqlitePool, event: &Event) -> Result<(), AppError> {
    sqlx::query(
        "INSERT OR IGNORE INTO events (id, owner_id, title, description, date, audience_size, packages, \
         benefits, tags, location, poster, organiser_name, organiser_college, organiser_verified, created_at) \
         VALUES (?, NULL, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&event.id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.date)
    .bind(i64::from(event.audience_size))
    .bind(encode_list(&event.packages))
    .bind(encode_list(&event.benefits))
    .bind(encode_list(&event.tags))
    .bind(&event.location)
    .bind(&event.poster)
    .bind(&event.organiser.name)
    .bind(&event.organiser.college)
    .bind(event.organiser.verified)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_bookmark_ids(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT event_id FROM bookmarks WHERE user_id = ? ORDER BY created_at, rowid",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn insert_bookmark(pool: &SqlitePool, user_id: &str, event_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO bookmarks (user_id, event_id, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(event_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_bookmark(pool: &SqlitePool, user_id: &str, event_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM bookmarks WHERE user_id = ? AND event_id = ?")
        .bind(user_id)
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn upsert_role(pool: &SqlitePool, user_id: &str, role: Role) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO profiles (user_id, role, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT (user_id) DO UPDATE SET role = ?2, updated_at = ?3",
    )
    .bind(user_id)
    .bind(role.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_role(pool: &SqlitePool, user_id: &str) -> Result<Option<Role>, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT role FROM profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.and_then(|(role,)| match role.as_str() {
        "student" => Some(Role::Student),
        "sponsor" => Some(Role::Sponsor),
        _ => None,
    }))
}

const REQUEST_SELECT: &str = "SELECT r.id, r.event_id, e.title AS event_title, r.sender_id, r.message, \
     r.status, r.created_at FROM interest_requests r JOIN events e ON e.id = r.event_id";

pub async fn create_request(
    pool: &SqlitePool,
    event_id: &str,
    sender_id: &str,
    message: &str,
) -> Result<InterestRequest, AppError> {
    let id = nanoid!(10);
    sqlx::query(
        "INSERT INTO interest_requests (id, event_id, sender_id, message, status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(event_id)
    .bind(sender_id)
    .bind(message)
    .bind(RequestStatus::Pending)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    find_request(pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("request not found".to_string()))
}

pub async fn find_request(pool: &SqlitePool, id: &str) -> Result<Option<InterestRequest>, AppError> {
    sqlx::query_as(&format!("{REQUEST_SELECT} WHERE r.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

/// Requests on events owned by `owner_id`.
pub async fn list_received_requests(pool: &SqlitePool, owner_id: &str) -> Result<Vec<InterestRequest>, AppError> {
    sqlx::query_as(&format!(
        "{REQUEST_SELECT} WHERE e.owner_id = ? ORDER BY r.created_at DESC, r.rowid DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::from)
}

pub async fn list_sent_requests(pool: &SqlitePool, sender_id: &str) -> Result<Vec<InterestRequest>, AppError> {
    sqlx::query_as(&format!(
        "{REQUEST_SELECT} WHERE r.sender_id = ? ORDER BY r.created_at DESC, r.rowid DESC"
    ))
    .bind(sender_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::from)
}

/// Moves a pending request to `status`. Returns false when the request
/// was no longer pending.
pub async fn respond_to_request(
    pool: &SqlitePool,
    id: &str,
    status: RequestStatus,
) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE interest_requests SET status = ? WHERE id = ? AND status = ?")
        .bind(status)
        .bind(id)
        .bind(RequestStatus::Pending)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = connect("sqlite::memory:", 1).await.unwrap();
    migrate(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_events;

    fn new_event(owner: &str) -> NewEvent {
        NewEvent {
            owner_id: owner.to_string(),
            title: "Robotics Expo".to_string(),
            description: "Demo day".to_string(),
            date: Utc::now(),
            audience_size: 300,
            packages: vec!["Gold".to_string()],
            benefits: vec![],
            tags: vec!["tech".to_string(), "robotics".to_string()],
            location: "Ithaca, NY".to_string(),
            poster: None,
            organiser_name: "Sam".to_string(),
            organiser_college: "Cornell".to_string(),
        }
    }

    #[tokio::test]
    async fn create_event_assigns_public_id() {
        let pool = test_pool().await;
        let row = create_event(&pool, &new_event("u1")).await.unwrap();
        assert_eq!(row.id.len(), 10);
        assert_eq!(row.tags, r#"["tech","robotics"]"#);
        assert_eq!(row.organiser_verified, None);
        assert!(find_event(&pool, &row.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn seeded_events_keep_sample_order() {
        let pool = test_pool().await;
        for event in sample_events().iter().rev() {
            insert_seed_event(&pool, event).await.unwrap();
        }
        let ids: Vec<String> = get_all_events(&pool).await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["hack-001", "cultural-101", "sports-050"]);
        assert_eq!(count_events(&pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn bookmarks_are_unique_per_user_and_event() {
        let pool = test_pool().await;
        insert_bookmark(&pool, "u1", "e1").await.unwrap();
        insert_bookmark(&pool, "u1", "e1").await.unwrap();
        insert_bookmark(&pool, "u2", "e1").await.unwrap();
        assert_eq!(list_bookmark_ids(&pool, "u1").await.unwrap(), vec!["e1"]);

        delete_bookmark(&pool, "u1", "e1").await.unwrap();
        assert!(list_bookmark_ids(&pool, "u1").await.unwrap().is_empty());
        assert_eq!(list_bookmark_ids(&pool, "u2").await.unwrap(), vec!["e1"]);
    }

    #[tokio::test]
    async fn role_upsert_overwrites() {
        let pool = test_pool().await;
        assert_eq!(get_role(&pool, "u1").await.unwrap(), None);
        upsert_role(&pool, "u1", Role::Student).await.unwrap();
        upsert_role(&pool, "u1", Role::Sponsor).await.unwrap();
        assert_eq!(get_role(&pool, "u1").await.unwrap(), Some(Role::Sponsor));
    }

    #[tokio::test]
    async fn requests_flow_between_sender_and_owner() {
        let pool = test_pool().await;
        let event = create_event(&pool, &new_event("owner")).await.unwrap();
        let request = create_request(&pool, &event.id, "sponsor", "cloud credits").await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.event_title, "Robotics Expo");

        assert_eq!(list_received_requests(&pool, "owner").await.unwrap().len(), 1);
        assert_eq!(list_sent_requests(&pool, "sponsor").await.unwrap().len(), 1);
        assert!(list_received_requests(&pool, "sponsor").await.unwrap().is_empty());

        assert!(respond_to_request(&pool, &request.id, RequestStatus::Accepted).await.unwrap());
        assert!(!respond_to_request(&pool, &request.id, RequestStatus::Declined).await.unwrap());
        let stored = find_request(&pool, &request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Accepted);
    }
}
