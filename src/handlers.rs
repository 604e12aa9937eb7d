use crate::{
    catalog, db,
    error::AppError,
    filter::{self, FilterParams, FilterState},
    local_store::{PROFILE_KEY, device_key},
    models::{Event, InterestRequest, NewEvent, Profile, RequestStatus, Role},
    saved::{LocalSavedSet, RemoteSavedSet, SavedSet, SavedStore, ToggleOutcome},
    state::AppState,
    verify::verify,
    viewer::Viewer,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query as MultiQuery;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Saved ids for rendering "Save"/"Saved" labels. A failed bookmark read
/// only costs the labels, so it is logged and treated as empty.
async fn saved_ids(app_state: &AppState, viewer: &Viewer) -> Vec<String> {
    match SavedSet::for_viewer(&app_state.pool, &app_state.local, viewer).await {
        Ok(set) => set.ids().await,
        Err(e) => {
            tracing::warn!(error = %e, "could not load saved events");
            Vec::new()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventCard {
    #[serde(flatten)]
    event: Event,
    saved: bool,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    events: Vec<EventCard>,
    tags: Vec<String>,
}

pub async fn get_events(
    State(app_state): State<AppState>,
    viewer: Viewer,
    MultiQuery(params): MultiQuery<FilterParams>,
) -> Json<DiscoverResponse> {
    let state = FilterState::from(params);
    let events = catalog::list_events(&app_state.pool).await;
    let tags = filter::all_tags(&events);
    let saved = saved_ids(&app_state, &viewer).await;
    let events = filter::filter_events(&events, &state)
        .into_iter()
        .map(|event| {
            let saved = saved.contains(&event.id);
            EventCard { event, saved }
        })
        .collect();
    Json(DiscoverResponse { events, tags })
}

#[derive(Debug, Serialize)]
pub struct EventDetails {
    event: Event,
    saved: bool,
}

pub async fn get_event_details(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Path(public_id): Path<String>,
) -> Result<Json<EventDetails>, AppError> {
    let event = catalog::find_event(&app_state.pool, &public_id)
        .await?
        .ok_or_else(|| AppError::NotFound("event not found".to_string()))?;
    let saved = saved_ids(&app_state, &viewer).await.contains(&event.id);
    Ok(Json(EventDetails { event, saved }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventPayload {
    title: String,
    description: String,
    date: NaiveDate,
    audience_size: u32,
    location: String,
    poster: Option<String>,
    #[serde(default)]
    packages: Vec<String>,
    #[serde(default)]
    benefits: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    organiser_name: String,
    #[serde(default)]
    organiser_college: String,
}

/// Trims entries, drops blanks and keeps the first of any duplicates.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|x| x == item) {
            out.push(item.to_string());
        }
    }
    out
}

fn required(field: &str, value: String) -> Result<String, AppError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value)
}

pub async fn create_event_handler(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<CreateEventPayload>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let owner_id = viewer.require_user()?.to_string();
    if payload.audience_size < 1 {
        return Err(AppError::BadRequest("audienceSize must be at least 1".to_string()));
    }
    let new_event = NewEvent {
        owner_id,
        title: required("title", payload.title)?,
        description: required("description", payload.description)?,
        date: payload.date.and_time(NaiveTime::MIN).and_utc(),
        audience_size: payload.audience_size,
        packages: clean_list(payload.packages),
        benefits: clean_list(payload.benefits),
        tags: clean_list(payload.tags),
        location: required("location", payload.location)?,
        poster: payload.poster.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        organiser_name: payload.organiser_name.trim().to_string(),
        organiser_college: payload.organiser_college.trim().to_string(),
    };
    let row = db::create_event(&app_state.pool, &new_event).await?;
    tracing::info!(event_id = %row.id, owner_id = %new_event.owner_id, "event posted");
    Ok((StatusCode::CREATED, Json(Event::from(row))))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedResponse {
    events: Vec<Event>,
    missing_ids: Vec<String>,
}

pub async fn get_saved(
    State(app_state): State<AppState>,
    viewer: Viewer,
) -> Result<Json<SavedResponse>, AppError> {
    let set = SavedSet::for_viewer(&app_state.pool, &app_state.local, &viewer).await?;
    let ids = set.ids().await;
    let events = catalog::list_events(&app_state.pool).await;
    let (events, missing_ids) = catalog::resolve_saved(&events, &ids);
    Ok(Json(SavedResponse { events, missing_ids }))
}

pub async fn toggle_saved(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Path(event_id): Path<String>,
) -> Result<Json<ToggleOutcome>, AppError> {
    let owner = SavedSet::owner_key(&viewer);
    let _permit = app_state
        .in_flight
        .try_acquire(&owner, &event_id)
        .ok_or_else(|| AppError::Conflict("a save for this event is already in progress".to_string()))?;

    let outcome = match SavedSet::for_viewer(&app_state.pool, &app_state.local, &viewer).await {
        Ok(mut set) => set.toggle(&event_id).await,
        Err(e) => {
            tracing::warn!(%owner, event_id = %event_id, error = %e, "could not load saved events for toggle");
            ToggleOutcome::unavailable(&event_id)
        }
    };
    tracing::info!(%owner, event_id = %outcome.event_id, saved = outcome.saved, applied = outcome.notice.is_none(), "saved toggle");
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct MergeResponse {
    added: usize,
}

pub async fn merge_saved(
    State(app_state): State<AppState>,
    viewer: Viewer,
) -> Result<Json<MergeResponse>, AppError> {
    let user_id = viewer.require_user()?;
    let local = LocalSavedSet::new(app_state.local.clone(), &viewer.device);
    let mut remote = RemoteSavedSet::load(app_state.pool.clone(), user_id).await?;
    let added = remote.merge_from(&local).await?;
    Ok(Json(MergeResponse { added }))
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    profile: Profile,
    verified: bool,
}

impl From<Profile> for ProfileView {
    fn from(profile: Profile) -> Self {
        let verified = verify(&profile.email, profile.role.as_str(), &profile.org);
        ProfileView { profile, verified }
    }
}

pub async fn get_profile(State(app_state): State<AppState>, viewer: Viewer) -> Json<ProfileView> {
    let key = device_key(&viewer.device, PROFILE_KEY);
    let profile = app_state.local.get::<Profile>(&key).await.unwrap_or_default();
    Json(ProfileView::from(profile))
}

pub async fn put_profile(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Json(profile): Json<Profile>,
) -> Result<Json<ProfileView>, AppError> {
    let key = device_key(&viewer.device, PROFILE_KEY);
    app_state.local.set(&key, &profile).await?;
    Ok(Json(ProfileView::from(profile)))
}

#[derive(Deserialize)]
pub struct RolePayload {
    role: Role,
}

pub async fn set_role(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<RolePayload>,
) -> Result<StatusCode, AppError> {
    let user_id = viewer.require_user()?;
    db::upsert_role(&app_state.pool, user_id, payload.role).await?;
    tracing::info!(%user_id, role = payload.role.as_str(), "role set");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct InterestPayload {
    message: String,
}

pub async fn send_interest(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Path(public_id): Path<String>,
    Json(payload): Json<InterestPayload>,
) -> Result<(StatusCode, Json<InterestRequest>), AppError> {
    let sender_id = viewer.require_user()?;
    let message = required("message", payload.message)?;
    db::find_event(&app_state.pool, &public_id)
        .await?
        .ok_or_else(|| AppError::NotFound("event not found".to_string()))?;
    let request = db::create_request(&app_state.pool, &public_id, sender_id, &message).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Default, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Mailbox {
    #[default]
    Received,
    Sent,
}

#[derive(Deserialize)]
pub struct InboxParams {
    #[serde(rename = "box", default)]
    mailbox: Mailbox,
}

pub async fn get_inbox(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<InboxParams>,
) -> Result<Json<Vec<InterestRequest>>, AppError> {
    let user_id = viewer.require_user()?;
    let requests = match params.mailbox {
        Mailbox::Received => db::list_received_requests(&app_state.pool, user_id).await?,
        Mailbox::Sent => db::list_sent_requests(&app_state.pool, user_id).await?,
    };
    Ok(Json(requests))
}

async fn respond(
    app_state: &AppState,
    viewer: &Viewer,
    request_id: &str,
    status: RequestStatus,
) -> Result<Json<InterestRequest>, AppError> {
    let user_id = viewer.require_user()?;
    let request = db::find_request(&app_state.pool, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("request not found".to_string()))?;
    let owner = db::find_event(&app_state.pool, &request.event_id)
        .await?
        .and_then(|row| row.owner_id);
    if owner.as_deref() != Some(user_id) {
        return Err(AppError::Forbidden("only the event organiser can respond".to_string()));
    }
    if !db::respond_to_request(&app_state.pool, request_id, status).await? {
        return Err(AppError::Conflict("request was already answered".to_string()));
    }
    Ok(Json(InterestRequest { status, ..request }))
}

pub async fn accept_request(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Path(request_id): Path<String>,
) -> Result<Json<InterestRequest>, AppError> {
    respond(&app_state, &viewer, &request_id, RequestStatus::Accepted).await
}

pub async fn decline_request(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Path(request_id): Path<String>,
) -> Result<Json<InterestRequest>, AppError> {
    respond(&app_state, &viewer, &request_id, RequestStatus::Declined).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_list_trims_and_dedupes_in_order() {
        let items = vec![" Gold ".into(), "".into(), "Silver".into(), "Gold".into(), "  ".into()];
        assert_eq!(clean_list(items), vec!["Gold".to_string(), "Silver".to_string()]);
    }

    #[test]
    fn profile_view_derives_verification() {
        let profile = Profile {
            role: Role::Sponsor,
            email: "ops@technova.com".into(),
            org: "TechNova".into(),
            ..Default::default()
        };
        assert!(ProfileView::from(profile).verified);
        assert!(!ProfileView::from(Profile::default()).verified);
    }
}
