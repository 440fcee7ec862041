use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::handlers::{load_event, parse_event_id, EVENT_NOT_FOUND};
use crate::models::{Event, EventStats, EventStatus, NewEvent};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventDetails {
    #[serde(flatten)]
    event: Event,
    stats: EventStats,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: EventStatus,
}

pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(new_event) = payload?;
    let event = new_event.validate()?.into_event();

    let event = state.events.create(&event).await?;
    info!(event_id = %event.id, name = %event.name, "Event created");

    Ok(created(event, "Event created"))
}

pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state.events.list().await?;
    Ok(success(events, "Events retrieved"))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let event = load_event(&state, parse_event_id(&event_id)?).await?;
    let attendees = state.attendees.list_by_event(event.id).await?;
    let stats = EventStats::derive(&event, &attendees);

    Ok(success(EventDetails { event, stats }, "Event retrieved"))
}

pub async fn event_stats(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let event = load_event(&state, parse_event_id(&event_id)?).await?;
    let attendees = state.attendees.list_by_event(event.id).await?;

    Ok(success(
        EventStats::derive(&event, &attendees),
        "Event stats retrieved",
    ))
}

pub async fn update_event_status(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let Json(update) = payload?;

    let event = load_event(&state, event_id).await?;
    event.ensure_transition(update.status)?;

    let event = match state
        .events
        .update_status(event_id, event.status, update.status)
        .await?
    {
        Some(event) => event,
        None => {
            // lost a race: report against whatever the status is now
            let current = load_event(&state, event_id).await?;
            return Err(AppError::Conflict(format!(
                "Event status changed to {} while updating",
                current.status.as_str()
            )));
        }
    };
    info!(%event_id, status = event.status.as_str(), "Event status changed");

    Ok(success(event, "Event status updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&event_id)?;
    if !state.events.delete(event_id).await? {
        return Err(AppError::NotFound(EVENT_NOT_FOUND.into()));
    }
    info!(%event_id, "Event deleted");

    Ok(empty_success("Event deleted"))
}
