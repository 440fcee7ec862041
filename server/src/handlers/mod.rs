use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::models::Event;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod attendees;
pub mod checkin;
pub mod events;
pub mod notifications;

pub const EVENT_NOT_FOUND: &str = "Event not found";

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "tikiti-api",
    };

    success(payload, "Health check successful")
}

/// A malformed event id is a client error.
pub(crate) fn parse_event_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::ValidationError(format!("'{}' is not a valid event id", raw)))
}

/// A malformed attendee id cannot match any ticket.
pub(crate) fn parse_attendee_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(crate::domain::checkin::TICKET_NOT_FOUND.into()))
}

pub(crate) async fn load_event(state: &AppState, event_id: Uuid) -> Result<Event, AppError> {
    state
        .events
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(EVENT_NOT_FOUND.into()))
}
