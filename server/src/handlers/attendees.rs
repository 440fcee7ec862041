use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::checkin::TICKET_NOT_FOUND;
use crate::domain::messaging::escape_html;
use crate::domain::tickets::TicketQr;
use crate::handlers::{load_event, parse_attendee_id, parse_event_id};
use crate::models::{Attendee, AttendeeStatus, Event, NewAttendee, RsvpRequest};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RsvpResult {
    attendee: Attendee,
    ticket: Option<TicketQr>,
    email_sent: bool,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub async fn create_rsvp(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    payload: Result<Json<RsvpRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let Json(request) = payload?;
    let details = NewAttendee::try_from(request)?;

    let event = load_event(&state, event_id).await?;
    if !event.accepts_registrations() {
        return Err(AppError::Forbidden(format!(
            "Event is {} and not open for registration",
            event.status.as_str()
        )));
    }

    let attendee = state.attendees.register(event_id, details).await?;
    info!(
        %event_id,
        attendee_id = %attendee.id,
        status = ?attendee.status,
        quantity = attendee.quantity,
        "RSVP registered"
    );

    if attendee.status != AttendeeStatus::Confirmed {
        return Ok(created(
            RsvpResult {
                attendee,
                ticket: None,
                email_sent: false,
            },
            "Event is full, you have been added to the waitlist",
        ));
    }

    let ticket = state.tickets.render(&attendee);
    let email_sent = send_confirmation(&state, &event, &attendee, &ticket).await;

    Ok(created(
        RsvpResult {
            attendee,
            ticket: Some(ticket),
            email_sent,
        },
        "Registration confirmed",
    ))
}

/// Confirmation mail is best effort; a delivery failure does not undo the
/// registration.
async fn send_confirmation(
    state: &AppState,
    event: &Event,
    attendee: &Attendee,
    ticket: &TicketQr,
) -> bool {
    let ticket_block = match &ticket.image_url {
        Some(url) => format!(
            "<img src=\"{}\" alt=\"Ticket QR code\" />",
            escape_html(url)
        ),
        None => format!("<pre>{}</pre>", escape_html(&ticket.payload)),
    };
    let body = format!(
        "<html><body><p>You're registered for {}.</p>{}<p>Show this code at the entrance.</p></body></html>",
        escape_html(&event.name),
        ticket_block
    );
    let subject = format!("Your ticket for {}", event.name);

    match state.email.send(&attendee.email, &subject, &body).await {
        Ok(()) => true,
        Err(e) => {
            warn!(attendee_id = %attendee.id, error = %e, "Confirmation email failed");
            false
        }
    }
}

pub async fn search_attendees(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let event = load_event(&state, parse_event_id(&event_id)?).await?;
    let attendees = state
        .check_in
        .search(event.id, query.q.as_deref().unwrap_or_default())
        .await?;

    Ok(success(attendees, "Attendees retrieved"))
}

pub async fn cancel_attendee(
    State(state): State<AppState>,
    Path((event_id, attendee_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let attendee_id = parse_attendee_id(&attendee_id)?;

    let attendee = state
        .attendees
        .cancel(event_id, attendee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(TICKET_NOT_FOUND.into()))?;
    info!(%event_id, %attendee_id, "Booking cancelled");

    Ok(success(attendee, "Booking cancelled"))
}

pub async fn attendee_ticket(
    State(state): State<AppState>,
    Path((event_id, attendee_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let attendee = find_event_attendee(&state, event_id, parse_attendee_id(&attendee_id)?).await?;

    if attendee.status != AttendeeStatus::Confirmed {
        return Err(AppError::Conflict("Ticket is not active".into()));
    }

    Ok(success(state.tickets.render(&attendee), "Ticket retrieved"))
}

async fn find_event_attendee(
    state: &AppState,
    event_id: Uuid,
    attendee_id: Uuid,
) -> Result<Attendee, AppError> {
    state
        .attendees
        .find_by_id(attendee_id)
        .await?
        .filter(|a| a.event_id == event_id)
        .ok_or_else(|| AppError::NotFound(TICKET_NOT_FOUND.into()))
}
