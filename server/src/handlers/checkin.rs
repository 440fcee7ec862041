use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::checkin::CheckInOutcome;
use crate::handlers::{parse_attendee_id, parse_event_id};
use crate::models::{Attendee, CheckInMethod};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub const DIFFERENT_EVENT: &str = "Ticket is for a different event";

#[derive(Deserialize)]
pub struct ScanRequest {
    /// Raw text read from the QR code or typed by gate staff.
    pub payload: String,
    pub method: Option<CheckInMethod>,
}

/// Body for every check-in attempt that reached a verdict. Rejections use
/// this shape too so clients can tell "already checked in" apart from
/// errors.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckInBody<'a> {
    success: bool,
    checked_in: bool,
    already_checked_in: bool,
    message: &'static str,
    attendee: Option<&'a Attendee>,
}

impl IntoResponse for CheckInOutcome {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CheckInOutcome::CheckedIn(_) => (StatusCode::OK, "Checked in"),
            CheckInOutcome::AlreadyCheckedIn(_) => (StatusCode::CONFLICT, "Ticket already checked in"),
            CheckInOutcome::DifferentEvent => (StatusCode::FORBIDDEN, DIFFERENT_EVENT),
            CheckInOutcome::NotActive(_) => (StatusCode::CONFLICT, "Ticket is not active"),
        };

        let body = CheckInBody {
            success: self.is_success(),
            checked_in: self.attendee().is_some_and(|a| a.checked_in),
            already_checked_in: matches!(self, CheckInOutcome::AlreadyCheckedIn(_)),
            message,
            attendee: self.attendee(),
        };

        (status, Json(body)).into_response()
    }
}

pub async fn scan_ticket(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<CheckInOutcome, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let Json(request) = payload?;

    state
        .check_in
        .scan(
            event_id,
            &request.payload,
            request.method.unwrap_or(CheckInMethod::Qr),
        )
        .await
}

pub async fn manual_check_in(
    State(state): State<AppState>,
    Path((event_id, attendee_id)): Path<(String, String)>,
) -> Result<CheckInOutcome, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let attendee_id = parse_attendee_id(&attendee_id)?;

    state
        .check_in
        .redeem(event_id, attendee_id, CheckInMethod::Manual)
        .await
}

pub async fn undo_check_in(
    State(state): State<AppState>,
    Path((event_id, attendee_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let attendee_id = parse_attendee_id(&attendee_id)?;

    let attendee = state.check_in.undo(event_id, attendee_id).await?;
    Ok(success(attendee, "Check-in undone"))
}
