use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::domain::messaging::broadcast;
use crate::handlers::{load_event, parse_event_id};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Deserialize)]
pub struct EmailRequest {
    pub subject: String,
    pub message: String,
}

pub async fn email_attendees(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let Json(request) = payload?;

    let event = load_event(&state, event_id).await?;
    let attendees = state.attendees.list_by_event(event_id).await?;

    let report = broadcast(
        state.email.as_ref(),
        &event,
        &attendees,
        &request.subject,
        &request.message,
    )
    .await?;

    if report.sent == 0 {
        return Err(AppError::ExternalServiceError(
            "Email delivery failed for all recipients".into(),
        ));
    }

    let message = if report.failed == 0 {
        format!("Email sent to {} attendee(s)", report.sent)
    } else {
        format!(
            "Email sent to {} attendee(s), {} failed",
            report.sent, report.failed
        )
    };
    Ok(success(report, message))
}
