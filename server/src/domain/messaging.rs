use serde::Serialize;
use tracing::{info, warn};

use crate::domain::ports::EmailService;
use crate::models::{Attendee, AttendeeStatus, Event};
use crate::utils::error::AppError;

const MAX_SUBJECT_LEN: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

/// Emails every confirmed attendee of `event`, one message per recipient.
/// A failed recipient is recorded and the rest are still attempted.
pub async fn broadcast(
    email: &dyn EmailService,
    event: &Event,
    attendees: &[Attendee],
    subject: &str,
    message: &str,
) -> Result<BroadcastReport, AppError> {
    let subject = subject.trim();
    let message = message.trim();
    if subject.is_empty() || message.is_empty() {
        return Err(AppError::ValidationError(
            "subject and message are required".into(),
        ));
    }
    if subject.chars().count() > MAX_SUBJECT_LEN {
        return Err(AppError::ValidationError(format!(
            "subject must be at most {} characters",
            MAX_SUBJECT_LEN
        )));
    }

    let recipients: Vec<&Attendee> = attendees
        .iter()
        .filter(|a| a.event_id == event.id && a.status == AttendeeStatus::Confirmed)
        .collect();
    if recipients.is_empty() {
        return Err(AppError::ValidationError(
            "Event has no confirmed attendees to message".into(),
        ));
    }

    let mut report = BroadcastReport::default();
    for attendee in recipients {
        let body = render_html(event, attendee, message);
        match email.send(&attendee.email, subject, &body).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!(event_id = %event.id, recipient = %attendee.email, error = %e, "Email delivery failed");
                report.failed += 1;
                report.failures.push(attendee.email.clone());
            }
        }
    }

    info!(
        event_id = %event.id,
        sent = report.sent,
        failed = report.failed,
        "Attendee broadcast finished"
    );
    Ok(report)
}

fn render_html(event: &Event, attendee: &Attendee, message: &str) -> String {
    let paragraphs: String = message
        .lines()
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect();

    format!(
        "<html><body><p>Hi {},</p>{}<p>&mdash; {}</p></body></html>",
        escape_html(&attendee.name),
        paragraphs,
        escape_html(&event.name)
    )
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
