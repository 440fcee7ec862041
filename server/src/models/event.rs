use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::attendee::{Attendee, AttendeeStatus};
use crate::utils::error::AppError;

const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Archived,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Archived => "archived",
        }
    }

    /// Archived is terminal; a cancelled event can only be archived.
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        matches!(
            (self, next),
            (Draft, Published)
                | (Draft, Cancelled)
                | (Published, Cancelled)
                | (Published, Archived)
                | (Cancelled, Archived)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub total_tickets: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn accepts_registrations(&self) -> bool {
        self.status == EventStatus::Published
    }

    /// Errors when `next` is not reachable from the current status.
    pub fn ensure_transition(&self, next: EventStatus) -> Result<(), AppError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::ValidationError(format!(
                "Cannot change event status from {} to {}",
                self.status.as_str(),
                next.as_str()
            )))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub total_tickets: i32,
}

impl NewEvent {
    pub fn validate(mut self) -> Result<Self, AppError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(AppError::ValidationError("Event name is required".into()));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::ValidationError(format!(
                "Event name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }
        if self.total_tickets < 0 {
            return Err(AppError::ValidationError(
                "totalTickets cannot be negative".into(),
            ));
        }
        if let Some(ends_at) = self.ends_at {
            if ends_at < self.starts_at {
                return Err(AppError::ValidationError(
                    "endsAt must not be before startsAt".into(),
                ));
            }
        }
        self.description = non_empty(self.description);
        self.location = non_empty(self.location);
        Ok(self)
    }

    pub fn into_event(self) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            location: self.location,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            total_tickets: self.total_tickets,
            status: EventStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Ticket counters computed from the attendee list instead of stored on the
/// event row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total_tickets: i32,
    pub sold_tickets: i32,
    pub available_tickets: i32,
    pub checked_in: i32,
    pub not_checked_in: i32,
    pub waitlisted: i32,
    pub cancelled: i32,
}

impl EventStats {
    pub fn derive(event: &Event, attendees: &[Attendee]) -> Self {
        let mut stats = EventStats {
            total_tickets: event.total_tickets,
            ..Default::default()
        };

        for attendee in attendees.iter().filter(|a| a.event_id == event.id) {
            match attendee.status {
                AttendeeStatus::Confirmed => {
                    stats.sold_tickets += attendee.quantity;
                    if attendee.checked_in {
                        stats.checked_in += 1;
                    } else {
                        stats.not_checked_in += 1;
                    }
                }
                AttendeeStatus::Waitlisted => stats.waitlisted += 1,
                AttendeeStatus::Cancelled => stats.cancelled += 1,
            }
        }

        stats.available_tickets = (stats.total_tickets - stats.sold_tickets).max(0);
        stats
    }
}
