use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Attendee, CheckInMethod, Event, EventStatus, NewAttendee};
use crate::utils::error::AppError;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError>;
    async fn list(&self) -> Result<Vec<Event>, AppError>;
    /// Moves the event from `from` to `to` only while it is still in `from`.
    /// `None` means the event is missing or its status has since changed.
    async fn update_status(
        &self,
        id: Uuid,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<Option<Event>, AppError>;
    /// Removes the event and its attendees. Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AttendeeRepository: Send + Sync {
    /// Registers an attendee against the event's capacity. The duplicate
    /// check, the capacity check and the insert are one atomic step: the
    /// attendee is confirmed when the seats fit and waitlisted otherwise.
    async fn register(&self, event_id: Uuid, details: NewAttendee) -> Result<Attendee, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attendee>, AppError>;
    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Attendee>, AppError>;
    async fn cancel(&self, event_id: Uuid, id: Uuid) -> Result<Option<Attendee>, AppError>;

    /// Conditional update: flips `checked_in` only for a confirmed attendee
    /// of `event_id` that is not yet checked in. `None` means this call did
    /// not perform the transition.
    async fn mark_checked_in(
        &self,
        event_id: Uuid,
        id: Uuid,
        method: CheckInMethod,
        at: DateTime<Utc>,
    ) -> Result<Option<Attendee>, AppError>;

    /// Resets the redemption fields. `None` if no such attendee in the event.
    async fn clear_check_in(&self, event_id: Uuid, id: Uuid) -> Result<Option<Attendee>, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}
