//! Ticket redemption.
//!
//! An attendee moves between two states: not checked in and checked in.
//! A scan or manual check-in moves it forward, a repeated one is rejected
//! with [`CheckInOutcome::AlreadyCheckedIn`], and an undo moves it back.
//! The forward move is a single conditional write so two gate devices
//! scanning the same ticket cannot both succeed.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ports::AttendeeRepository;
use crate::models::{Attendee, AttendeeStatus, CheckInMethod, QrPayload};
use crate::utils::error::AppError;

pub const TICKET_NOT_FOUND: &str = "Ticket not found";

const MAX_REDEEM_ATTEMPTS: usize = 3;

/// Expected results of a check-in attempt. Storage and input failures are
/// reported as [`AppError`] instead.
#[derive(Debug, Clone)]
pub enum CheckInOutcome {
    CheckedIn(Attendee),
    AlreadyCheckedIn(Attendee),
    DifferentEvent,
    NotActive(Attendee),
}

impl CheckInOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckInOutcome::CheckedIn(_))
    }

    pub fn attendee(&self) -> Option<&Attendee> {
        match self {
            CheckInOutcome::CheckedIn(a)
            | CheckInOutcome::AlreadyCheckedIn(a)
            | CheckInOutcome::NotActive(a) => Some(a),
            CheckInOutcome::DifferentEvent => None,
        }
    }
}

#[derive(Clone)]
pub struct CheckInService {
    attendees: Arc<dyn AttendeeRepository>,
}

impl CheckInService {
    pub fn new(attendees: Arc<dyn AttendeeRepository>) -> Self {
        Self { attendees }
    }

    /// Redeems a scanned or typed QR payload for the selected event.
    ///
    /// Malformed input and tickets for another event are rejected before
    /// any storage access.
    pub async fn scan(
        &self,
        event_id: Uuid,
        raw: &str,
        method: CheckInMethod,
    ) -> Result<CheckInOutcome, AppError> {
        let payload = QrPayload::parse(raw)?;

        if payload.event_id.trim().parse::<Uuid>().ok() != Some(event_id) {
            warn!(
                %event_id,
                scanned_event = %payload.event_id,
                "Ticket is for a different event"
            );
            return Ok(CheckInOutcome::DifferentEvent);
        }

        let attendee_id = payload
            .booking_id
            .trim()
            .parse::<Uuid>()
            .map_err(|_| AppError::NotFound(TICKET_NOT_FOUND.into()))?;

        self.redeem(event_id, attendee_id, method).await
    }

    /// Checks an attendee in by id. Used by the scan path and by manual
    /// check-in from the attendee list.
    pub async fn redeem(
        &self,
        event_id: Uuid,
        attendee_id: Uuid,
        method: CheckInMethod,
    ) -> Result<CheckInOutcome, AppError> {
        for _ in 0..MAX_REDEEM_ATTEMPTS {
            if let Some(attendee) = self
                .attendees
                .mark_checked_in(event_id, attendee_id, method, Utc::now())
                .await?
            {
                info!(%event_id, %attendee_id, ?method, "Attendee checked in");
                return Ok(CheckInOutcome::CheckedIn(attendee));
            }

            let attendee = self
                .attendees
                .find_by_id(attendee_id)
                .await?
                .ok_or_else(|| AppError::NotFound(TICKET_NOT_FOUND.into()))?;

            if attendee.event_id != event_id {
                warn!(%event_id, %attendee_id, "Ticket is for a different event");
                return Ok(CheckInOutcome::DifferentEvent);
            }
            if attendee.checked_in {
                warn!(%event_id, %attendee_id, "Ticket already checked in");
                return Ok(CheckInOutcome::AlreadyCheckedIn(attendee));
            }
            if attendee.status != AttendeeStatus::Confirmed {
                warn!(%event_id, %attendee_id, status = ?attendee.status, "Ticket is not active");
                return Ok(CheckInOutcome::NotActive(attendee));
            }
            // An undo landed between the conditional write and the read.
        }

        Err(AppError::Conflict(
            "Ticket changed during check-in, please retry".into(),
        ))
    }

    /// Reverts a check-in. Undoing an attendee that is not checked in
    /// returns it unchanged.
    pub async fn undo(&self, event_id: Uuid, attendee_id: Uuid) -> Result<Attendee, AppError> {
        let attendee = self
            .attendees
            .clear_check_in(event_id, attendee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(TICKET_NOT_FOUND.into()))?;

        info!(%event_id, %attendee_id, "Check-in undone");
        Ok(attendee)
    }

    /// Linear scan over the event's attendees, ordered by name.
    pub async fn search(&self, event_id: Uuid, query: &str) -> Result<Vec<Attendee>, AppError> {
        let needle = query.trim().to_lowercase();
        let mut attendees: Vec<Attendee> = self
            .attendees
            .list_by_event(event_id)
            .await?
            .into_iter()
            .filter(|a| needle.is_empty() || a.matches(&needle))
            .collect();

        attendees.sort_by_cached_key(|a| a.name.to_lowercase());
        Ok(attendees)
    }
}
