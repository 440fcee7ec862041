use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

pub const MAX_QUANTITY: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendee_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendeeStatus {
    Confirmed,
    Cancelled,
    Waitlisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "check_in_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CheckInMethod {
    Manual,
    Qr,
    App,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub quantity: i32,
    pub status: AttendeeStatus,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub check_in_method: Option<CheckInMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendee {
    pub fn new(event_id: Uuid, details: NewAttendee, status: AttendeeStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            event_id,
            name: details.name,
            email: details.email,
            phone: details.phone,
            quantity: details.quantity,
            status,
            checked_in: false,
            checked_in_at: None,
            check_in_method: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this registration still holds (or waits for) a seat.
    pub fn is_active(&self) -> bool {
        self.status != AttendeeStatus::Cancelled
    }

    /// Case-insensitive substring match over name, email and phone.
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.email.contains(needle)
            || self
                .phone
                .as_deref()
                .is_some_and(|phone| phone.to_lowercase().contains(needle))
    }
}

/// RSVP body as sent by the web and mobile clients. Older clients use the
/// `user*` / `ticketQuantity` spellings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpRequest {
    #[serde(alias = "userName", alias = "fullName")]
    pub name: Option<String>,
    #[serde(alias = "userEmail")]
    pub email: Option<String>,
    #[serde(alias = "phoneNumber")]
    pub phone: Option<String>,
    #[serde(alias = "ticketQuantity")]
    pub quantity: Option<i32>,
}

/// Normalized registration details. Every writer goes through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendee {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub quantity: i32,
}

impl TryFrom<RsvpRequest> for NewAttendee {
    type Error = AppError;

    fn try_from(request: RsvpRequest) -> Result<Self, Self::Error> {
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::ValidationError("name is required".into()))?;

        let email = request
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::ValidationError("email is required".into()))?;
        if !looks_like_email(&email) {
            return Err(AppError::ValidationError(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        let phone = request
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let quantity = request.quantity.unwrap_or(1);
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return Err(AppError::ValidationError(format!(
                "quantity must be between 1 and {}",
                MAX_QUANTITY
            )));
        }

        Ok(Self {
            name,
            email,
            phone,
            quantity,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
