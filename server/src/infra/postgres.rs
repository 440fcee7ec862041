use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::ports::{AttendeeRepository, EventRepository};
use crate::models::{Attendee, AttendeeStatus, CheckInMethod, Event, EventStatus, NewAttendee};
use crate::utils::error::AppError;

const UNIQUE_VIOLATION: &str = "23505";

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        let created = sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, name, description, location, starts_at, ends_at, total_tickets, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.total_tickets)
        .bind(event.status)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn list(&self) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY starts_at ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING *",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        // attendees go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PostgresAttendeeRepo {
    pool: PgPool,
}

impl PostgresAttendeeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn duplicate_registration(err: sqlx::Error) -> AppError {
    let is_unique_violation = err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);

    if is_unique_violation {
        AppError::Conflict("This email is already registered for the event".into())
    } else {
        AppError::DatabaseError(err)
    }
}

#[async_trait]
impl AttendeeRepository for PostgresAttendeeRepo {
    async fn register(&self, event_id: Uuid, details: NewAttendee) -> Result<Attendee, AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the event serializes registrations for it.
        let capacity: i32 =
            sqlx::query_scalar("SELECT total_tickets FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Event not found".into()))?;

        let already_registered: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM attendees WHERE event_id = $1 AND email = $2 AND status <> 'cancelled')",
        )
        .bind(event_id)
        .bind(&details.email)
        .fetch_one(&mut *tx)
        .await?;
        if already_registered {
            return Err(AppError::Conflict(
                "This email is already registered for the event".into(),
            ));
        }

        let sold: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM attendees WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

        let status = if sold + i64::from(details.quantity) <= i64::from(capacity) {
            AttendeeStatus::Confirmed
        } else {
            AttendeeStatus::Waitlisted
        };
        let attendee = Attendee::new(event_id, details, status);

        let created = sqlx::query_as::<_, Attendee>(
            "INSERT INTO attendees (id, event_id, name, email, phone, quantity, status, checked_in, checked_in_at, check_in_method, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING *",
        )
        .bind(attendee.id)
        .bind(attendee.event_id)
        .bind(&attendee.name)
        .bind(&attendee.email)
        .bind(&attendee.phone)
        .bind(attendee.quantity)
        .bind(attendee.status)
        .bind(attendee.checked_in)
        .bind(attendee.checked_in_at)
        .bind(attendee.check_in_method)
        .bind(attendee.created_at)
        .bind(attendee.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(duplicate_registration)?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attendee>, AppError> {
        let attendee = sqlx::query_as::<_, Attendee>("SELECT * FROM attendees WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(attendee)
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Attendee>, AppError> {
        let attendees = sqlx::query_as::<_, Attendee>(
            "SELECT * FROM attendees WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attendees)
    }

    async fn cancel(&self, event_id: Uuid, id: Uuid) -> Result<Option<Attendee>, AppError> {
        let attendee = sqlx::query_as::<_, Attendee>(
            "UPDATE attendees SET status = 'cancelled', updated_at = NOW()
             WHERE id = $1 AND event_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attendee)
    }

    async fn mark_checked_in(
        &self,
        event_id: Uuid,
        id: Uuid,
        method: CheckInMethod,
        at: DateTime<Utc>,
    ) -> Result<Option<Attendee>, AppError> {
        let attendee = sqlx::query_as::<_, Attendee>(
            "UPDATE attendees
             SET checked_in = TRUE, checked_in_at = $3, check_in_method = $4, updated_at = $3
             WHERE id = $1 AND event_id = $2 AND status = 'confirmed' AND checked_in = FALSE
             RETURNING *",
        )
        .bind(id)
        .bind(event_id)
        .bind(at)
        .bind(method)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attendee)
    }

    async fn clear_check_in(&self, event_id: Uuid, id: Uuid) -> Result<Option<Attendee>, AppError> {
        let attendee = sqlx::query_as::<_, Attendee>(
            "UPDATE attendees
             SET checked_in = FALSE, checked_in_at = NULL, check_in_method = NULL,
                 updated_at = CASE WHEN checked_in THEN NOW() ELSE updated_at END
             WHERE id = $1 AND event_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attendee)
    }
}
