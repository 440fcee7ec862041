use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::ports::{AttendeeRepository, EventRepository};
use crate::models::{
    Attendee, AttendeeStatus, CheckInMethod, Event, EventStatus, NewAttendee,
};
use crate::utils::error::AppError;

#[derive(Default)]
struct Tables {
    events: HashMap<Uuid, Event>,
    attendees: HashMap<Uuid, Attendee>,
}

#[derive(Default)]
struct Inner {
    tables: RwLock<Tables>,
    calls: AtomicUsize,
}

/// In-process store used when no database is configured. Both repositories
/// share one lock, so registration and check-in see a consistent view.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> MemoryEventRepo {
        MemoryEventRepo {
            store: self.clone(),
        }
    }

    pub fn attendees(&self) -> MemoryAttendeeRepo {
        MemoryAttendeeRepo {
            store: self.clone(),
        }
    }

    /// Number of repository operations served so far.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MemoryEventRepo {
    store: MemoryStore,
}

pub struct MemoryAttendeeRepo {
    store: MemoryStore,
}

#[async_trait]
impl EventRepository for MemoryEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        self.store.record_call();
        let mut tables = self.store.inner.tables.write().await;
        tables.events.insert(event.id, event.clone());
        Ok(event.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        self.store.record_call();
        let tables = self.store.inner.tables.read().await;
        Ok(tables.events.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Event>, AppError> {
        self.store.record_call();
        let tables = self.store.inner.tables.read().await;
        let mut events: Vec<Event> = tables.events.values().cloned().collect();
        events.sort_by_key(|e| e.starts_at);
        Ok(events)
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<Option<Event>, AppError> {
        self.store.record_call();
        let mut tables = self.store.inner.tables.write().await;
        Ok(tables
            .events
            .get_mut(&id)
            .filter(|event| event.status == from)
            .map(|event| {
                event.status = to;
                event.updated_at = Utc::now();
                event.clone()
            }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        self.store.record_call();
        let mut tables = self.store.inner.tables.write().await;
        if tables.events.remove(&id).is_none() {
            return Ok(false);
        }
        tables.attendees.retain(|_, a| a.event_id != id);
        Ok(true)
    }
}

#[async_trait]
impl AttendeeRepository for MemoryAttendeeRepo {
    async fn register(&self, event_id: Uuid, details: NewAttendee) -> Result<Attendee, AppError> {
        self.store.record_call();
        let mut tables = self.store.inner.tables.write().await;

        let capacity = tables
            .events
            .get(&event_id)
            .map(|e| e.total_tickets)
            .ok_or_else(|| AppError::NotFound("Event not found".into()))?;

        let mut sold = 0;
        for existing in tables.attendees.values().filter(|a| a.event_id == event_id) {
            if existing.is_active() && existing.email == details.email {
                return Err(AppError::Conflict(
                    "This email is already registered for the event".into(),
                ));
            }
            if existing.status == AttendeeStatus::Confirmed {
                sold += existing.quantity;
            }
        }

        let status = if sold + details.quantity <= capacity {
            AttendeeStatus::Confirmed
        } else {
            AttendeeStatus::Waitlisted
        };

        let attendee = Attendee::new(event_id, details, status);
        tables.attendees.insert(attendee.id, attendee.clone());
        Ok(attendee)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attendee>, AppError> {
        self.store.record_call();
        let tables = self.store.inner.tables.read().await;
        Ok(tables.attendees.get(&id).cloned())
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Attendee>, AppError> {
        self.store.record_call();
        let tables = self.store.inner.tables.read().await;
        let mut attendees: Vec<Attendee> = tables
            .attendees
            .values()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect();
        attendees.sort_by_key(|a| a.created_at);
        Ok(attendees)
    }

    async fn cancel(&self, event_id: Uuid, id: Uuid) -> Result<Option<Attendee>, AppError> {
        self.store.record_call();
        let mut tables = self.store.inner.tables.write().await;
        Ok(tables
            .attendees
            .get_mut(&id)
            .filter(|a| a.event_id == event_id)
            .map(|attendee| {
                attendee.status = AttendeeStatus::Cancelled;
                attendee.updated_at = Utc::now();
                attendee.clone()
            }))
    }

    async fn mark_checked_in(
        &self,
        event_id: Uuid,
        id: Uuid,
        method: CheckInMethod,
        at: DateTime<Utc>,
    ) -> Result<Option<Attendee>, AppError> {
        self.store.record_call();
        let mut tables = self.store.inner.tables.write().await;
        Ok(tables
            .attendees
            .get_mut(&id)
            .filter(|a| {
                a.event_id == event_id && a.status == AttendeeStatus::Confirmed && !a.checked_in
            })
            .map(|attendee| {
                attendee.checked_in = true;
                attendee.checked_in_at = Some(at);
                attendee.check_in_method = Some(method);
                attendee.updated_at = at;
                attendee.clone()
            }))
    }

    async fn clear_check_in(&self, event_id: Uuid, id: Uuid) -> Result<Option<Attendee>, AppError> {
        self.store.record_call();
        let mut tables = self.store.inner.tables.write().await;
        Ok(tables
            .attendees
            .get_mut(&id)
            .filter(|a| a.event_id == event_id)
            .map(|attendee| {
                if attendee.checked_in {
                    attendee.checked_in = false;
                    attendee.checked_in_at = None;
                    attendee.check_in_method = None;
                    attendee.updated_at = Utc::now();
                }
                attendee.clone()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewEvent;

    async fn published_event(store: &MemoryStore, total_tickets: i32) -> Event {
        let events = store.events();
        let event = NewEvent {
            name: "Mombasa Jazz Night".into(),
            description: None,
            location: Some("Fort Jesus".into()),
            starts_at: Utc::now(),
            ends_at: None,
            total_tickets,
        }
        .into_event();
        events.create(&event).await.unwrap();
        events
            .update_status(event.id, EventStatus::Draft, EventStatus::Published)
            .await
            .unwrap()
            .unwrap()
    }

    fn details(email: &str, quantity: i32) -> NewAttendee {
        NewAttendee {
            name: "Guest".into(),
            email: email.into(),
            phone: None,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_register_confirms_until_capacity_then_waitlists() {
        let store = MemoryStore::new();
        let event = published_event(&store, 3).await;
        let attendees = store.attendees();

        let first = attendees
            .register(event.id, details("a@example.com", 2))
            .await
            .unwrap();
        let second = attendees
            .register(event.id, details("b@example.com", 2))
            .await
            .unwrap();
        let third = attendees
            .register(event.id, details("c@example.com", 1))
            .await
            .unwrap();

        assert_eq!(first.status, AttendeeStatus::Confirmed);
        assert_eq!(second.status, AttendeeStatus::Waitlisted);
        assert_eq!(third.status, AttendeeStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_until_cancelled() {
        let store = MemoryStore::new();
        let event = published_event(&store, 10).await;
        let attendees = store.attendees();

        let first = attendees
            .register(event.id, details("dup@example.com", 1))
            .await
            .unwrap();
        let err = attendees
            .register(event.id, details("dup@example.com", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        attendees.cancel(event.id, first.id).await.unwrap();
        assert!(attendees
            .register(event.id, details("dup@example.com", 1))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_register_for_unknown_event() {
        let store = MemoryStore::new();
        let err = store
            .attendees()
            .register(Uuid::new_v4(), details("x@example.com", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_attendees() {
        let store = MemoryStore::new();
        let event = published_event(&store, 10).await;
        let attendee = store
            .attendees()
            .register(event.id, details("x@example.com", 1))
            .await
            .unwrap();

        assert!(store.events().delete(event.id).await.unwrap());
        assert!(!store.events().delete(event.id).await.unwrap());
        assert!(store
            .attendees()
            .find_by_id(attendee.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_status_requires_expected_current_status() {
        let store = MemoryStore::new();
        let event = published_event(&store, 10).await;
        let events = store.events();

        let archived = events
            .update_status(event.id, EventStatus::Published, EventStatus::Archived)
            .await
            .unwrap();
        assert_eq!(archived.unwrap().status, EventStatus::Archived);

        // A second writer that validated against `published` must not win.
        let stale = events
            .update_status(event.id, EventStatus::Published, EventStatus::Cancelled)
            .await
            .unwrap();
        assert!(stale.is_none());

        let current = events.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(current.status, EventStatus::Archived);
    }

    #[tokio::test]
    async fn test_mark_checked_in_is_conditional() {
        let store = MemoryStore::new();
        let event = published_event(&store, 10).await;
        let attendees = store.attendees();
        let attendee = attendees
            .register(event.id, details("x@example.com", 1))
            .await
            .unwrap();

        let now = Utc::now();
        assert!(attendees
            .mark_checked_in(Uuid::new_v4(), attendee.id, CheckInMethod::Qr, now)
            .await
            .unwrap()
            .is_none());
        assert!(attendees
            .mark_checked_in(event.id, attendee.id, CheckInMethod::Qr, now)
            .await
            .unwrap()
            .is_some());
        assert!(attendees
            .mark_checked_in(event.id, attendee.id, CheckInMethod::Qr, now)
            .await
            .unwrap()
            .is_none());
    }
}
