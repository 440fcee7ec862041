#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use tikiti_server::{
    config::Config,
    domain::ports::EmailService,
    infra::memory::MemoryStore,
    routes::create_routes,
    state::AppState,
    utils::error::AppError,
};

#[derive(Default)]
pub struct MockEmailService {
    pub fail_for: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<String>>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, recipient: &str, _subject: &str, _html_body: &str) -> Result<(), AppError> {
        if self.fail_for.lock().unwrap().iter().any(|r| r == recipient) {
            return Err(AppError::ExternalServiceError("mock delivery failure".into()));
        }
        self.sent.lock().unwrap().push(recipient.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub email: Arc<MockEmailService>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let email = Arc::new(MockEmailService::default());
        let state = AppState::new(
            Config::default(),
            Arc::new(store.events()),
            Arc::new(store.attendees()),
            email.clone(),
        );

        Self {
            router: create_routes(state),
            store,
            email,
        }
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send(&self.router, method, uri, body).await
    }

    /// Creates and publishes an event, returning its id.
    pub async fn published_event(&self, total_tickets: i32) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/events",
                Some(json!({
                    "name": "Nairobi Founders Meetup",
                    "location": "iHub",
                    "startsAt": "2030-06-01T17:00:00Z",
                    "totalTickets": total_tickets
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let event_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = self
            .request(
                "PATCH",
                &format!("/api/events/{}/status", event_id),
                Some(json!({ "status": "published" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);

        event_id
    }

    /// Registers an attendee, returning the response body's `data`.
    pub async fn rsvp(&self, event_id: &str, name: &str, email: &str, quantity: i32) -> Value {
        let (status, body) = self
            .request(
                "POST",
                &format!("/api/events/{}/rsvp", event_id),
                Some(json!({ "name": name, "email": email, "quantity": quantity })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    pub async fn scan(&self, event_id: &str, payload: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            &format!("/api/events/{}/check-in/scan", event_id),
            Some(json!({ "payload": payload })),
        )
        .await
    }
}

/// Sends one JSON request through `router` and decodes the JSON reply.
pub async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
