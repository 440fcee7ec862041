mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::TestApp;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn qr(booking_id: &str, event_id: &str) -> String {
    json!({ "bookingId": booking_id, "eventId": event_id }).to_string()
}

async fn attendee_state(app: &TestApp, event_id: &str, email: &str) -> Value {
    let (status, body) = app
        .request("GET", &format!("/api/events/{}/attendees?q={}", event_id, email), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    body["data"][0].clone()
}

#[tokio::test]
async fn test_scan_then_rescan() {
    let app = TestApp::new();
    let event_id = app.published_event(50).await;
    let rsvp = app.rsvp(&event_id, "Wanjiku", "wanjiku@example.com", 1).await;
    let attendee_id = rsvp["attendee"]["id"].as_str().unwrap();

    let (status, body) = app.scan(&event_id, &qr(attendee_id, &event_id)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["checkedIn"], true);
    assert_eq!(body["alreadyCheckedIn"], false);
    assert_eq!(body["attendee"]["checkInMethod"], "qr");
    assert!(body["attendee"]["checkedInAt"].is_string());

    let (status, body) = app.scan(&event_id, &qr(attendee_id, &event_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["alreadyCheckedIn"], true);
}

#[tokio::test]
async fn test_scan_for_other_event_leaves_attendee_untouched() {
    let app = TestApp::new();
    let event_id = app.published_event(50).await;
    let other_event = app.published_event(50).await;
    let rsvp = app.rsvp(&event_id, "Kamau", "kamau@example.com", 1).await;
    let attendee_id = rsvp["attendee"]["id"].as_str().unwrap();

    // Selected event is `other_event`, ticket is for `event_id`.
    let (status, body) = app.scan(&other_event, &qr(attendee_id, &event_id)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("different event"));

    // Ticket claims the selected event but the booking belongs elsewhere.
    let (status, _) = app.scan(&other_event, &qr(attendee_id, &other_event)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let attendee = attendee_state(&app, &event_id, "kamau").await;
    assert_eq!(attendee["checkedIn"], false);
}

#[tokio::test]
async fn test_malformed_scan_is_rejected_without_storage_access() {
    let app = TestApp::new();
    let event_id = app.published_event(50).await;
    let before = app.store.calls();

    let (status, body) = app.scan(&event_id, "this is not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(app.store.calls(), before);
}

#[tokio::test]
async fn test_unknown_ticket_is_not_found() {
    let app = TestApp::new();
    let event_id = app.published_event(50).await;

    let (status, body) = app
        .scan(&event_id, &qr(&Uuid::new_v4().to_string(), &event_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Ticket not found");

    let (status, _) = app.scan(&event_id, &qr("A1", &event_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manual_check_in_and_undo() {
    let app = TestApp::new();
    let event_id = app.published_event(50).await;
    let rsvp = app.rsvp(&event_id, "Njoroge", "njoroge@example.com", 2).await;
    let attendee_id = rsvp["attendee"]["id"].as_str().unwrap();
    let uri = format!("/api/events/{}/attendees/{}/check-in", event_id, attendee_id);

    let (status, body) = app.request("POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["attendee"]["checkInMethod"], "manual");
    let first_at = body["attendee"]["checkedInAt"].as_str().unwrap().to_string();

    let (status, body) = app.request("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checkedIn"], false);
    assert!(body["data"]["checkedInAt"].is_null());
    assert!(body["data"]["checkInMethod"].is_null());

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let (status, body) = app.scan(&event_id, &qr(attendee_id, &event_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["attendee"]["checkedInAt"].as_str().unwrap(), first_at);

    let (status, body) = app
        .request("GET", &format!("/api/events/{}/stats", event_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checkedIn"], 1);
    assert_eq!(body["data"]["soldTickets"], 2);
}

#[tokio::test]
async fn test_cancelled_booking_cannot_check_in() {
    let app = TestApp::new();
    let event_id = app.published_event(50).await;
    let rsvp = app.rsvp(&event_id, "Auma", "auma@example.com", 1).await;
    let attendee_id = rsvp["attendee"]["id"].as_str().unwrap();

    let (status, _) = app
        .request(
            "POST",
            &format!("/api/events/{}/attendees/{}/cancel", event_id, attendee_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.scan(&event_id, &qr(attendee_id, &event_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["alreadyCheckedIn"], false);
    assert_eq!(body["message"], "Ticket is not active");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_check_in_once() {
    let app = TestApp::new();
    let event_id = app.published_event(50).await;
    let rsvp = app.rsvp(&event_id, "Chebet", "chebet@example.com", 1).await;
    let payload = qr(rsvp["attendee"]["id"].as_str().unwrap(), &event_id);
    let uri = format!("/api/events/{}/check-in/scan", event_id);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let router = app.router.clone();
            let request = Request::builder()
                .method("POST")
                .uri(&uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "payload": payload }).to_string()))
                .unwrap();
            tokio::spawn(async move {
                let response = router.oneshot(request).await.unwrap();
                let status = response.status();
                let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                    .await
                    .unwrap();
                let body: Value = serde_json::from_slice(&bytes).unwrap();
                (status, body)
            })
        })
        .collect();

    let mut successes = 0;
    let mut already = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        if status == StatusCode::OK {
            successes += 1;
        } else if body["alreadyCheckedIn"] == true {
            already += 1;
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(already, 5);
}

#[tokio::test]
async fn test_invalid_ids_and_methods() {
    let app = TestApp::new();

    let (status, body) = app.scan("not-a-uuid", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let event_id = app.published_event(5).await;
    let (status, _) = app
        .request(
            "POST",
            &format!("/api/events/{}/attendees/nope/check-in", event_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request("GET", &format!("/api/events/{}/check-in/scan", event_id), None)
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
