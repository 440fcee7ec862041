use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{attendees, checkin, events, health_check, notifications};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:event_id",
            get(events::get_event).delete(events::delete_event),
        )
        .route("/events/:event_id/status", patch(events::update_event_status))
        .route("/events/:event_id/stats", get(events::event_stats))
        .route("/events/:event_id/rsvp", post(attendees::create_rsvp))
        .route("/events/:event_id/attendees", get(attendees::search_attendees))
        .route(
            "/events/:event_id/attendees/:attendee_id/cancel",
            post(attendees::cancel_attendee),
        )
        .route(
            "/events/:event_id/attendees/:attendee_id/ticket",
            get(attendees::attendee_ticket),
        )
        .route(
            "/events/:event_id/attendees/:attendee_id/check-in",
            post(checkin::manual_check_in).delete(checkin::undo_check_in),
        )
        .route("/events/:event_id/check-in/scan", post(checkin::scan_ticket))
        .route(
            "/events/:event_id/notifications/email",
            post(notifications::email_attendees),
        );

    let security = create_security_headers_layer(&state.config);
    let cors = create_cors_layer(&state.config);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(security)
        .layer(cors)
}
