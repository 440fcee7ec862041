use std::sync::Arc;

use crate::config::Config;
use crate::domain::checkin::CheckInService;
use crate::domain::ports::{AttendeeRepository, EmailService, EventRepository};
use crate::domain::tickets::TicketRenderer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub events: Arc<dyn EventRepository>,
    pub attendees: Arc<dyn AttendeeRepository>,
    pub email: Arc<dyn EmailService>,
    pub check_in: CheckInService,
    pub tickets: TicketRenderer,
}

impl AppState {
    pub fn new(
        config: Config,
        events: Arc<dyn EventRepository>,
        attendees: Arc<dyn AttendeeRepository>,
        email: Arc<dyn EmailService>,
    ) -> Self {
        Self {
            check_in: CheckInService::new(attendees.clone()),
            tickets: TicketRenderer::new(config.qr_image_base_url.clone()),
            config: Arc::new(config),
            events,
            attendees,
            email,
        }
    }
}
