use serde::Serialize;

use crate::models::{Attendee, QrPayload};

const QR_IMAGE_SIZE: &str = "300x300";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketQr {
    pub attendee_id: String,
    pub event_id: String,
    pub payload: String,
    /// `None` when no image service is configured; clients show `payload`.
    pub image_url: Option<String>,
}

/// Builds ticket QR data. Images are rendered by an external service from
/// the URL returned here.
#[derive(Debug, Clone)]
pub struct TicketRenderer {
    image_base_url: Option<String>,
}

impl TicketRenderer {
    pub fn new(image_base_url: Option<String>) -> Self {
        Self { image_base_url }
    }

    pub fn render(&self, attendee: &Attendee) -> TicketQr {
        let payload = QrPayload {
            booking_id: attendee.id.to_string(),
            event_id: attendee.event_id.to_string(),
            ticket_id: Some(attendee.id.to_string()),
        }
        .encode();

        let image_url = self.image_base_url.as_deref().map(|base| {
            let separator = if base.contains('?') { '&' } else { '?' };
            format!(
                "{}{}size={}&data={}",
                base,
                separator,
                QR_IMAGE_SIZE,
                urlencoding::encode(&payload)
            )
        });

        TicketQr {
            attendee_id: attendee.id.to_string(),
            event_id: attendee.event_id.to_string(),
            payload,
            image_url,
        }
    }
}
