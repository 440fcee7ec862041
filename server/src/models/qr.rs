use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

pub const INVALID_FORMAT: &str = "Invalid ticket format";

/// Text embedded in a ticket's QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub booking_id: String,
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
}

impl QrPayload {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::ValidationError(INVALID_FORMAT.into()));
        }

        let payload: QrPayload = serde_json::from_str(raw).map_err(|e| {
            tracing::debug!(error = %e, "Rejected QR payload");
            AppError::ValidationError(INVALID_FORMAT.into())
        })?;

        if payload.booking_id.trim().is_empty() || payload.event_id.trim().is_empty() {
            return Err(AppError::ValidationError(INVALID_FORMAT.into()));
        }

        Ok(payload)
    }

    pub fn encode(&self) -> String {
        // Plain strings and an Option<String> always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
