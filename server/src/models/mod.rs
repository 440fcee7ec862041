pub mod attendee;
pub mod event;
pub mod qr;

pub use attendee::{Attendee, AttendeeStatus, CheckInMethod, NewAttendee, RsvpRequest};
pub use event::{Event, EventStats, EventStatus, NewEvent};
pub use qr::QrPayload;
