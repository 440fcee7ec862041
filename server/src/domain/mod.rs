pub mod checkin;
pub mod messaging;
pub mod ports;
pub mod tickets;
