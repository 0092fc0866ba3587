pub mod engineers;
pub mod messages;
pub mod realtime;
pub mod tickets;
