pub mod engineer;
pub mod thread;
pub mod ticket;
pub mod ticket_action;

pub use engineer::*;
pub use thread::*;
pub use ticket::*;
pub use ticket_action::*;

use chrono::{SecondsFormat, Utc};

/// RFC 3339 UTC timestamp with fixed microsecond precision, so stored values
/// sort lexicographically in time order
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
