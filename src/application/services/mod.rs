pub mod engineer_service;
pub mod escalation_service;
pub mod ingest_service;
pub mod thread_resolver;
pub mod ticket_service;
pub mod triage_service;

pub use engineer_service::*;
pub use escalation_service::*;
pub use ingest_service::*;
pub use thread_resolver::*;
pub use ticket_service::*;
pub use triage_service::*;
