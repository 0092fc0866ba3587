pub mod engineer_repository;
pub mod paging_transport;
pub mod peer_directory;
pub mod reply_transport;
pub mod task_spawner;
pub mod ticket_broadcaster;
pub mod ticket_repository;
pub mod time_service;
pub mod token_verifier;
pub mod triage_engine;
