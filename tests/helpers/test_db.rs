use triagedesk::domain::entities::{Engineer, Platform, Ticket, TicketStatus, StatusUpdate};
use triagedesk::domain::ports::engineer_repository::EngineerRepository;
use triagedesk::domain::ports::ticket_repository::TicketRepository;
use triagedesk::infrastructure::persistence::Database;
use uuid::Uuid;

pub async fn setup_test_db() -> Database {
    // File-backed SQLite, unique per test so tests can run in parallel
    let path = std::env::temp_dir().join(format!("triagedesk_test_{}.db", Uuid::new_v4()));
    let db_url = format!("sqlite://{}?mode=rwc", path.display());

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations()
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn create_engineer(
    db: &Database,
    name: &str,
    active: bool,
    on_call: bool,
    telegram_id: Option<&str>,
) -> Engineer {
    let engineer = Engineer {
        active,
        on_call,
        telegram_id: telegram_id.map(str::to_string),
        phone_number: Some(format!("+1555{:04}", name.len())),
        ..Engineer::new(name)
    };
    db.create_engineer(&engineer)
        .await
        .expect("Failed to create engineer");
    engineer
}

/// Creates a ticket and moves it straight to `status`
pub async fn create_ticket_in(db: &Database, thread_id: &str, status: TicketStatus) -> Ticket {
    let (ticket, _) = db
        .find_or_create_ticket(Platform::Telegram, thread_id, "user-1")
        .await
        .expect("Failed to create ticket");
    if status != TicketStatus::Open {
        let applied = db
            .transition_status(&ticket.id, &[TicketStatus::Open], &StatusUpdate::new(status))
            .await
            .expect("Failed to set status");
        assert!(applied);
    }
    db.get_ticket(&ticket.id)
        .await
        .expect("Failed to reload ticket")
        .expect("Ticket missing")
}
