use crate::domain::entities::{
    timestamp_now, NewTicketAction, Platform, StatusUpdate, Ticket, TicketAction, TicketStatus,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::Row;

const TICKET_COLUMNS: &str = "id, platform, thread_id, status, user_external_id, \
     current_engineer_id, severity, last_activity_at, received_at";

const ACTION_COLUMNS: &str = "id, ticket_id, action_type, actor_external_id, actor_engineer_id, \
     content, severity, escalation_method, retry_count, success, created_at";

fn row_to_ticket(row: &AnyRow) -> DomainResult<Ticket> {
    let platform: String = row.try_get("platform")?;
    let status: String = row.try_get("status")?;
    Ok(Ticket {
        id: row.try_get("id")?,
        platform: platform.parse()?,
        thread_id: row.try_get("thread_id")?,
        status: status.parse()?,
        user_external_id: row.try_get("user_external_id")?,
        current_engineer_id: row.try_get("current_engineer_id")?,
        severity: row.try_get("severity")?,
        last_activity_at: row.try_get("last_activity_at")?,
        received_at: row.try_get("received_at")?,
    })
}

fn row_to_action(row: &AnyRow) -> DomainResult<TicketAction> {
    let kind: String = row.try_get("action_type")?;
    let method: Option<String> = row.try_get("escalation_method")?;
    // SQLite has no boolean type; stored as 0/1
    let success: Option<i64> = row.try_get("success")?;
    Ok(TicketAction {
        id: row.try_get("id")?,
        ticket_id: row.try_get("ticket_id")?,
        kind: kind.parse()?,
        actor_external_id: row.try_get("actor_external_id")?,
        actor_engineer_id: row.try_get("actor_engineer_id")?,
        content: row.try_get("content")?,
        severity: row.try_get("severity")?,
        escalation_method: method.map(|m| m.parse()).transpose()?,
        retry_count: row.try_get("retry_count")?,
        success: success.map(|v| v != 0),
        created_at: row.try_get("created_at")?,
    })
}

impl Database {
    async fn fetch_ticket_by_thread(
        &self,
        platform: Platform,
        thread_id: &str,
    ) -> DomainResult<Option<Ticket>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE platform = ? AND thread_id = ?",
            TICKET_COLUMNS
        ))
        .bind(platform.as_str())
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_ticket).transpose()
    }
}

#[async_trait]
impl TicketRepository for Database {
    async fn find_or_create_ticket(
        &self,
        platform: Platform,
        thread_id: &str,
        user_external_id: &str,
    ) -> DomainResult<(Ticket, bool)> {
        let now = timestamp_now();
        let id = uuid::Uuid::new_v4().to_string();

        // The unique (platform, thread_id) index decides the race between
        // two messages creating the same thread
        let inserted = sqlx::query(
            "INSERT INTO tickets (id, platform, thread_id, status, user_external_id, last_activity_at, received_at)
             VALUES (?, ?, ?, 'open', ?, ?, ?)
             ON CONFLICT(platform, thread_id) DO NOTHING",
        )
        .bind(&id)
        .bind(platform.as_str())
        .bind(thread_id)
        .bind(user_external_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        if inserted {
            tracing::info!(
                "Ticket created: id={}, platform={}, thread_id={}",
                id,
                platform,
                thread_id
            );
        } else {
            sqlx::query(
                "UPDATE tickets SET last_activity_at = ? WHERE platform = ? AND thread_id = ?",
            )
            .bind(&now)
            .bind(platform.as_str())
            .bind(thread_id)
            .execute(&self.pool)
            .await?;
        }

        let ticket = self
            .fetch_ticket_by_thread(platform, thread_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(format!("Ticket for thread {} vanished after upsert", thread_id))
            })?;

        Ok((ticket, inserted))
    }

    async fn touch_ticket(&self, id: &str) -> DomainResult<bool> {
        let result = sqlx::query("UPDATE tickets SET last_activity_at = ? WHERE id = ?")
            .bind(timestamp_now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_ticket(&self, id: &str) -> DomainResult<Option<Ticket>> {
        let row = sqlx::query(&format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_ticket).transpose()
    }

    async fn get_ticket_status(&self, id: &str) -> DomainResult<Option<TicketStatus>> {
        let row = sqlx::query("SELECT status FROM tickets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let status: String = row.try_get("status")?;
                Ok(Some(status.parse()?))
            }
            None => Ok(None),
        }
    }

    async fn transition_status(
        &self,
        id: &str,
        expected: &[TicketStatus],
        update: &StatusUpdate,
    ) -> DomainResult<bool> {
        if expected.is_empty() {
            return Ok(false);
        }

        let mut builder = sqlx::QueryBuilder::<sqlx::Any>::new("UPDATE tickets SET status = ");
        builder.push_bind(update.status.as_str());
        builder.push(", last_activity_at = ");
        builder.push_bind(update.last_activity_at.clone());
        if let Some(engineer_id) = &update.current_engineer_id {
            builder.push(", current_engineer_id = ");
            builder.push_bind(engineer_id.clone());
        }
        if let Some(severity) = update.severity {
            builder.push(", severity = ");
            builder.push_bind(severity);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id.to_string());
        builder.push(" AND status IN (");
        let mut separated = builder.separated(", ");
        for status in expected {
            separated.push_bind(status.as_str());
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.pool).await?;
        let applied = result.rows_affected() > 0;

        if applied {
            tracing::debug!("Ticket {} status set to {}", id, update.status);
        }
        Ok(applied)
    }

    async fn append_action(&self, action: &NewTicketAction) -> DomainResult<TicketAction> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = timestamp_now();

        sqlx::query(&format!(
            "INSERT INTO ticket_actions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            ACTION_COLUMNS
        ))
        .bind(&id)
        .bind(&action.ticket_id)
        .bind(action.kind.as_str())
        .bind(action.actor_external_id.clone())
        .bind(action.actor_engineer_id.clone())
        .bind(&action.content)
        .bind(action.severity)
        .bind(action.escalation_method.map(|m| m.as_str().to_string()))
        .bind(action.retry_count)
        .bind(action.success.map(i64::from))
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(TicketAction {
            id,
            ticket_id: action.ticket_id.clone(),
            kind: action.kind,
            actor_external_id: action.actor_external_id.clone(),
            actor_engineer_id: action.actor_engineer_id.clone(),
            content: action.content.clone(),
            severity: action.severity,
            escalation_method: action.escalation_method,
            retry_count: action.retry_count,
            success: action.success,
            created_at,
        })
    }

    async fn list_actions(&self, ticket_id: &str) -> DomainResult<Vec<TicketAction>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM ticket_actions WHERE ticket_id = ? ORDER BY created_at ASC, rowid ASC",
            ACTION_COLUMNS
        ))
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_action).collect()
    }

    async fn list_recent_tickets(&self, limit: i64) -> DomainResult<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tickets ORDER BY last_activity_at DESC, rowid DESC LIMIT ?",
            TICKET_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_ticket).collect()
    }
}
