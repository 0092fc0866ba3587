use crate::domain::entities::{timestamp_now, Engineer};
use crate::domain::errors::DomainResult;
use crate::domain::ports::engineer_repository::EngineerRepository;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::Row;

fn row_to_engineer(row: &AnyRow) -> DomainResult<Engineer> {
    let active: i64 = row.try_get("active")?;
    let on_call: i64 = row.try_get("on_call")?;
    Ok(Engineer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        telegram_id: row.try_get("telegram_id")?,
        phone_number: row.try_get("phone_number")?,
        active: active != 0,
        on_call: on_call != 0,
    })
}

#[async_trait]
impl EngineerRepository for Database {
    async fn create_engineer(&self, engineer: &Engineer) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO engineers (id, name, email, telegram_id, phone_number, active, on_call, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&engineer.id)
        .bind(&engineer.name)
        .bind(engineer.email.clone())
        .bind(engineer.telegram_id.clone())
        .bind(engineer.phone_number.clone())
        .bind(i64::from(engineer.active))
        .bind(i64::from(engineer.on_call))
        .bind(timestamp_now())
        .execute(&self.pool)
        .await?;

        tracing::info!("Engineer created: id={}, name={}", engineer.id, engineer.name);
        Ok(())
    }

    async fn get_engineer(&self, id: &str) -> DomainResult<Option<Engineer>> {
        let row = sqlx::query(
            "SELECT id, name, email, telegram_id, phone_number, active, on_call
             FROM engineers
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_engineer).transpose()
    }

    async fn list_engineers(&self) -> DomainResult<Vec<Engineer>> {
        let rows = sqlx::query(
            "SELECT id, name, email, telegram_id, phone_number, active, on_call
             FROM engineers
             ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_engineer).collect()
    }

    async fn set_active(&self, id: &str, active: bool) -> DomainResult<bool> {
        let result = sqlx::query("UPDATE engineers SET active = ? WHERE id = ?")
            .bind(i64::from(active))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_on_call(&self, id: &str, on_call: bool) -> DomainResult<bool> {
        let result = sqlx::query("UPDATE engineers SET on_call = ? WHERE id = ?")
            .bind(i64::from(on_call))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_on_call_excluding(&self, id: &str) -> DomainResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM engineers WHERE on_call = 1 AND id != ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("count")?)
    }
}
