// src/repositories/sqlite/ticket.rs

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use ticketeer_common::Error;
use ticketeer_common::models::{ResponseDraft, Ticket, TicketResponse, TicketStatus};
use ticketeer_common::traits::repository_traits as traits;

use crate::utils::time::{current_epoch, from_epoch, to_epoch};

pub struct TicketRepository {
    pub pool: sqlx::Pool<sqlx::Sqlite>,
}

impl TicketRepository {
    pub fn new(pool: sqlx::Pool<sqlx::Sqlite>) -> Self {
        Self { pool }
    }
}

fn ticket_from_row(r: &SqliteRow) -> Result<Ticket, Error> {
    let status_raw: String = r.try_get("status")?;
    let status = TicketStatus::parse(&status_raw)
        .ok_or_else(|| Error::InvalidState(format!("unknown ticket status '{status_raw}'")))?;

    Ok(Ticket {
        ticket_id: r.try_get("ticket_id")?,
        panel_id: r.try_get("panel_id")?,
        ticket_type_id: r.try_get("ticket_type_id")?,
        channel_id: r.try_get("channel_id")?,
        user_id: r.try_get("user_id")?,
        number: r.try_get("number")?,
        status,
        claimed_by: r.try_get("claimed_by")?,
        claimed_at: r
            .try_get::<Option<i64>, _>("claimed_at")?
            .map(from_epoch),
        reopened: r.try_get("reopened")?,
        created_at: from_epoch(r.try_get::<i64, _>("created_at")?),
        last_message_at: r
            .try_get::<Option<i64>, _>("last_message_at")?
            .map(from_epoch),
        closed_at: r.try_get::<Option<i64>, _>("closed_at")?.map(from_epoch),
    })
}

const TICKET_COLUMNS: &str = r#"
    ticket_id, panel_id, ticket_type_id, channel_id, user_id, number,
    status, claimed_by, claimed_at, reopened, created_at, last_message_at,
    closed_at
"#;

#[async_trait::async_trait]
impl traits::TicketRepository for TicketRepository {
    async fn create(
        &self,
        panel_id: i64,
        ticket_type_id: Option<i64>,
        channel_id: &str,
        user_id: &str,
    ) -> Result<Ticket, Error> {
        // Number allocation and insert share one transaction so concurrent
        // opens under the same panel never collide.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT COALESCE(MAX(number), 0) + 1 AS next FROM tickets WHERE panel_id = ?",
        )
        .bind(panel_id)
        .fetch_one(&mut *tx)
        .await?;
        let number: i64 = row.try_get("next")?;

        let result = sqlx::query(
            r#"
            INSERT INTO tickets (panel_id, ticket_type_id, channel_id, user_id, number,
                                 status, reopened, created_at)
            VALUES (?, ?, ?, ?, ?, 'open', 0, ?)
            "#,
        )
        .bind(panel_id)
        .bind(ticket_type_id)
        .bind(channel_id)
        .bind(user_id)
        .bind(number)
        .bind(current_epoch())
        .execute(&mut *tx)
        .await?;

        let ticket_id = result.last_insert_rowid();
        tx.commit().await?;

        self.get(ticket_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id} just inserted")))
    }

    async fn get(&self, ticket_id: i64) -> Result<Option<Ticket>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ?"
        ))
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn get_active_by_channel(&self, channel_id: &str) -> Result<Option<Ticket>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets
             WHERE channel_id = ? AND status IN ('open', 'closing')
             ORDER BY ticket_id DESC
             LIMIT 1"
        ))
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn next_number(&self, panel_id: i64) -> Result<i64, Error> {
        let row = sqlx::query(
            "SELECT COALESCE(MAX(number), 0) + 1 AS next FROM tickets WHERE panel_id = ?",
        )
        .bind(panel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("next")?)
    }

    async fn open_count_for_panel(&self, panel_id: i64) -> Result<i64, Error> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM tickets
             WHERE panel_id = ? AND status IN ('open', 'closing')",
        )
        .bind(panel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("cnt")?)
    }

    async fn has_open_for_panel(&self, panel_id: i64, user_id: &str) -> Result<bool, Error> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM tickets
             WHERE panel_id = ? AND user_id = ? AND status IN ('open', 'closing')",
        )
        .bind(panel_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get::<i64, _>("cnt")? > 0)
    }

    async fn has_open_for_type(&self, ticket_type_id: i64, user_id: &str) -> Result<bool, Error> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM tickets
             WHERE ticket_type_id = ? AND user_id = ? AND status IN ('open', 'closing')",
        )
        .bind(ticket_type_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get::<i64, _>("cnt")? > 0)
    }

    async fn set_status(&self, channel_id: &str, status: TicketStatus) -> Result<(), Error> {
        sqlx::query(
            "UPDATE tickets SET status = ? WHERE channel_id = ? AND status != 'closed'",
        )
        .bind(status.as_str())
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_closed(&self, channel_id: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE tickets
            SET status = 'closed', closed_at = ?
            WHERE channel_id = ? AND status IN ('open', 'closing')
            "#,
        )
        .bind(current_epoch())
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_claimed(&self, channel_id: &str, user_id: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE tickets
            SET claimed_by = ?, claimed_at = ?
            WHERE channel_id = ? AND status != 'closed'
            "#,
        )
        .bind(user_id)
        .bind(current_epoch())
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_claimed(&self, channel_id: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE tickets
            SET claimed_by = NULL, claimed_at = NULL
            WHERE channel_id = ? AND status != 'closed'
            "#,
        )
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn touch_last_message(&self, channel_id: &str) -> Result<(), Error> {
        sqlx::query(
            "UPDATE tickets SET last_message_at = ? WHERE channel_id = ? AND status = 'open'",
        )
        .bind(current_epoch())
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_reopened(&self, ticket_id: i64) -> Result<(), Error> {
        sqlx::query("UPDATE tickets SET reopened = 1 WHERE ticket_id = ?")
            .bind(ticket_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn autoclose_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Ticket>, Error> {
        // Inactivity threshold: type override wins over the panel default;
        // a ticket with neither never auto-closes.
        let rows = sqlx::query(
            r#"
            SELECT t.ticket_id, t.panel_id, t.ticket_type_id, t.channel_id, t.user_id,
                   t.number, t.status, t.claimed_by, t.claimed_at, t.reopened,
                   t.created_at, t.last_message_at, t.closed_at
            FROM tickets t
            JOIN panels p ON p.panel_id = t.panel_id
            LEFT JOIN ticket_types tt ON tt.ticket_type_id = t.ticket_type_id
            WHERE t.status = 'open'
              AND COALESCE(tt.auto_close_days, p.auto_close_days) IS NOT NULL
              AND COALESCE(t.last_message_at, t.created_at)
                  + COALESCE(tt.auto_close_days, p.auto_close_days) * 86400 <= ?
            "#,
        )
        .bind(to_epoch(now))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(ticket_from_row).collect()
    }

    async fn reset_closing_tickets(&self) -> Result<u64, Error> {
        let result = sqlx::query("UPDATE tickets SET status = 'open' WHERE status = 'closing'")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_responses(
        &self,
        ticket_id: i64,
        responses: &[ResponseDraft],
    ) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        for draft in responses {
            sqlx::query(
                r#"
                INSERT INTO ticket_responses (ticket_id, question_id, question_label, response)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(ticket_id)
            .bind(draft.question_id)
            .bind(&draft.label)
            .bind(&draft.response)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_responses(&self, ticket_id: i64) -> Result<Vec<TicketResponse>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT response_id, ticket_id, question_id, question_label, response
            FROM ticket_responses
            WHERE ticket_id = ?
            ORDER BY response_id
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(TicketResponse {
                    response_id: r.try_get("response_id")?,
                    ticket_id: r.try_get("ticket_id")?,
                    question_id: r.try_get("question_id")?,
                    label: r.try_get("question_label")?,
                    response: r
                        .try_get::<Option<String>, _>("response")?
                        .unwrap_or_default(),
                })
            })
            .collect()
    }
}
