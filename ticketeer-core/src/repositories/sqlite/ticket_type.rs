// src/repositories/sqlite/ticket_type.rs

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use ticketeer_common::Error;
use ticketeer_common::models::ticket_type::{
    DEFAULT_DELETE_DELAY_SECONDS, DEFAULT_NAMING_FORMAT, MAX_DELETE_DELAY_SECONDS,
};
use ticketeer_common::models::{ButtonStyle, NewTicketType, TicketType};
use ticketeer_common::traits::repository_traits as traits;

use crate::utils::time::{current_epoch, from_epoch};

pub struct TicketTypeRepository {
    pub pool: sqlx::Pool<sqlx::Sqlite>,
}

impl TicketTypeRepository {
    pub fn new(pool: sqlx::Pool<sqlx::Sqlite>) -> Self {
        Self { pool }
    }
}

// staff_role_ids is stored as a JSON array of role id strings.
fn roles_to_json(roles: &[String]) -> Result<String, Error> {
    Ok(serde_json::to_string(roles)?)
}

fn roles_from_json(raw: Option<String>) -> Result<Vec<String>, Error> {
    match raw {
        Some(s) if !s.is_empty() => Ok(serde_json::from_str(&s)?),
        _ => Ok(Vec::new()),
    }
}

fn type_from_row(r: &SqliteRow) -> Result<TicketType, Error> {
    Ok(TicketType {
        ticket_type_id: r.try_get("ticket_type_id")?,
        panel_id: r.try_get("panel_id")?,
        name: r.try_get("name")?,
        emoji: r.try_get("emoji")?,
        button_style: ButtonStyle::parse(r.try_get::<String, _>("button_style")?.as_str()),
        category_id: r.try_get("category_id")?,
        staff_role_ids: roles_from_json(r.try_get("staff_role_ids")?)?,
        welcome_message: r.try_get("welcome_message")?,
        naming_format: r.try_get("naming_format")?,
        auto_close_days: r.try_get("auto_close_days")?,
        delete_delay_seconds: r.try_get("delete_delay_seconds")?,
        dm_transcript: r.try_get("dm_transcript")?,
        allow_duplicate: r.try_get("allow_duplicate")?,
        log_channel_id: r.try_get("log_channel_id")?,
        order_index: r.try_get("order_index")?,
        created_at: from_epoch(r.try_get::<i64, _>("created_at")?),
    })
}

const TYPE_COLUMNS: &str = r#"
    ticket_type_id, panel_id, name, emoji, button_style, category_id,
    staff_role_ids, welcome_message, naming_format, auto_close_days,
    delete_delay_seconds, dm_transcript, allow_duplicate, log_channel_id,
    order_index, created_at
"#;

#[async_trait::async_trait]
impl traits::TicketTypeRepository for TicketTypeRepository {
    async fn create(&self, ticket_type: &NewTicketType) -> Result<i64, Error> {
        let style = ticket_type.button_style.unwrap_or_default();
        let naming_format = ticket_type
            .naming_format
            .as_deref()
            .unwrap_or(DEFAULT_NAMING_FORMAT);
        let delete_delay = ticket_type
            .delete_delay_seconds
            .unwrap_or(DEFAULT_DELETE_DELAY_SECONDS)
            .clamp(0, MAX_DELETE_DELAY_SECONDS);

        let result = sqlx::query(
            r#"
            INSERT INTO ticket_types (
                panel_id, name, emoji, button_style, category_id,
                staff_role_ids, welcome_message, naming_format, auto_close_days,
                delete_delay_seconds, dm_transcript, allow_duplicate,
                log_channel_id, order_index, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(ticket_type.panel_id)
        .bind(&ticket_type.name)
        .bind(&ticket_type.emoji)
        .bind(style.as_str())
        .bind(&ticket_type.category_id)
        .bind(roles_to_json(&ticket_type.staff_role_ids)?)
        .bind(&ticket_type.welcome_message)
        .bind(naming_format)
        .bind(ticket_type.auto_close_days)
        .bind(delete_delay)
        .bind(ticket_type.dm_transcript)
        .bind(ticket_type.allow_duplicate)
        .bind(&ticket_type.log_channel_id)
        .bind(ticket_type.order_index)
        .bind(current_epoch())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, ticket_type_id: i64) -> Result<Option<TicketType>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {TYPE_COLUMNS} FROM ticket_types WHERE ticket_type_id = ?"
        ))
        .bind(ticket_type_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(type_from_row).transpose()
    }

    async fn list_for_panel(&self, panel_id: i64) -> Result<Vec<TicketType>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {TYPE_COLUMNS} FROM ticket_types
             WHERE panel_id = ?
             ORDER BY order_index, ticket_type_id"
        ))
        .bind(panel_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(type_from_row).collect()
    }

    async fn count_for_panel(&self, panel_id: i64) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM ticket_types WHERE panel_id = ?")
            .bind(panel_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("cnt")?)
    }

    async fn update(&self, ticket_type: &TicketType) -> Result<(), Error> {
        let delete_delay = ticket_type
            .delete_delay_seconds
            .clamp(0, MAX_DELETE_DELAY_SECONDS);

        sqlx::query(
            r#"
            UPDATE ticket_types
            SET name = ?,
                emoji = ?,
                button_style = ?,
                category_id = ?,
                staff_role_ids = ?,
                welcome_message = ?,
                naming_format = ?,
                auto_close_days = ?,
                delete_delay_seconds = ?,
                dm_transcript = ?,
                allow_duplicate = ?,
                log_channel_id = ?,
                order_index = ?
            WHERE ticket_type_id = ?
            "#,
        )
        .bind(&ticket_type.name)
        .bind(&ticket_type.emoji)
        .bind(ticket_type.button_style.as_str())
        .bind(&ticket_type.category_id)
        .bind(roles_to_json(&ticket_type.staff_role_ids)?)
        .bind(&ticket_type.welcome_message)
        .bind(&ticket_type.naming_format)
        .bind(ticket_type.auto_close_days)
        .bind(delete_delay)
        .bind(ticket_type.dm_transcript)
        .bind(ticket_type.allow_duplicate)
        .bind(&ticket_type.log_channel_id)
        .bind(ticket_type.order_index)
        .bind(ticket_type.ticket_type_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, ticket_type_id: i64) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM ticket_questions WHERE ticket_type_id = ?")
            .bind(ticket_type_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM ticket_types WHERE ticket_type_id = ?")
            .bind(ticket_type_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
