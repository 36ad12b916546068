// src/repositories/sqlite/panel.rs

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use ticketeer_common::Error;
use ticketeer_common::models::{NewPanel, Panel};
use ticketeer_common::traits::repository_traits as traits;

use crate::utils::time::{current_epoch, from_epoch};

const DEFAULT_TITLE: &str = "Support Tickets";
const DEFAULT_DESCRIPTION: &str = "Click the button below to open a ticket.";
const DEFAULT_BUTTON_LABEL: &str = "Open Ticket";

pub struct PanelRepository {
    pub pool: sqlx::Pool<sqlx::Sqlite>,
}

impl PanelRepository {
    pub fn new(pool: sqlx::Pool<sqlx::Sqlite>) -> Self {
        Self { pool }
    }
}

fn panel_from_row(r: &SqliteRow) -> Result<Panel, Error> {
    Ok(Panel {
        panel_id: r.try_get("panel_id")?,
        guild_id: r.try_get("guild_id")?,
        channel_id: r.try_get("channel_id")?,
        message_id: r.try_get("message_id")?,
        role_id: r.try_get("role_id")?,
        category_id: r.try_get("category_id")?,
        title: r.try_get("title")?,
        description: r.try_get("description")?,
        button_label: r.try_get("button_label")?,
        button_emoji: r.try_get("button_emoji")?,
        custom_message: r.try_get("custom_message")?,
        embed_color: r.try_get("embed_color")?,
        log_channel_id: r.try_get("log_channel_id")?,
        auto_close_days: r.try_get("auto_close_days")?,
        disabled: r.try_get("disabled")?,
        created_at: from_epoch(r.try_get::<i64, _>("created_at")?),
    })
}

const PANEL_COLUMNS: &str = r#"
    panel_id, guild_id, channel_id, message_id, role_id, category_id,
    title, description, button_label, button_emoji, custom_message,
    embed_color, log_channel_id, auto_close_days, disabled, created_at
"#;

#[async_trait::async_trait]
impl traits::PanelRepository for PanelRepository {
    async fn create(&self, panel: &NewPanel) -> Result<i64, Error> {
        let title = panel.title.as_deref().unwrap_or(DEFAULT_TITLE);
        let description = panel.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION);
        let button_label = panel.button_label.as_deref().unwrap_or(DEFAULT_BUTTON_LABEL);

        let result = sqlx::query(
            r#"
            INSERT INTO panels (
                guild_id, channel_id, role_id, category_id,
                title, description, button_label, button_emoji,
                custom_message, embed_color, log_channel_id, auto_close_days,
                disabled, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&panel.guild_id)
        .bind(&panel.channel_id)
        .bind(&panel.role_id)
        .bind(&panel.category_id)
        .bind(title)
        .bind(description)
        .bind(button_label)
        .bind(&panel.button_emoji)
        .bind(&panel.custom_message)
        .bind(&panel.embed_color)
        .bind(&panel.log_channel_id)
        .bind(panel.auto_close_days)
        .bind(current_epoch())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, panel_id: i64) -> Result<Option<Panel>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {PANEL_COLUMNS} FROM panels WHERE panel_id = ?"
        ))
        .bind(panel_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(panel_from_row).transpose()
    }

    async fn get_by_title(&self, guild_id: &str, title: &str) -> Result<Option<Panel>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {PANEL_COLUMNS} FROM panels
             WHERE guild_id = ? AND LOWER(TRIM(title)) = LOWER(TRIM(?))"
        ))
        .bind(guild_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(panel_from_row).transpose()
    }

    async fn list_for_guild(&self, guild_id: &str) -> Result<Vec<Panel>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {PANEL_COLUMNS} FROM panels WHERE guild_id = ? ORDER BY panel_id"
        ))
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(panel_from_row).collect()
    }

    async fn count_for_guild(&self, guild_id: &str) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM panels WHERE guild_id = ?")
            .bind(guild_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("cnt")?)
    }

    async fn update(&self, panel: &Panel) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE panels
            SET channel_id = ?,
                role_id = ?,
                category_id = ?,
                title = ?,
                description = ?,
                button_label = ?,
                button_emoji = ?,
                custom_message = ?,
                embed_color = ?,
                log_channel_id = ?,
                auto_close_days = ?,
                disabled = ?
            WHERE panel_id = ?
            "#,
        )
        .bind(&panel.channel_id)
        .bind(&panel.role_id)
        .bind(&panel.category_id)
        .bind(&panel.title)
        .bind(&panel.description)
        .bind(&panel.button_label)
        .bind(&panel.button_emoji)
        .bind(&panel.custom_message)
        .bind(&panel.embed_color)
        .bind(&panel.log_channel_id)
        .bind(panel.auto_close_days)
        .bind(panel.disabled)
        .bind(panel.panel_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_message_id(&self, panel_id: i64, message_id: Option<&str>) -> Result<(), Error> {
        sqlx::query("UPDATE panels SET message_id = ? WHERE panel_id = ?")
            .bind(message_id)
            .bind(panel_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_disabled(&self, panel_id: i64, disabled: bool) -> Result<(), Error> {
        sqlx::query("UPDATE panels SET disabled = ? WHERE panel_id = ?")
            .bind(disabled)
            .bind(panel_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_cascade(&self, panel_id: i64) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM ticket_responses
            WHERE ticket_id IN (SELECT ticket_id FROM tickets WHERE panel_id = ?)
            "#,
        )
        .bind(panel_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM tickets WHERE panel_id = ?")
            .bind(panel_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            DELETE FROM ticket_questions
            WHERE ticket_type_id IN (SELECT ticket_type_id FROM ticket_types WHERE panel_id = ?)
            "#,
        )
        .bind(panel_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM ticket_types WHERE panel_id = ?")
            .bind(panel_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM panels WHERE panel_id = ?")
            .bind(panel_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
