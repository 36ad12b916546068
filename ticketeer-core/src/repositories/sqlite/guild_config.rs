// src/repositories/sqlite/guild_config.rs

use sqlx::Row;

use ticketeer_common::Error;
use ticketeer_common::models::GuildConfig;
use ticketeer_common::traits::repository_traits as traits;

pub struct GuildConfigRepository {
    pub pool: sqlx::Pool<sqlx::Sqlite>,
}

impl GuildConfigRepository {
    pub fn new(pool: sqlx::Pool<sqlx::Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl traits::GuildConfigRepository for GuildConfigRepository {
    async fn get(&self, guild_id: &str) -> Result<Option<GuildConfig>, Error> {
        let row = sqlx::query(
            "SELECT guild_id, default_log_channel_id FROM guild_config WHERE guild_id = ?",
        )
        .bind(guild_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(r) = row {
            Ok(Some(GuildConfig {
                guild_id: r.try_get("guild_id")?,
                default_log_channel_id: r.try_get("default_log_channel_id")?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn set_default_log_channel(
        &self,
        guild_id: &str,
        channel_id: Option<&str>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO guild_config (guild_id, default_log_channel_id)
            VALUES (?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                default_log_channel_id = excluded.default_log_channel_id
            "#,
        )
        .bind(guild_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
