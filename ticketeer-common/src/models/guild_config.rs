/// Per-guild defaults, upserted as a singleton row.
#[derive(Debug, Clone)]
pub struct GuildConfig {
    pub guild_id: String,
    pub default_log_channel_id: Option<String>,
}
