use chrono::{DateTime, Utc};

/// A published intake point: one message with open-ticket buttons in one
/// channel of one guild.
#[derive(Debug, Clone)]
pub struct Panel {
    pub panel_id: i64,
    pub guild_id: String,
    pub channel_id: String,
    /// Message id of the posted panel, once posted.
    pub message_id: Option<String>,
    /// Default staff role, pinged and granted access when no type override exists.
    pub role_id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: String,
    pub button_label: String,
    pub button_emoji: Option<String>,
    /// Welcome override for the legacy single-button path.
    pub custom_message: Option<String>,
    /// Hex string like "#5865f2"; parsed leniently.
    pub embed_color: Option<String>,
    pub log_channel_id: Option<String>,
    pub auto_close_days: Option<i64>,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a panel; the store assigns id and creation time.
#[derive(Debug, Clone, Default)]
pub struct NewPanel {
    pub guild_id: String,
    pub channel_id: String,
    pub role_id: String,
    pub category_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub button_label: Option<String>,
    pub button_emoji: Option<String>,
    pub custom_message: Option<String>,
    pub embed_color: Option<String>,
    pub log_channel_id: Option<String>,
    pub auto_close_days: Option<i64>,
}
