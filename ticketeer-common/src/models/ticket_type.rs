use chrono::{DateTime, Utc};

/// Visual style of a panel button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

impl ButtonStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonStyle::Primary => "Primary",
            ButtonStyle::Secondary => "Secondary",
            ButtonStyle::Success => "Success",
            ButtonStyle::Danger => "Danger",
        }
    }

    /// Unknown strings fall back to Primary, matching how stored values were
    /// treated before the enum existed.
    pub fn parse(s: &str) -> ButtonStyle {
        match s {
            "Secondary" => ButtonStyle::Secondary,
            "Success" => ButtonStyle::Success,
            "Danger" => ButtonStyle::Danger,
            _ => ButtonStyle::Primary,
        }
    }
}

/// A named intake variant under a panel: its own button, category, staff
/// roles, form, and close behavior.
#[derive(Debug, Clone)]
pub struct TicketType {
    pub ticket_type_id: i64,
    pub panel_id: i64,
    pub name: String,
    pub emoji: Option<String>,
    pub button_style: ButtonStyle,
    pub category_id: Option<String>,
    pub staff_role_ids: Vec<String>,
    pub welcome_message: Option<String>,
    /// Channel-name template; tokens `{type}`, `{number}`, `{user}`.
    pub naming_format: String,
    pub auto_close_days: Option<i64>,
    /// Countdown between close and channel deletion, clamped to 0–300.
    pub delete_delay_seconds: i64,
    pub dm_transcript: bool,
    pub allow_duplicate: bool,
    pub log_channel_id: Option<String>,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_NAMING_FORMAT: &str = "{type}-{number}";
pub const DEFAULT_DELETE_DELAY_SECONDS: i64 = 5;
pub const MAX_DELETE_DELAY_SECONDS: i64 = 300;

#[derive(Debug, Clone, Default)]
pub struct NewTicketType {
    pub panel_id: i64,
    pub name: String,
    pub emoji: Option<String>,
    pub button_style: Option<ButtonStyle>,
    pub category_id: Option<String>,
    pub staff_role_ids: Vec<String>,
    pub welcome_message: Option<String>,
    pub naming_format: Option<String>,
    pub auto_close_days: Option<i64>,
    pub delete_delay_seconds: Option<i64>,
    pub dm_transcript: bool,
    pub allow_duplicate: bool,
    pub log_channel_id: Option<String>,
    pub order_index: i64,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        ButtonStyle::Primary
    }
}
