// ticketeer-core/src/render.rs
//
// Pure builders for everything the engine sends to the platform: panel
// messages, ticket control rows, close/reopen prompts, log embeds, and modal
// form specs. No I/O here; the lifecycle service hands these to the
// `ChatPlatform` seam.

use ticketeer_common::models::{
    Actor, ButtonStyle, Panel, Question, QuestionStyle, Ticket, TicketResponse, TicketType,
};
use ticketeer_common::traits::platform_traits::{
    ActionButton, Attachment, EmbedField, OutboundEmbed, OutboundMessage,
};

pub const COLOR_GREEN: u32 = 0x57f287;
pub const COLOR_RED: u32 = 0xed4245;
pub const COLOR_BLURPLE: u32 = 0x5865f2;
pub const COLOR_YELLOW: u32 = 0xfee75c;

pub const CLOSE_BUTTON_ID: &str = "ticket_close";
pub const CLAIM_BUTTON_ID: &str = "ticket_claim";
pub const UNCLAIM_BUTTON_ID: &str = "ticket_unclaim";
pub const CANCEL_CLOSE_BUTTON_ID: &str = "ticket_cancel_close";
pub const CLOSE_REQUEST_ACCEPT_ID: &str = "close_request_accept";
pub const CLOSE_REQUEST_DENY_ID: &str = "close_request_deny";

pub fn open_button_id(panel_id: i64) -> String {
    format!("ticket_open:{panel_id}")
}

pub fn open_type_button_id(ticket_type_id: i64) -> String {
    format!("ticket_open_type:{ticket_type_id}")
}

pub fn reopen_button_id(ticket_id: i64) -> String {
    format!("ticket_reopen:{ticket_id}")
}

pub fn form_modal_id(ticket_type_id: i64) -> String {
    format!("ticket_form:{ticket_type_id}")
}

pub fn question_field_id(question_id: i64) -> String {
    format!("question_{question_id}")
}

/// Lenient "#rrggbb" parser; anything unparseable falls back to blurple.
pub fn parse_embed_color(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return COLOR_BLURPLE;
    };
    let hex = raw.trim().trim_start_matches('#');
    match u32::from_str_radix(hex, 16) {
        Ok(v) if hex.len() == 6 => v,
        _ => COLOR_BLURPLE,
    }
}

/// Expand a naming template into a platform-safe channel name: tokens
/// `{type}`, `{number}`, `{user}`; lowercased, whitespace collapsed to
/// dashes, truncated to 100 characters.
pub fn channel_name_from_format(
    format: &str,
    type_name: &str,
    number: i64,
    username: &str,
) -> String {
    let expanded = format
        .replace("{type}", type_name)
        .replace("{number}", &number.to_string())
        .replace("{user}", username);

    let mut name = String::with_capacity(expanded.len());
    let mut last_dash = false;
    for c in expanded.to_lowercase().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && last_dash {
            continue;
        }
        last_dash = c == '-';
        name.push(c);
    }

    name.chars().take(100).collect()
}

/// The published panel message: embed plus one action row of open buttons.
/// With typed intake each type gets its own button; without types the panel
/// falls back to a single open button.
pub fn panel_message(panel: &Panel, types: &[TicketType]) -> OutboundMessage {
    let embed = OutboundEmbed {
        title: panel.title.clone(),
        description: panel.description.clone(),
        color: parse_embed_color(panel.embed_color.as_deref()),
        fields: Vec::new(),
        footer: None,
    };

    let buttons = if types.is_empty() {
        vec![ActionButton {
            custom_id: open_button_id(panel.panel_id),
            label: panel.button_label.clone(),
            style: ButtonStyle::Primary,
            disabled: panel.disabled,
            emoji: panel.button_emoji.clone(),
        }]
    } else {
        types
            .iter()
            .map(|tt| ActionButton {
                custom_id: open_type_button_id(tt.ticket_type_id),
                label: tt.name.clone(),
                style: tt.button_style,
                disabled: panel.disabled,
                emoji: tt.emoji.clone(),
            })
            .collect()
    };

    OutboundMessage {
        content: None,
        embed: Some(embed),
        buttons: vec![buttons],
        attachment: None,
    }
}

/// Close/claim controls inside a ticket channel. The claim slot flips
/// between Claim and Unclaim depending on current state.
pub fn ticket_controls(claimed: bool) -> Vec<ActionButton> {
    let mut row = vec![ActionButton {
        custom_id: CLOSE_BUTTON_ID.to_string(),
        label: "Close".to_string(),
        style: ButtonStyle::Danger,
        disabled: false,
        emoji: Some("🔒".to_string()),
    }];
    if claimed {
        row.push(ActionButton {
            custom_id: UNCLAIM_BUTTON_ID.to_string(),
            label: "Unclaim".to_string(),
            style: ButtonStyle::Secondary,
            disabled: false,
            emoji: None,
        });
    } else {
        row.push(ActionButton {
            custom_id: CLAIM_BUTTON_ID.to_string(),
            label: "Claim".to_string(),
            style: ButtonStyle::Success,
            disabled: false,
            emoji: Some("🙋".to_string()),
        });
    }
    row
}

/// First message in a fresh ticket channel: staff ping, welcome embed, the
/// form answers, and the control row.
pub fn welcome_message(
    panel: &Panel,
    ticket_type: Option<&TicketType>,
    ticket: &Ticket,
    responses: &[TicketResponse],
    reopened: bool,
) -> OutboundMessage {
    let ping_role = ticket_type
        .and_then(|tt| tt.staff_role_ids.first().cloned())
        .unwrap_or_else(|| panel.role_id.clone());

    let body = ticket_type
        .and_then(|tt| tt.welcome_message.clone())
        .or_else(|| panel.custom_message.clone())
        .unwrap_or_else(|| {
            "Support will be with you shortly. Describe your issue in as much detail as possible."
                .to_string()
        });

    let mut title = match ticket_type {
        Some(tt) => format!("{} #{}", tt.name, ticket.number),
        None => format!("Ticket #{}", ticket.number),
    };
    if reopened {
        title.push_str(" (reopened)");
    }

    let fields = responses
        .iter()
        .map(|r| EmbedField {
            name: r.label.clone(),
            value: if r.response.is_empty() {
                "*no answer*".to_string()
            } else {
                r.response.clone()
            },
        })
        .collect();

    OutboundMessage {
        content: Some(format!("<@&{}> <@{}>", ping_role, ticket.user_id)),
        embed: Some(OutboundEmbed {
            title,
            description: body,
            color: parse_embed_color(panel.embed_color.as_deref()),
            fields,
            footer: Some(format!("Ticket #{}", ticket.number)),
        }),
        buttons: vec![ticket_controls(false)],
        attachment: None,
    }
}

/// The single cancel affordance the control row swaps to while a deletion
/// countdown is pending.
pub fn closing_controls() -> Vec<ActionButton> {
    vec![ActionButton {
        custom_id: CANCEL_CLOSE_BUTTON_ID.to_string(),
        label: "Cancel Close".to_string(),
        style: ButtonStyle::Secondary,
        disabled: false,
        emoji: None,
    }]
}

/// Countdown notice posted in the channel once a close lands. The cancel
/// button lives on the edited control row, not here.
pub fn closing_message(closed_by: &Actor, delay_seconds: i64) -> OutboundMessage {
    OutboundMessage {
        content: None,
        embed: Some(OutboundEmbed {
            title: "Ticket Closed".to_string(),
            description: format!(
                "Closed by {}. This channel will be deleted in {delay_seconds} seconds.",
                closed_by.username
            ),
            color: COLOR_RED,
            fields: Vec::new(),
            footer: None,
        }),
        buttons: Vec::new(),
        attachment: None,
    }
}

/// Log-channel record for an open or reopen.
pub fn open_log_message(ticket: &Ticket, reopened: bool) -> OutboundMessage {
    let title = if reopened {
        format!("Ticket #{} reopened", ticket.number)
    } else {
        format!("Ticket #{} opened", ticket.number)
    };
    OutboundMessage {
        content: None,
        embed: Some(OutboundEmbed {
            title,
            description: format!("Opened by <@{}> in <#{}>.", ticket.user_id, ticket.channel_id),
            color: COLOR_GREEN,
            fields: Vec::new(),
            footer: None,
        }),
        buttons: Vec::new(),
        attachment: None,
    }
}

/// Staff-initiated close request prompt, answered by the opener.
pub fn close_request_message(
    requested_by: &Actor,
    reason: Option<&str>,
    deadline_seconds: Option<i64>,
) -> OutboundMessage {
    let mut description = format!("{} has requested to close this ticket.", requested_by.username);
    if let Some(reason) = reason {
        description.push_str(&format!("\n**Reason:** {reason}"));
    }
    if let Some(secs) = deadline_seconds {
        description.push_str(&format!(
            "\nWithout an answer it will close automatically in {secs} seconds."
        ));
    }

    OutboundMessage {
        content: None,
        embed: Some(OutboundEmbed {
            title: "Close Request".to_string(),
            description,
            color: COLOR_YELLOW,
            fields: Vec::new(),
            footer: None,
        }),
        buttons: vec![vec![
            ActionButton {
                custom_id: CLOSE_REQUEST_ACCEPT_ID.to_string(),
                label: "Accept & Close".to_string(),
                style: ButtonStyle::Success,
                disabled: false,
                emoji: None,
            },
            ActionButton {
                custom_id: CLOSE_REQUEST_DENY_ID.to_string(),
                label: "Keep Open".to_string(),
                style: ButtonStyle::Danger,
                disabled: false,
                emoji: None,
            },
        ]],
        attachment: None,
    }
}

pub fn reopen_row(ticket_id: i64, disabled: bool) -> Vec<ActionButton> {
    vec![ActionButton {
        custom_id: reopen_button_id(ticket_id),
        label: "Reopen".to_string(),
        style: ButtonStyle::Secondary,
        disabled,
        emoji: None,
    }]
}

/// Log-channel record for a close: who opened, who closed, claim state,
/// reason, transcript attached, reopen button below.
pub fn close_log_message(
    ticket: &Ticket,
    closed_by: &Actor,
    reason: Option<&str>,
    transcript: Option<Attachment>,
) -> OutboundMessage {
    let mut fields = vec![
        EmbedField {
            name: "Opened by".to_string(),
            value: format!("<@{}>", ticket.user_id),
        },
        EmbedField {
            name: "Closed by".to_string(),
            value: closed_by.username.clone(),
        },
    ];
    if let Some(claimer) = &ticket.claimed_by {
        fields.push(EmbedField {
            name: "Claimed by".to_string(),
            value: format!("<@{claimer}>"),
        });
    }
    if let Some(reason) = reason {
        fields.push(EmbedField {
            name: "Reason".to_string(),
            value: reason.to_string(),
        });
    }

    OutboundMessage {
        content: None,
        embed: Some(OutboundEmbed {
            title: format!("Ticket #{} closed", ticket.number),
            description: String::new(),
            color: COLOR_RED,
            fields,
            footer: None,
        }),
        buttons: vec![reopen_row(ticket.ticket_id, false)],
        attachment: transcript,
    }
}

/// One modal input field.
#[derive(Debug, Clone)]
pub struct FormField {
    pub custom_id: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub style: QuestionStyle,
    pub required: bool,
    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
}

/// A modal form the embedding layer shows before creating the ticket.
#[derive(Debug, Clone)]
pub struct FormSpec {
    pub custom_id: String,
    pub title: String,
    pub fields: Vec<FormField>,
}

/// Build the intake form for a type. Platforms cap modals at five inputs;
/// anything past that is dropped in order.
pub fn form_spec(ticket_type: &TicketType, questions: &[Question]) -> FormSpec {
    FormSpec {
        custom_id: form_modal_id(ticket_type.ticket_type_id),
        title: ticket_type.name.clone(),
        fields: questions
            .iter()
            .take(5)
            .map(|q| FormField {
                custom_id: question_field_id(q.question_id),
                label: q.label.clone(),
                placeholder: q.placeholder.clone(),
                style: q.style,
                required: q.required,
                min_length: q.min_length,
                max_length: q.max_length,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_expands_tokens_and_normalizes() {
        let name = channel_name_from_format("{type}-{number}", "Bug Report", 7, "someone");
        assert_eq!(name, "bug-report-7");

        let name = channel_name_from_format("help {user}", "x", 1, "Some User");
        assert_eq!(name, "help-some-user");
    }

    #[test]
    fn naming_truncates_to_100() {
        let long = "x".repeat(300);
        let name = channel_name_from_format("{user}", "t", 1, &long);
        assert_eq!(name.chars().count(), 100);
    }

    #[test]
    fn color_parsing_is_lenient() {
        assert_eq!(parse_embed_color(Some("#57f287")), COLOR_GREEN);
        assert_eq!(parse_embed_color(Some("ed4245")), COLOR_RED);
        assert_eq!(parse_embed_color(Some("not-a-color")), COLOR_BLURPLE);
        assert_eq!(parse_embed_color(None), COLOR_BLURPLE);
    }

    #[test]
    fn panel_without_types_gets_single_button() {
        let panel = Panel {
            panel_id: 3,
            guild_id: "g".into(),
            channel_id: "c".into(),
            message_id: None,
            role_id: "r".into(),
            category_id: None,
            title: "Support".into(),
            description: "desc".into(),
            button_label: "Open Ticket".into(),
            button_emoji: None,
            custom_message: None,
            embed_color: None,
            log_channel_id: None,
            auto_close_days: None,
            disabled: false,
            created_at: chrono::Utc::now(),
        };
        let msg = panel_message(&panel, &[]);
        assert_eq!(msg.buttons.len(), 1);
        assert_eq!(msg.buttons[0].len(), 1);
        assert_eq!(msg.buttons[0][0].custom_id, "ticket_open:3");
    }

    #[test]
    fn controls_flip_between_claim_and_unclaim() {
        let unclaimed = ticket_controls(false);
        assert!(unclaimed.iter().any(|b| b.custom_id == CLAIM_BUTTON_ID));
        let claimed = ticket_controls(true);
        assert!(claimed.iter().any(|b| b.custom_id == UNCLAIM_BUTTON_ID));
    }
}
