// ticketeer-core/src/services/lifecycle.rs
//
// The lifecycle orchestrator: every ticket mutation flows through here.
// Operations serialize on a per-channel async lock (panel-keyed for opens),
// then act on the store, the timer registry, and the platform in a fixed
// order. Countdown expiry, cancel, accept, and deny all race by removing
// the registry entry first, so exactly one of them acts.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use ticketeer_common::models::ticket_type::{
    DEFAULT_DELETE_DELAY_SECONDS, MAX_DELETE_DELAY_SECONDS,
};
use ticketeer_common::models::{
    Actor, Panel, ResponseDraft, Ticket, TicketResponse, TicketStatus, TicketType,
};
use ticketeer_common::traits::platform_traits::{
    ActionButton, Attachment, ChatPlatform, CreateChannelRequest, MessageRef, OutboundMessage,
    OverwriteTarget, PermissionOverwrite, TranscriptRenderer,
};
use ticketeer_common::traits::repository_traits::{
    GuildConfigRepository, PanelRepository, QuestionRepository, TicketRepository,
    TicketTypeRepository,
};
use ticketeer_common::{DenyReason, Error};

use crate::guard;
use crate::render;
use crate::state;
use crate::timers::{PendingCloseRequest, PendingDeletion, TimerRegistry};

/// Cheap to clone; timer tasks hold their own handle to the shared state.
#[derive(Clone)]
pub struct TicketLifecycleService {
    inner: Arc<Inner>,
}

struct Inner {
    panels: Arc<dyn PanelRepository>,
    types: Arc<dyn TicketTypeRepository>,
    questions: Arc<dyn QuestionRepository>,
    tickets: Arc<dyn TicketRepository>,
    guild_config: Arc<dyn GuildConfigRepository>,
    platform: Arc<dyn ChatPlatform>,
    transcripts: Arc<dyn TranscriptRenderer>,
    timers: TimerRegistry,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TicketLifecycleService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        panels: Arc<dyn PanelRepository>,
        types: Arc<dyn TicketTypeRepository>,
        questions: Arc<dyn QuestionRepository>,
        tickets: Arc<dyn TicketRepository>,
        guild_config: Arc<dyn GuildConfigRepository>,
        platform: Arc<dyn ChatPlatform>,
        transcripts: Arc<dyn TranscriptRenderer>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                panels,
                types,
                questions,
                tickets,
                guild_config,
                platform,
                transcripts,
                timers: TimerRegistry::new(),
                locks: DashMap::new(),
            }),
        }
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.inner.timers
    }

    /// Live per-channel/per-panel lock entries.
    pub fn lock_count(&self) -> usize {
        self.inner.locks.len()
    }

    /// Open a ticket: guard, create the channel, persist the row, snapshot
    /// the form answers, post the welcome message. The channel is created
    /// before the row so a failed insert leaves no orphan row; the channel
    /// itself is deleted best-effort on that path.
    pub async fn open_ticket(
        &self,
        panel_id: i64,
        ticket_type_id: Option<i64>,
        opener: &Actor,
        answers: &[(i64, String)],
    ) -> Result<Ticket, Error> {
        self.inner
            .open_ticket(panel_id, ticket_type_id, opener, answers)
            .await
    }

    pub async fn claim(&self, channel_id: &str, actor: &Actor) -> Result<(), Error> {
        self.inner.claim(channel_id, actor).await
    }

    pub async fn unclaim(&self, channel_id: &str, actor: &Actor) -> Result<(), Error> {
        self.inner.unclaim(channel_id, actor).await
    }

    /// Close immediately: transcript, log delivery, countdown, deletion.
    /// `delay_override` forces a specific countdown (the sweeper passes 0).
    pub async fn close_now(
        &self,
        channel_id: &str,
        actor: &Actor,
        reason: Option<&str>,
        delay_override: Option<i64>,
    ) -> Result<(), Error> {
        let lock = self.inner.lock_for(channel_id);
        let _guard = lock.lock().await;

        let ticket = self.inner.active_ticket(channel_id).await?;
        Inner::close_locked(&self.inner, &ticket, actor, reason, delay_override).await
    }

    /// Abort the deletion countdown and restore the ticket to open.
    pub async fn cancel_close(&self, channel_id: &str, actor: &Actor) -> Result<(), Error> {
        self.inner.cancel_close(channel_id, actor).await
    }

    /// Staff asks the opener to close. With a deadline, silence auto-accepts.
    pub async fn request_close(
        &self,
        channel_id: &str,
        requested_by: &Actor,
        reason: Option<&str>,
        deadline_seconds: Option<i64>,
    ) -> Result<(), Error> {
        Inner::request_close(&self.inner, channel_id, requested_by, reason, deadline_seconds)
            .await
    }

    /// Opener accepts: close attributed to the requesting staff member.
    pub async fn accept_close_request(
        &self,
        channel_id: &str,
        actor: &Actor,
    ) -> Result<(), Error> {
        Inner::accept_close_request(&self.inner, channel_id, actor).await
    }

    /// Opener declines: the ticket stays open, the prompt is retired.
    pub async fn deny_close_request(&self, channel_id: &str, actor: &Actor) -> Result<(), Error> {
        self.inner.deny_close_request(channel_id, actor).await
    }

    /// Reopen a closed ticket as a fresh ticket (new channel, new number).
    /// Works exactly once per closed ticket; the old log-channel button is
    /// disabled afterwards.
    pub async fn reopen(
        &self,
        ticket_id: i64,
        opener: &Actor,
        control_message: Option<&MessageRef>,
    ) -> Result<Ticket, Error> {
        self.inner.reopen(ticket_id, opener, control_message).await
    }

    /// Message-activity hook; keeps the auto-close clock honest.
    pub async fn record_activity(&self, channel_id: &str) -> Result<(), Error> {
        self.inner.tickets.touch_last_message(channel_id).await
    }

    pub async fn add_participant(&self, channel_id: &str, user_id: &str) -> Result<(), Error> {
        self.inner.active_ticket(channel_id).await?;
        self.inner
            .platform
            .set_member_overwrite(channel_id, user_id)
            .await
    }

    pub async fn remove_participant(&self, channel_id: &str, user_id: &str) -> Result<(), Error> {
        let ticket = self.inner.active_ticket(channel_id).await?;
        if ticket.user_id == user_id {
            return Err(DenyReason::CannotRemoveRequester.into());
        }
        self.inner.platform.remove_overwrite(channel_id, user_id).await
    }

    pub async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), Error> {
        self.inner.active_ticket(channel_id).await?;
        let slug = render::channel_name_from_format(name, "", 0, "");
        if slug.trim_matches('-').is_empty() {
            return Err(DenyReason::InvalidName.into());
        }
        self.inner.platform.rename_channel(channel_id, &slug).await
    }

    /// Startup recovery: countdowns do not survive a restart, so any row
    /// stuck in `closing` goes back to `open` for a clean re-close.
    pub async fn recover_on_startup(&self) -> Result<u64, Error> {
        let restored = self.inner.tickets.reset_closing_tickets().await?;
        if restored > 0 {
            info!("startup recovery restored {restored} closing ticket(s) to open");
        }
        Ok(restored)
    }

    /// Abort all pending timers. Safe because recovery handles the rows
    /// these would have finished.
    pub fn shutdown(&self) {
        self.inner.timers.shutdown();
    }
}

impl Inner {
    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.entry(key.to_string()).or_default().clone()
    }

    async fn active_ticket(&self, channel_id: &str) -> Result<Ticket, Error> {
        self.tickets
            .get_active_by_channel(channel_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no active ticket in channel {channel_id}")))
    }

    async fn ticket_type_of(&self, ticket: &Ticket) -> Result<Option<TicketType>, Error> {
        // The type reference may dangle after a type delete; treat that the
        // same as an untyped ticket.
        match ticket.ticket_type_id {
            Some(id) => self.types.get(id).await,
            None => Ok(None),
        }
    }

    /// Type override, then panel default, then guild default.
    async fn effective_log_channel(
        &self,
        panel: &Panel,
        ticket_type: Option<&TicketType>,
    ) -> Result<Option<String>, Error> {
        if let Some(id) = ticket_type.and_then(|tt| tt.log_channel_id.clone()) {
            return Ok(Some(id));
        }
        if let Some(id) = &panel.log_channel_id {
            return Ok(Some(id.clone()));
        }
        Ok(self
            .guild_config
            .get(&panel.guild_id)
            .await?
            .and_then(|c| c.default_log_channel_id))
    }

    fn channel_name(ticket_type: Option<&TicketType>, number: i64, opener_name: &str) -> String {
        match ticket_type {
            Some(tt) => {
                render::channel_name_from_format(&tt.naming_format, &tt.name, number, opener_name)
            }
            None => format!("ticket-{number}"),
        }
    }

    fn channel_overwrites(
        panel: &Panel,
        ticket_type: Option<&TicketType>,
        opener_id: &str,
    ) -> Vec<PermissionOverwrite> {
        let mut overwrites = vec![
            PermissionOverwrite {
                target: OverwriteTarget::Everyone,
                allow: false,
            },
            PermissionOverwrite {
                target: OverwriteTarget::Member(opener_id.to_string()),
                allow: true,
            },
        ];
        let staff_roles: Vec<String> = match ticket_type {
            Some(tt) if !tt.staff_role_ids.is_empty() => tt.staff_role_ids.clone(),
            _ => vec![panel.role_id.clone()],
        };
        overwrites.extend(staff_roles.into_iter().map(|role| PermissionOverwrite {
            target: OverwriteTarget::Role(role),
            allow: true,
        }));
        overwrites
    }

    async fn open_ticket(
        &self,
        panel_id: i64,
        ticket_type_id: Option<i64>,
        opener: &Actor,
        answers: &[(i64, String)],
    ) -> Result<Ticket, Error> {
        let panel = self
            .panels
            .get(panel_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("panel {panel_id}")))?;
        let ticket_type = match ticket_type_id {
            Some(id) => Some(
                self.types
                    .get(id)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("ticket type {id}")))?,
            ),
            None => None,
        };

        // Opens serialize per panel so number peeking and the capacity
        // guard stay consistent under concurrent clicks.
        let lock = self.lock_for(&format!("panel:{panel_id}"));
        let _guard = lock.lock().await;

        guard::check_open_allowed(
            self.tickets.as_ref(),
            &panel,
            ticket_type.as_ref(),
            &opener.user_id,
        )
        .await?;

        let number = self.tickets.next_number(panel_id).await?;
        let name = Self::channel_name(ticket_type.as_ref(), number, &opener.username);

        let request = CreateChannelRequest {
            guild_id: panel.guild_id.clone(),
            name,
            parent_id: ticket_type
                .as_ref()
                .and_then(|tt| tt.category_id.clone())
                .or_else(|| panel.category_id.clone()),
            overwrites: Self::channel_overwrites(&panel, ticket_type.as_ref(), &opener.user_id),
        };
        let channel_id = self.platform.create_channel(&request).await?;

        let ticket = match self
            .tickets
            .create(panel_id, ticket_type_id, &channel_id, &opener.user_id)
            .await
        {
            Ok(t) => t,
            Err(e) => {
                if let Err(del) = self.platform.delete_channel(&channel_id).await {
                    warn!("failed to clean up channel {channel_id} after insert error: {del}");
                }
                return Err(e);
            }
        };

        let responses = self
            .snapshot_answers(&ticket, ticket_type.as_ref(), answers)
            .await?;

        let welcome =
            render::welcome_message(&panel, ticket_type.as_ref(), &ticket, &responses, false);
        self.platform.send_message(&channel_id, &welcome).await?;

        self.notify_opened(&panel, ticket_type.as_ref(), &ticket, false)
            .await;
        self.refresh_panel_message(panel_id).await;

        info!(
            "opened ticket #{} (id {}) in channel {channel_id} for {}",
            ticket.number, ticket.ticket_id, opener.user_id
        );
        Ok(ticket)
    }

    /// Persist form answers with label snapshots. Answers for unknown or
    /// foreign questions are dropped silently.
    async fn snapshot_answers(
        &self,
        ticket: &Ticket,
        ticket_type: Option<&TicketType>,
        answers: &[(i64, String)],
    ) -> Result<Vec<TicketResponse>, Error> {
        let Some(tt) = ticket_type else {
            return Ok(Vec::new());
        };
        if answers.is_empty() {
            return Ok(Vec::new());
        }

        let questions = self.questions.list_for_type(tt.ticket_type_id).await?;
        let drafts: Vec<ResponseDraft> = questions
            .iter()
            .filter_map(|q| {
                answers
                    .iter()
                    .find(|(id, _)| *id == q.question_id)
                    .map(|(_, response)| ResponseDraft {
                        question_id: q.question_id,
                        label: q.label.clone(),
                        response: response.clone(),
                    })
            })
            .collect();

        if !drafts.is_empty() {
            self.tickets
                .insert_responses(ticket.ticket_id, &drafts)
                .await?;
        }
        self.tickets.list_responses(ticket.ticket_id).await
    }

    async fn claim(&self, channel_id: &str, actor: &Actor) -> Result<(), Error> {
        let lock = self.lock_for(channel_id);
        let _guard = lock.lock().await;

        let ticket = self.active_ticket(channel_id).await?;
        if let Some(by) = ticket.claimed_by {
            return Err(DenyReason::AlreadyClaimed { by }.into());
        }

        self.tickets.set_claimed(channel_id, &actor.user_id).await?;
        self.refresh_controls(channel_id, true).await;

        let notice = OutboundMessage {
            content: Some(format!("🙋 Ticket claimed by <@{}>.", actor.user_id)),
            ..Default::default()
        };
        if let Err(e) = self.platform.send_message(channel_id, &notice).await {
            warn!("failed to announce claim in {channel_id}: {e}");
        }
        Ok(())
    }

    async fn unclaim(&self, channel_id: &str, actor: &Actor) -> Result<(), Error> {
        let lock = self.lock_for(channel_id);
        let _guard = lock.lock().await;

        let ticket = self.active_ticket(channel_id).await?;
        if ticket.claimed_by.is_none() {
            return Err(DenyReason::NotClaimed.into());
        }

        self.tickets.clear_claimed(channel_id).await?;
        self.refresh_controls(channel_id, false).await;

        let notice = OutboundMessage {
            content: Some(format!("Ticket unclaimed by <@{}>.", actor.user_id)),
            ..Default::default()
        };
        if let Err(e) = self.platform.send_message(channel_id, &notice).await {
            warn!("failed to announce unclaim in {channel_id}: {e}");
        }
        Ok(())
    }

    /// Swap the claim/unclaim slot on the channel's control row.
    async fn refresh_controls(&self, channel_id: &str, claimed: bool) {
        self.edit_control_row(channel_id, render::ticket_controls(claimed))
            .await;
    }

    /// Replace the channel's live control row in place. Best-effort; the
    /// store is already authoritative.
    async fn edit_control_row(&self, channel_id: &str, row: Vec<ActionButton>) {
        let target = match self.platform.find_action_row_message(channel_id).await {
            Ok(Some(t)) => t,
            Ok(None) => return,
            Err(e) => {
                warn!("control row lookup failed in {channel_id}: {e}");
                return;
            }
        };
        let patch = OutboundMessage {
            buttons: vec![row],
            ..Default::default()
        };
        if let Err(e) = self.platform.edit_message(&target, &patch).await {
            warn!("failed to refresh controls in {channel_id}: {e}");
        }
    }

    /// Best-effort re-render of the posted panel message after a lifecycle
    /// change. A panel that was never posted is left alone.
    async fn refresh_panel_message(&self, panel_id: i64) {
        let panel = match self.panels.get(panel_id).await {
            Ok(Some(p)) => p,
            Ok(None) => return,
            Err(e) => {
                warn!("panel {panel_id} lookup failed during refresh: {e}");
                return;
            }
        };
        let Some(message_id) = panel.message_id.clone() else {
            return;
        };
        let types = match self.types.list_for_panel(panel_id).await {
            Ok(t) => t,
            Err(e) => {
                warn!("type listing failed during panel {panel_id} refresh: {e}");
                return;
            }
        };
        let target = MessageRef {
            channel_id: panel.channel_id.clone(),
            message_id,
        };
        let message = render::panel_message(&panel, &types);
        if let Err(e) = self.platform.edit_message(&target, &message).await {
            warn!("failed to refresh panel {panel_id} message: {e}");
        }
    }

    /// Best-effort "ticket opened" record in the effective log channel.
    async fn notify_opened(
        &self,
        panel: &Panel,
        ticket_type: Option<&TicketType>,
        ticket: &Ticket,
        reopened: bool,
    ) {
        let log_channel = match self.effective_log_channel(panel, ticket_type).await {
            Ok(Some(id)) => id,
            Ok(None) => return,
            Err(e) => {
                warn!("log channel lookup failed for panel {}: {e}", panel.panel_id);
                return;
            }
        };
        let message = render::open_log_message(ticket, reopened);
        if let Err(e) = self.platform.send_message(&log_channel, &message).await {
            warn!("failed to deliver open log to {log_channel}: {e}");
        }
    }

    /// Close body; caller holds the channel lock and has verified an active
    /// ticket exists. Takes the Arc explicitly because the countdown task
    /// needs its own handle to the shared state.
    async fn close_locked(
        this: &Arc<Inner>,
        ticket: &Ticket,
        closed_by: &Actor,
        reason: Option<&str>,
        delay_override: Option<i64>,
    ) -> Result<(), Error> {
        if ticket.status != TicketStatus::Open {
            return Err(DenyReason::AlreadyClosing.into());
        }
        state::ensure_transition(ticket.status, TicketStatus::Closing)?;

        let channel_id = ticket.channel_id.clone();

        // A pending close request is moot once a close lands; retire its
        // prompt so the channel's only live row is the control row.
        if let Some(pending) = this.timers.take_close_request(&channel_id) {
            if let Some(h) = pending.handle {
                h.abort();
            }
            this.resolve_close_prompt(&pending.message, "Superseded; the ticket is closing.")
                .await;
        }

        this.tickets
            .set_status(&channel_id, TicketStatus::Closing)
            .await?;

        let panel = this
            .panels
            .get(ticket.panel_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("panel {}", ticket.panel_id)))?;
        let ticket_type = this.ticket_type_of(ticket).await?;

        // Transcript before anything destructive.
        let transcript = match this.transcripts.render_html(&channel_id, ticket).await {
            Ok(bytes) => Some(Attachment {
                filename: format!("ticket-{}.html", ticket.number),
                bytes,
            }),
            Err(e) => {
                warn!("transcript render failed for {channel_id}: {e}");
                None
            }
        };

        if let Some(log_channel) = this
            .effective_log_channel(&panel, ticket_type.as_ref())
            .await?
        {
            let log = render::close_log_message(ticket, closed_by, reason, transcript.clone());
            if let Err(e) = this.platform.send_message(&log_channel, &log).await {
                warn!("failed to deliver close log to {log_channel}: {e}");
            }
        }

        if ticket_type.as_ref().is_some_and(|tt| tt.dm_transcript) {
            if let Some(attachment) = transcript {
                let dm = OutboundMessage {
                    content: Some(format!(
                        "Your ticket #{} has been closed. Transcript attached.",
                        ticket.number
                    )),
                    attachment: Some(attachment),
                    ..Default::default()
                };
                if let Err(e) = this.platform.send_dm(&ticket.user_id, &dm).await {
                    warn!("failed to DM transcript to {}: {e}", ticket.user_id);
                }
            }
        }

        let delay = delay_override
            .unwrap_or_else(|| {
                ticket_type
                    .as_ref()
                    .map(|tt| tt.delete_delay_seconds)
                    .unwrap_or(DEFAULT_DELETE_DELAY_SECONDS)
            })
            .clamp(0, MAX_DELETE_DELAY_SECONDS);

        if delay == 0 {
            this.finalize_close(&channel_id).await?;
            return Ok(());
        }

        // The open/close/claim row is stale during a countdown; only the
        // cancel affordance applies.
        this.edit_control_row(&channel_id, render::closing_controls())
            .await;

        let notice = render::closing_message(closed_by, delay);
        if let Err(e) = this.platform.send_message(&channel_id, &notice).await {
            warn!("failed to post closing notice in {channel_id}: {e}");
        }

        let task_inner = Arc::clone(this);
        let timer_channel = channel_id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay as u64)).await;
            let lock = task_inner.lock_for(&timer_channel);
            let _guard = lock.lock().await;
            // A cancel that won the race already emptied the slot.
            if task_inner.timers.take_deletion(&timer_channel).is_none() {
                return;
            }
            if let Err(e) = task_inner.finalize_close(&timer_channel).await {
                error!("deferred close of {timer_channel} failed: {e}");
            }
        });
        this.timers.insert_deletion(
            &channel_id,
            PendingDeletion {
                ticket_id: ticket.ticket_id,
                handle,
            },
        );

        info!(
            "ticket #{} closing, channel {channel_id} deletes in {delay}s",
            ticket.number
        );
        Ok(())
    }

    /// Delete the channel and mark the row closed. The row outlives the
    /// channel; the channel delete failing does not block the close.
    async fn finalize_close(&self, channel_id: &str) -> Result<(), Error> {
        let panel_id = self
            .tickets
            .get_active_by_channel(channel_id)
            .await?
            .map(|t| t.panel_id);
        if let Err(e) = self.platform.delete_channel(channel_id).await {
            warn!("failed to delete channel {channel_id}: {e}");
        }
        self.tickets.mark_closed(channel_id).await?;
        if let Some(panel_id) = panel_id {
            self.refresh_panel_message(panel_id).await;
        }
        // The channel never comes back; in-flight holders keep their own
        // Arc clone of the lock.
        self.locks.remove(channel_id);
        info!("channel {channel_id} closed out");
        Ok(())
    }

    async fn cancel_close(&self, channel_id: &str, actor: &Actor) -> Result<(), Error> {
        let lock = self.lock_for(channel_id);
        let _guard = lock.lock().await;

        let Some(pending) = self.timers.take_deletion(channel_id) else {
            return Err(DenyReason::NothingToCancel.into());
        };
        pending.handle.abort();

        self.tickets
            .set_status(channel_id, TicketStatus::Open)
            .await?;

        let ticket = self.active_ticket(channel_id).await?;
        self.refresh_controls(channel_id, ticket.claimed_by.is_some())
            .await;

        let notice = OutboundMessage {
            content: Some(format!("Close canceled by <@{}>.", actor.user_id)),
            ..Default::default()
        };
        if let Err(e) = self.platform.send_message(channel_id, &notice).await {
            warn!("failed to announce cancel in {channel_id}: {e}");
        }
        info!("close of channel {channel_id} canceled by {}", actor.user_id);
        Ok(())
    }

    async fn request_close(
        this: &Arc<Inner>,
        channel_id: &str,
        requested_by: &Actor,
        reason: Option<&str>,
        deadline_seconds: Option<i64>,
    ) -> Result<(), Error> {
        let lock = this.lock_for(channel_id);
        let _guard = lock.lock().await;

        let ticket = this.active_ticket(channel_id).await?;
        if ticket.status != TicketStatus::Open {
            return Err(DenyReason::AlreadyClosing.into());
        }
        if this.timers.has_close_request(channel_id) {
            return Err(DenyReason::CloseRequestPending.into());
        }

        let prompt = render::close_request_message(requested_by, reason, deadline_seconds);
        let message_id = this.platform.send_message(channel_id, &prompt).await?;

        let handle = deadline_seconds.map(|secs| {
            let task_inner = Arc::clone(this);
            let timer_channel = channel_id.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs.max(1) as u64)).await;
                let lock = task_inner.lock_for(&timer_channel);
                let _guard = lock.lock().await;
                // Accept/deny that resolved first already emptied the slot.
                let Some(pending) = task_inner.timers.take_close_request(&timer_channel) else {
                    return;
                };
                let ticket = match task_inner.tickets.get_active_by_channel(&timer_channel).await {
                    Ok(Some(t)) => t,
                    Ok(None) => return,
                    Err(e) => {
                        error!("close-request deadline lookup failed for {timer_channel}: {e}");
                        return;
                    }
                };
                task_inner
                    .resolve_close_prompt(&pending.message, "Close request expired; closing.")
                    .await;
                if let Err(e) = Inner::close_locked(
                    &task_inner,
                    &ticket,
                    &pending.requested_by,
                    pending.reason.as_deref(),
                    None,
                )
                .await
                {
                    if !e.is_rejection() {
                        error!("deadline close of {timer_channel} failed: {e}");
                    }
                }
            })
        });

        this.timers.insert_close_request(
            channel_id,
            PendingCloseRequest {
                ticket_id: ticket.ticket_id,
                requested_by: requested_by.clone(),
                reason: reason.map(str::to_string),
                message: MessageRef {
                    channel_id: channel_id.to_string(),
                    message_id,
                },
                handle,
            },
        );
        Ok(())
    }

    async fn accept_close_request(
        this: &Arc<Inner>,
        channel_id: &str,
        actor: &Actor,
    ) -> Result<(), Error> {
        let lock = this.lock_for(channel_id);
        let _guard = lock.lock().await;

        let ticket = this.active_ticket(channel_id).await?;
        if this.timers.peek_close_request(channel_id).is_none() {
            return Err(DenyReason::NoCloseRequest.into());
        }
        if actor.user_id != ticket.user_id {
            return Err(DenyReason::NotRequester.into());
        }

        let pending = this
            .timers
            .take_close_request(channel_id)
            .ok_or(Error::Rejected(DenyReason::NoCloseRequest))?;
        if let Some(h) = pending.handle {
            h.abort();
        }
        this.resolve_close_prompt(&pending.message, "Close request accepted.")
            .await;

        Inner::close_locked(
            this,
            &ticket,
            &pending.requested_by,
            pending.reason.as_deref(),
            None,
        )
        .await
    }

    async fn deny_close_request(&self, channel_id: &str, actor: &Actor) -> Result<(), Error> {
        let lock = self.lock_for(channel_id);
        let _guard = lock.lock().await;

        let ticket = self.active_ticket(channel_id).await?;
        if self.timers.peek_close_request(channel_id).is_none() {
            return Err(DenyReason::NoCloseRequest.into());
        }
        if actor.user_id != ticket.user_id {
            return Err(DenyReason::NotRequester.into());
        }

        let pending = self
            .timers
            .take_close_request(channel_id)
            .ok_or(Error::Rejected(DenyReason::NoCloseRequest))?;
        if let Some(h) = pending.handle {
            h.abort();
        }
        self.resolve_close_prompt(&pending.message, "Close request denied; ticket stays open.")
            .await;
        Ok(())
    }

    async fn resolve_close_prompt(&self, target: &MessageRef, outcome: &str) {
        let patch = OutboundMessage {
            content: Some(outcome.to_string()),
            buttons: vec![Vec::new()],
            ..Default::default()
        };
        if let Err(e) = self.platform.edit_message(target, &patch).await {
            warn!(
                "failed to resolve close prompt {} in {}: {e}",
                target.message_id, target.channel_id
            );
        }
    }

    async fn reopen(
        &self,
        ticket_id: i64,
        opener: &Actor,
        control_message: Option<&MessageRef>,
    ) -> Result<Ticket, Error> {
        let probe = self
            .tickets
            .get(ticket_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id}")))?;

        let lock = self.lock_for(&format!("panel:{}", probe.panel_id));
        let _guard = lock.lock().await;

        // Re-fetch under the lock; two reopen clicks race on this flag.
        let old = self
            .tickets
            .get(ticket_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id}")))?;
        if old.status != TicketStatus::Closed {
            return Err(DenyReason::NotClosed.into());
        }
        if old.reopened {
            return Err(DenyReason::AlreadyReopened.into());
        }

        let panel = self
            .panels
            .get(old.panel_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("panel {}", old.panel_id)))?;
        let ticket_type = self.ticket_type_of(&old).await?;

        guard::check_open_allowed(
            self.tickets.as_ref(),
            &panel,
            ticket_type.as_ref(),
            &old.user_id,
        )
        .await?;

        let number = self.tickets.next_number(old.panel_id).await?;
        let name = Self::channel_name(ticket_type.as_ref(), number, &opener.username);
        let request = CreateChannelRequest {
            guild_id: panel.guild_id.clone(),
            name,
            parent_id: ticket_type
                .as_ref()
                .and_then(|tt| tt.category_id.clone())
                .or_else(|| panel.category_id.clone()),
            overwrites: Self::channel_overwrites(&panel, ticket_type.as_ref(), &old.user_id),
        };
        let channel_id = self.platform.create_channel(&request).await?;

        let ticket = match self
            .tickets
            .create(old.panel_id, old.ticket_type_id, &channel_id, &old.user_id)
            .await
        {
            Ok(t) => t,
            Err(e) => {
                if let Err(del) = self.platform.delete_channel(&channel_id).await {
                    warn!("failed to clean up channel {channel_id} after insert error: {del}");
                }
                return Err(e);
            }
        };

        // Burn the one-shot flag only once the replacement ticket exists;
        // a transient platform failure above leaves the affordance usable.
        self.tickets.mark_reopened(ticket_id).await?;

        if let Some(target) = control_message {
            let patch = OutboundMessage {
                buttons: vec![render::reopen_row(ticket_id, true)],
                ..Default::default()
            };
            if let Err(e) = self.platform.edit_message(target, &patch).await {
                warn!("failed to disable reopen button for ticket {ticket_id}: {e}");
            }
        }

        let responses = self.tickets.list_responses(old.ticket_id).await?;
        let welcome =
            render::welcome_message(&panel, ticket_type.as_ref(), &ticket, &responses, true);
        self.platform.send_message(&channel_id, &welcome).await?;

        self.notify_opened(&panel, ticket_type.as_ref(), &ticket, true)
            .await;
        self.refresh_panel_message(old.panel_id).await;

        info!(
            "reopened ticket {} as #{} (id {}) in channel {channel_id}",
            old.ticket_id, ticket.number, ticket.ticket_id
        );
        Ok(ticket)
    }
}
