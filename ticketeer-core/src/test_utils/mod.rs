// ticketeer-core/src/test_utils/mod.rs
//
// Shared fixtures for integration tests: an in-memory migrated database, a
// recording mock of the messaging platform, a canned transcript renderer,
// and a harness that wires the whole engine together.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;

use ticketeer_common::Error;
use ticketeer_common::models::{Actor, NewPanel, NewTicketType, Panel, Ticket, TicketType};
use ticketeer_common::traits::platform_traits::{
    ChatPlatform, CreateChannelRequest, MessageRef, OutboundMessage, TranscriptRenderer,
};
use ticketeer_common::traits::repository_traits::{
    GuildConfigRepository as _, PanelRepository as _, TicketTypeRepository as _,
};

use crate::Database;
use crate::repositories::sqlite::{
    GuildConfigRepository, PanelRepository, QuestionRepository, TicketRepository,
    TicketTypeRepository,
};
use crate::services::{PanelAdminService, TicketLifecycleService};

/// Fresh in-memory database with the schema applied. `max_connections(1)`
/// keeps every query on the same `:memory:` instance.
pub async fn setup_test_database() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect to in-memory sqlite");
    let db = Database::from_pool(pool);
    db.migrate().await.expect("apply migrations");
    db
}

/// Ordered record of external effects, shared between the mock platform and
/// the canned transcript renderer so ordering across both is observable.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// One message the mock platform holds, as last edited.
#[derive(Clone)]
pub struct StoredMessage {
    pub channel_id: String,
    pub message_id: String,
    pub message: OutboundMessage,
}

/// Recording in-memory stand-in for the real chat client. Channel and
/// message ids are sequential ("chan-1", "msg-1").
#[derive(Default)]
pub struct MockPlatform {
    next_id: AtomicU64,
    pub log: CallLog,
    pub channels: Mutex<Vec<String>>,
    pub deleted_channels: Mutex<Vec<String>>,
    pub messages: Mutex<Vec<StoredMessage>>,
    pub dms: Mutex<Vec<(String, OutboundMessage)>>,
    pub fail_create_channel: AtomicBool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    fn next(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn messages_in(&self, channel_id: &str) -> Vec<StoredMessage> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect()
    }

    pub fn deleted(&self, channel_id: &str) -> bool {
        self.deleted_channels
            .lock()
            .unwrap()
            .iter()
            .any(|c| c == channel_id)
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn create_channel(&self, request: &CreateChannelRequest) -> Result<String, Error> {
        if self.fail_create_channel.load(Ordering::SeqCst) {
            return Err(Error::Platform("create_channel failed (injected)".into()));
        }
        let id = self.next("chan");
        self.log.push(format!("create_channel:{}:{}", id, request.name));
        self.channels.lock().unwrap().push(id.clone());
        Ok(id)
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), Error> {
        self.log.push(format!("delete_channel:{channel_id}"));
        self.deleted_channels
            .lock()
            .unwrap()
            .push(channel_id.to_string());
        Ok(())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<String, Error> {
        let id = self.next("msg");
        self.log.push(format!("send_message:{channel_id}:{id}"));
        self.messages.lock().unwrap().push(StoredMessage {
            channel_id: channel_id.to_string(),
            message_id: id.clone(),
            message: message.clone(),
        });
        Ok(id)
    }

    async fn edit_message(
        &self,
        target: &MessageRef,
        patch: &OutboundMessage,
    ) -> Result<(), Error> {
        self.log.push(format!(
            "edit_message:{}:{}",
            target.channel_id, target.message_id
        ));
        let mut messages = self.messages.lock().unwrap();
        let stored = messages
            .iter_mut()
            .find(|m| m.channel_id == target.channel_id && m.message_id == target.message_id)
            .ok_or_else(|| Error::Platform(format!("no message {}", target.message_id)))?;
        if patch.content.is_some() {
            stored.message.content = patch.content.clone();
        }
        if patch.embed.is_some() {
            stored.message.embed = patch.embed.clone();
        }
        stored.message.buttons = patch.buttons.clone();
        Ok(())
    }

    async fn delete_message(&self, target: &MessageRef) -> Result<(), Error> {
        self.log.push(format!(
            "delete_message:{}:{}",
            target.channel_id, target.message_id
        ));
        self.messages
            .lock()
            .unwrap()
            .retain(|m| !(m.channel_id == target.channel_id && m.message_id == target.message_id));
        Ok(())
    }

    async fn find_action_row_message(
        &self,
        channel_id: &str,
    ) -> Result<Option<MessageRef>, Error> {
        let messages = self.messages.lock().unwrap();
        Ok(messages
            .iter()
            .rev()
            .find(|m| {
                m.channel_id == channel_id && m.message.buttons.iter().any(|row| !row.is_empty())
            })
            .map(|m| MessageRef {
                channel_id: m.channel_id.clone(),
                message_id: m.message_id.clone(),
            }))
    }

    async fn send_dm(&self, user_id: &str, message: &OutboundMessage) -> Result<(), Error> {
        self.log.push(format!("send_dm:{user_id}"));
        self.dms
            .lock()
            .unwrap()
            .push((user_id.to_string(), message.clone()));
        Ok(())
    }

    async fn set_member_overwrite(&self, channel_id: &str, user_id: &str) -> Result<(), Error> {
        self.log
            .push(format!("set_member_overwrite:{channel_id}:{user_id}"));
        Ok(())
    }

    async fn remove_overwrite(&self, channel_id: &str, user_id: &str) -> Result<(), Error> {
        self.log
            .push(format!("remove_overwrite:{channel_id}:{user_id}"));
        Ok(())
    }

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), Error> {
        self.log.push(format!("rename_channel:{channel_id}:{name}"));
        Ok(())
    }
}

/// Transcript renderer returning a fixed document, with injectable failure.
#[derive(Default)]
pub struct StaticTranscript {
    pub log: CallLog,
    pub fail: AtomicBool,
}

impl StaticTranscript {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TranscriptRenderer for StaticTranscript {
    async fn render_html(&self, channel_id: &str, _ticket: &Ticket) -> Result<Vec<u8>, Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Platform("transcript failed (injected)".into()));
        }
        self.log.push(format!("render_transcript:{channel_id}"));
        Ok(b"<html>transcript</html>".to_vec())
    }
}

/// Fully wired engine over an in-memory store and the mock platform.
pub struct TestHarness {
    pub db: Database,
    pub panels: Arc<PanelRepository>,
    pub types: Arc<TicketTypeRepository>,
    pub questions: Arc<QuestionRepository>,
    pub tickets: Arc<TicketRepository>,
    pub guild_config: Arc<GuildConfigRepository>,
    pub platform: Arc<MockPlatform>,
    pub transcripts: Arc<StaticTranscript>,
    pub log: CallLog,
    pub lifecycle: TicketLifecycleService,
    pub admin: PanelAdminService,
}

impl TestHarness {
    pub async fn new() -> Self {
        let db = setup_test_database().await;
        let pool = db.pool().clone();

        let panels = Arc::new(PanelRepository::new(pool.clone()));
        let types = Arc::new(TicketTypeRepository::new(pool.clone()));
        let questions = Arc::new(QuestionRepository::new(pool.clone()));
        let tickets = Arc::new(TicketRepository::new(pool.clone()));
        let guild_config = Arc::new(GuildConfigRepository::new(pool));

        let log = CallLog::default();
        let platform = Arc::new(MockPlatform::with_log(log.clone()));
        let transcripts = Arc::new(StaticTranscript::with_log(log.clone()));

        let lifecycle = TicketLifecycleService::new(
            panels.clone(),
            types.clone(),
            questions.clone(),
            tickets.clone(),
            guild_config.clone(),
            platform.clone(),
            transcripts.clone(),
        );
        let admin = PanelAdminService::new(
            panels.clone(),
            types.clone(),
            questions.clone(),
            tickets.clone(),
            guild_config.clone(),
            platform.clone(),
        );

        Self {
            db,
            panels,
            types,
            questions,
            tickets,
            guild_config,
            platform,
            transcripts,
            log,
            lifecycle,
            admin,
        }
    }

    /// A plain panel in guild "guild-1" without a log channel.
    pub async fn seed_panel(&self) -> Panel {
        self.seed_panel_in("guild-1").await
    }

    pub async fn seed_panel_in(&self, guild_id: &str) -> Panel {
        let panel_id = self
            .panels
            .create(&NewPanel {
                guild_id: guild_id.to_string(),
                channel_id: "panel-chan".to_string(),
                role_id: "staff-role".to_string(),
                ..Default::default()
            })
            .await
            .expect("create panel");
        self.panels
            .get(panel_id)
            .await
            .expect("fetch panel")
            .expect("panel exists")
    }

    /// Panel with its message posted to "panel-chan", as the admin create
    /// flow leaves it.
    pub async fn seed_posted_panel(&self) -> Panel {
        let panel = self.seed_panel().await;
        let types = self
            .types
            .list_for_panel(panel.panel_id)
            .await
            .expect("list types");
        let message_id = self
            .platform
            .send_message(&panel.channel_id, &crate::render::panel_message(&panel, &types))
            .await
            .expect("post panel message");
        self.panels
            .set_message_id(panel.panel_id, Some(&message_id))
            .await
            .expect("store panel message id");
        self.panels
            .get(panel.panel_id)
            .await
            .expect("fetch panel")
            .expect("panel exists")
    }

    pub async fn seed_type(&self, panel_id: i64) -> TicketType {
        self.seed_type_named(panel_id, "support").await
    }

    pub async fn seed_type_named(&self, panel_id: i64, name: &str) -> TicketType {
        let id = self
            .types
            .create(&NewTicketType {
                panel_id,
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .expect("create ticket type");
        self.types
            .get(id)
            .await
            .expect("fetch ticket type")
            .expect("ticket type exists")
    }

    pub async fn set_guild_log_channel(&self, guild_id: &str, channel_id: &str) {
        self.guild_config
            .set_default_log_channel(guild_id, Some(channel_id))
            .await
            .expect("set log channel");
    }
}

pub fn opener() -> Actor {
    Actor::new("user-1", "Some User")
}

pub fn staff() -> Actor {
    Actor::new("staff-1", "Staff Member")
}
