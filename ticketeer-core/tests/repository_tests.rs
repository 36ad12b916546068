// ticketeer-core/tests/repository_tests.rs

use ticketeer_common::models::{NewPanel, NewQuestion, NewTicketType, TicketStatus};
use ticketeer_common::traits::repository_traits::{
    GuildConfigRepository, PanelRepository, QuestionRepository, TicketRepository,
    TicketTypeRepository,
};
use ticketeer_core::test_utils::TestHarness;

#[tokio::test]
async fn panel_create_applies_defaults() {
    let h = TestHarness::new().await;

    let panel_id = h
        .panels
        .create(&NewPanel {
            guild_id: "g1".into(),
            channel_id: "c1".into(),
            role_id: "r1".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let panel = h.panels.get(panel_id).await.unwrap().unwrap();
    assert_eq!(panel.title, "Support Tickets");
    assert_eq!(panel.button_label, "Open Ticket");
    assert!(!panel.disabled);
    assert!(panel.message_id.is_none());
}

#[tokio::test]
async fn panel_title_lookup_ignores_case_and_whitespace() {
    let h = TestHarness::new().await;
    let panel_id = h
        .panels
        .create(&NewPanel {
            guild_id: "g1".into(),
            channel_id: "c1".into(),
            role_id: "r1".into(),
            title: Some("Bug Reports".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let found = h
        .panels
        .get_by_title("g1", "  bug reports ")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.panel_id, panel_id);

    assert!(h.panels.get_by_title("g2", "Bug Reports").await.unwrap().is_none());
}

#[tokio::test]
async fn ticket_numbers_are_monotonic_and_panel_scoped() {
    let h = TestHarness::new().await;
    let a = h.seed_panel_in("g1").await;
    let b = h.seed_panel_in("g1").await;

    let t1 = h.tickets.create(a.panel_id, None, "ch1", "u1").await.unwrap();
    let t2 = h.tickets.create(a.panel_id, None, "ch2", "u2").await.unwrap();
    let t3 = h.tickets.create(b.panel_id, None, "ch3", "u3").await.unwrap();

    assert_eq!(t1.number, 1);
    assert_eq!(t2.number, 2);
    assert_eq!(t3.number, 1);

    // Numbers are never reused even after a close.
    h.tickets.mark_closed("ch2").await.unwrap();
    let t4 = h.tickets.create(a.panel_id, None, "ch4", "u4").await.unwrap();
    assert_eq!(t4.number, 3);
}

#[tokio::test]
async fn mark_closed_stamps_and_hides_from_active_lookup() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;
    let t = h.tickets.create(panel.panel_id, None, "ch1", "u1").await.unwrap();
    assert_eq!(t.status, TicketStatus::Open);

    h.tickets.mark_closed("ch1").await.unwrap();

    assert!(h.tickets.get_active_by_channel("ch1").await.unwrap().is_none());
    let closed = h.tickets.get(t.ticket_id).await.unwrap().unwrap();
    assert_eq!(closed.status, TicketStatus::Closed);
    assert!(closed.closed_at.is_some());

    // Terminal: a second mark_closed and a set_status are both no-ops.
    h.tickets.set_status("ch1", TicketStatus::Open).await.unwrap();
    let still = h.tickets.get(t.ticket_id).await.unwrap().unwrap();
    assert_eq!(still.status, TicketStatus::Closed);
}

#[tokio::test]
async fn reset_closing_tickets_touches_only_closing_rows() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;
    h.tickets.create(panel.panel_id, None, "ch1", "u1").await.unwrap();
    h.tickets.create(panel.panel_id, None, "ch2", "u2").await.unwrap();
    h.tickets.create(panel.panel_id, None, "ch3", "u3").await.unwrap();

    h.tickets.set_status("ch2", TicketStatus::Closing).await.unwrap();
    h.tickets.mark_closed("ch3").await.unwrap();

    let restored = h.tickets.reset_closing_tickets().await.unwrap();
    assert_eq!(restored, 1);

    let active = h.tickets.get_active_by_channel("ch2").await.unwrap().unwrap();
    assert_eq!(active.status, TicketStatus::Open);
    assert!(h.tickets.get_active_by_channel("ch3").await.unwrap().is_none());
}

#[tokio::test]
async fn staff_roles_round_trip_and_delay_is_clamped() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;

    let id = h
        .types
        .create(&NewTicketType {
            panel_id: panel.panel_id,
            name: "appeals".into(),
            staff_role_ids: vec!["r1".into(), "r2".into()],
            delete_delay_seconds: Some(9999),
            ..Default::default()
        })
        .await
        .unwrap();

    let tt = h.types.get(id).await.unwrap().unwrap();
    assert_eq!(tt.staff_role_ids, vec!["r1".to_string(), "r2".to_string()]);
    assert_eq!(tt.delete_delay_seconds, 300);
    assert_eq!(tt.naming_format, "{type}-{number}");
}

#[tokio::test]
async fn response_labels_survive_question_edits() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;
    let tt = h.seed_type(panel.panel_id).await;

    let qid = h
        .questions
        .create(&NewQuestion {
            ticket_type_id: tt.ticket_type_id,
            label: "What happened?".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let ticket = h
        .tickets
        .create(panel.panel_id, Some(tt.ticket_type_id), "ch1", "u1")
        .await
        .unwrap();
    h.tickets
        .insert_responses(
            ticket.ticket_id,
            &[ticketeer_common::models::ResponseDraft {
                question_id: qid,
                label: "What happened?".into(),
                response: "it broke".into(),
            }],
        )
        .await
        .unwrap();

    // Edit and then delete the question; the snapshot must not move.
    let mut q = h.questions.get(qid).await.unwrap().unwrap();
    q.label = "Different label".into();
    h.questions.update(&q).await.unwrap();
    h.questions.delete(qid).await.unwrap();

    let responses = h.tickets.list_responses(ticket.ticket_id).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].label, "What happened?");
    assert_eq!(responses[0].response, "it broke");
}

#[tokio::test]
async fn panel_cascade_delete_clears_everything_under_it() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;
    let tt = h.seed_type(panel.panel_id).await;
    h.questions
        .create(&NewQuestion {
            ticket_type_id: tt.ticket_type_id,
            label: "q".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let ticket = h
        .tickets
        .create(panel.panel_id, Some(tt.ticket_type_id), "ch1", "u1")
        .await
        .unwrap();

    h.panels.delete_cascade(panel.panel_id).await.unwrap();

    assert!(h.panels.get(panel.panel_id).await.unwrap().is_none());
    assert!(h.types.get(tt.ticket_type_id).await.unwrap().is_none());
    assert_eq!(h.questions.count_for_type(tt.ticket_type_id).await.unwrap(), 0);
    assert!(h.tickets.get(ticket.ticket_id).await.unwrap().is_none());
}

#[tokio::test]
async fn question_order_index_appends() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;
    let tt = h.seed_type(panel.panel_id).await;

    for label in ["first", "second", "third"] {
        h.questions
            .create(&NewQuestion {
                ticket_type_id: tt.ticket_type_id,
                label: label.into(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let questions = h.questions.list_for_type(tt.ticket_type_id).await.unwrap();
    let labels: Vec<&str> = questions.iter().map(|q| q.label.as_str()).collect();
    assert_eq!(labels, vec!["first", "second", "third"]);
    assert_eq!(questions[2].order_index, 2);
}

#[tokio::test]
async fn guild_config_upserts() {
    let h = TestHarness::new().await;
    assert!(h.guild_config.get("g1").await.unwrap().is_none());

    h.guild_config
        .set_default_log_channel("g1", Some("log-1"))
        .await
        .unwrap();
    let cfg = h.guild_config.get("g1").await.unwrap().unwrap();
    assert_eq!(cfg.default_log_channel_id.as_deref(), Some("log-1"));

    h.guild_config
        .set_default_log_channel("g1", None)
        .await
        .unwrap();
    let cfg = h.guild_config.get("g1").await.unwrap().unwrap();
    assert!(cfg.default_log_channel_id.is_none());
}
