// ticketeer-core/tests/admin_tests.rs

use ticketeer_common::models::{NewPanel, NewQuestion, NewTicketType, QuestionStyle};
use ticketeer_common::traits::repository_traits::{PanelRepository, TicketRepository};
use ticketeer_common::{DenyReason, Error};
use ticketeer_core::test_utils::{TestHarness, opener};

fn new_panel(guild_id: &str) -> NewPanel {
    NewPanel {
        guild_id: guild_id.into(),
        channel_id: "panel-chan".into(),
        role_id: "staff-role".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_panel_posts_its_message() {
    let h = TestHarness::new().await;

    let panel = h.admin.create_panel(&new_panel("g1")).await.unwrap();
    assert!(panel.message_id.is_some());

    let posted = h.platform.messages_in("panel-chan");
    assert_eq!(posted.len(), 1);
    // No types yet, so the single fallback open button is shown.
    assert_eq!(
        posted[0].message.buttons[0][0].custom_id,
        format!("ticket_open:{}", panel.panel_id)
    );
}

#[tokio::test]
async fn type_changes_refresh_the_panel_message() {
    let h = TestHarness::new().await;
    let panel = h.admin.create_panel(&new_panel("g1")).await.unwrap();

    let type_id = h
        .admin
        .create_ticket_type(&NewTicketType {
            panel_id: panel.panel_id,
            name: "appeals".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    // Still a single message, edited in place, now with the type's button.
    let posted = h.platform.messages_in("panel-chan");
    assert_eq!(posted.len(), 1);
    assert_eq!(
        posted[0].message.buttons[0][0].custom_id,
        format!("ticket_open_type:{type_id}")
    );
    assert_eq!(posted[0].message.buttons[0][0].label, "appeals");
}

#[tokio::test]
async fn disable_toggles_the_posted_buttons() {
    let h = TestHarness::new().await;
    let panel = h.admin.create_panel(&new_panel("g1")).await.unwrap();

    h.admin.set_panel_disabled(panel.panel_id, true).await.unwrap();
    let posted = h.platform.messages_in("panel-chan");
    assert!(posted[0].message.buttons[0][0].disabled);

    h.admin.set_panel_disabled(panel.panel_id, false).await.unwrap();
    let posted = h.platform.messages_in("panel-chan");
    assert!(!posted[0].message.buttons[0][0].disabled);
}

#[tokio::test]
async fn delete_panel_removes_message_and_rows() {
    let h = TestHarness::new().await;
    let panel = h.admin.create_panel(&new_panel("g1")).await.unwrap();
    let ticket = h
        .lifecycle
        .open_ticket(panel.panel_id, None, &opener(), &[])
        .await
        .unwrap();

    h.admin.delete_panel(panel.panel_id).await.unwrap();

    assert!(h.platform.messages_in("panel-chan").is_empty());
    assert!(h.panels.get(panel.panel_id).await.unwrap().is_none());
    assert!(h.tickets.get(ticket.ticket_id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_of_the_last_type_is_rejected() {
    let h = TestHarness::new().await;
    let panel = h.admin.create_panel(&new_panel("g1")).await.unwrap();
    let type_id = h
        .admin
        .create_ticket_type(&NewTicketType {
            panel_id: panel.panel_id,
            name: "only".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let err = h.admin.delete_ticket_type(type_id).await.unwrap_err();
    match err {
        Error::Rejected(reason) => assert_eq!(reason, DenyReason::LastTicketType),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn form_spec_reflects_questions_in_order() {
    let h = TestHarness::new().await;
    let panel = h.admin.create_panel(&new_panel("g1")).await.unwrap();
    let type_id = h
        .admin
        .create_ticket_type(&NewTicketType {
            panel_id: panel.panel_id,
            name: "bugs".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    h.admin
        .add_question(&NewQuestion {
            ticket_type_id: type_id,
            label: "Summary".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    h.admin
        .add_question(&NewQuestion {
            ticket_type_id: type_id,
            label: "Steps to reproduce".into(),
            style: Some(QuestionStyle::Paragraph),
            required: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();

    let form = h.admin.form_for_type(type_id).await.unwrap();
    assert_eq!(form.custom_id, format!("ticket_form:{type_id}"));
    assert_eq!(form.title, "bugs");
    assert_eq!(form.fields.len(), 2);
    assert_eq!(form.fields[0].label, "Summary");
    assert!(form.fields[0].required);
    assert_eq!(form.fields[1].style, QuestionStyle::Paragraph);
    assert!(!form.fields[1].required);
}

#[tokio::test]
async fn blank_question_labels_are_rejected() {
    let h = TestHarness::new().await;
    let panel = h.admin.create_panel(&new_panel("g1")).await.unwrap();
    let type_id = h
        .admin
        .create_ticket_type(&NewTicketType {
            panel_id: panel.panel_id,
            name: "bugs".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let err = h
        .admin
        .add_question(&NewQuestion {
            ticket_type_id: type_id,
            label: "   ".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    match err {
        Error::Rejected(reason) => assert_eq!(reason, DenyReason::InvalidName),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn list_panels_reports_open_counts() {
    let h = TestHarness::new().await;
    let panel = h.admin.create_panel(&new_panel("g1")).await.unwrap();
    h.lifecycle
        .open_ticket(panel.panel_id, None, &opener(), &[])
        .await
        .unwrap();

    let listed = h.admin.list_panels("g1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].0.panel_id, panel.panel_id);
    assert_eq!(listed[0].1, 1);
}
