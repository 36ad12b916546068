// ticketeer-core/tests/guard_tests.rs

use ticketeer_common::models::{NewQuestion, NewTicketType};
use ticketeer_common::traits::repository_traits::{
    QuestionRepository, TicketRepository, TicketTypeRepository,
};
use ticketeer_common::{DenyReason, Error};
use ticketeer_core::guard;
use ticketeer_core::test_utils::TestHarness;

fn assert_denied(result: Result<(), Error>, expected: DenyReason) {
    match result {
        Err(Error::Rejected(reason)) => assert_eq!(reason, expected),
        other => panic!("expected rejection {expected:?}, got {other:?}"),
    }
}

#[tokio::test]
async fn guild_panel_limit_is_fifty() {
    let h = TestHarness::new().await;
    for _ in 0..49 {
        h.seed_panel_in("g1").await;
    }
    guard::check_panel_limit(h.panels.as_ref(), "g1")
        .await
        .unwrap();

    h.seed_panel_in("g1").await;
    assert_denied(
        guard::check_panel_limit(h.panels.as_ref(), "g1").await,
        DenyReason::PanelLimit,
    );

    // Other guilds are unaffected.
    guard::check_panel_limit(h.panels.as_ref(), "g2")
        .await
        .unwrap();
}

#[tokio::test]
async fn type_limit_is_five_with_a_floor_of_one() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;

    for i in 0..5 {
        h.seed_type_named(panel.panel_id, &format!("type-{i}")).await;
    }
    assert_denied(
        guard::check_type_limit(h.types.as_ref(), panel.panel_id).await,
        DenyReason::TicketTypeLimit,
    );

    // Floor: with more than one type deletion is allowed, with one it is not.
    guard::check_not_last_type(h.types.as_ref(), panel.panel_id)
        .await
        .unwrap();
    let types = h.types.list_for_panel(panel.panel_id).await.unwrap();
    for tt in &types[1..] {
        h.types.delete(tt.ticket_type_id).await.unwrap();
    }
    assert_denied(
        guard::check_not_last_type(h.types.as_ref(), panel.panel_id).await,
        DenyReason::LastTicketType,
    );
}

#[tokio::test]
async fn question_limit_is_five() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;
    let tt = h.seed_type(panel.panel_id).await;

    for i in 0..5 {
        h.questions
            .create(&NewQuestion {
                ticket_type_id: tt.ticket_type_id,
                label: format!("q{i}"),
                ..Default::default()
            })
            .await
            .unwrap();
    }
    assert_denied(
        guard::check_question_limit(h.questions.as_ref(), tt.ticket_type_id).await,
        DenyReason::QuestionLimit,
    );
}

#[tokio::test]
async fn disabled_panel_rejects_opens() {
    let h = TestHarness::new().await;
    let mut panel = h.seed_panel().await;
    panel.disabled = true;

    assert_denied(
        guard::check_open_allowed(h.tickets.as_ref(), &panel, None, "u1").await,
        DenyReason::PanelDisabled,
    );
}

#[tokio::test]
async fn panel_caps_at_fifty_open_tickets() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;

    for i in 0..50 {
        h.tickets
            .create(panel.panel_id, None, &format!("ch{i}"), &format!("u{i}"))
            .await
            .unwrap();
    }
    assert_denied(
        guard::check_open_allowed(h.tickets.as_ref(), &panel, None, "u-new").await,
        DenyReason::PanelFull,
    );

    // Closing one frees a slot.
    h.tickets.mark_closed("ch0").await.unwrap();
    guard::check_open_allowed(h.tickets.as_ref(), &panel, None, "u-new")
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_open_is_panel_scoped_without_a_type() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;
    h.tickets.create(panel.panel_id, None, "ch1", "u1").await.unwrap();

    assert_denied(
        guard::check_open_allowed(h.tickets.as_ref(), &panel, None, "u1").await,
        DenyReason::DuplicateTicket,
    );
    guard::check_open_allowed(h.tickets.as_ref(), &panel, None, "u2")
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_open_is_type_scoped_and_honors_allow_duplicate() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;
    let strict = h.seed_type_named(panel.panel_id, "strict").await;
    let lax_id = h
        .types
        .create(&NewTicketType {
            panel_id: panel.panel_id,
            name: "lax".into(),
            allow_duplicate: true,
            ..Default::default()
        })
        .await
        .unwrap();
    let lax = h.types.get(lax_id).await.unwrap().unwrap();

    h.tickets
        .create(panel.panel_id, Some(strict.ticket_type_id), "ch1", "u1")
        .await
        .unwrap();

    assert_denied(
        guard::check_open_allowed(h.tickets.as_ref(), &panel, Some(&strict), "u1").await,
        DenyReason::DuplicateTicket,
    );
    // A different type under the same panel is fine.
    guard::check_open_allowed(h.tickets.as_ref(), &panel, Some(&lax), "u1")
        .await
        .unwrap();

    // allow_duplicate lets the same user stack tickets of that type.
    h.tickets
        .create(panel.panel_id, Some(lax.ticket_type_id), "ch2", "u1")
        .await
        .unwrap();
    guard::check_open_allowed(h.tickets.as_ref(), &panel, Some(&lax), "u1")
        .await
        .unwrap();
}
