// ticketeer-core/tests/timer_tests.rs
//
// Countdown behavior: delayed deletion, cancel, close requests with
// deadlines, startup recovery. Uses real (short) timers.

use std::time::Duration;

use ticketeer_common::models::{NewTicketType, TicketStatus};
use ticketeer_common::traits::repository_traits::{TicketRepository, TicketTypeRepository};
use ticketeer_common::{DenyReason, Error};
use ticketeer_core::test_utils::{TestHarness, opener, staff};

fn assert_denied(err: Error, expected: DenyReason) {
    match err {
        Error::Rejected(reason) => assert_eq!(reason, expected),
        other => panic!("expected rejection {expected:?}, got {other:?}"),
    }
}

async fn seed_delayed_ticket(h: &TestHarness, delay: i64) -> ticketeer_common::models::Ticket {
    let panel = h.seed_panel().await;
    let id = h
        .types
        .create(&NewTicketType {
            panel_id: panel.panel_id,
            name: "timed".into(),
            delete_delay_seconds: Some(delay),
            ..Default::default()
        })
        .await
        .unwrap();
    h.lifecycle
        .open_ticket(panel.panel_id, Some(id), &opener(), &[])
        .await
        .unwrap()
}

#[tokio::test]
async fn delayed_close_fires_after_the_countdown() {
    let h = TestHarness::new().await;
    let ticket = seed_delayed_ticket(&h, 1).await;

    h.lifecycle
        .close_now(&ticket.channel_id, &staff(), None, None)
        .await
        .unwrap();

    let mid = h.tickets.get(ticket.ticket_id).await.unwrap().unwrap();
    assert_eq!(mid.status, TicketStatus::Closing);
    assert!(h.lifecycle.timers().has_deletion(&ticket.channel_id));
    assert!(!h.platform.deleted(&ticket.channel_id));

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let done = h.tickets.get(ticket.ticket_id).await.unwrap().unwrap();
    assert_eq!(done.status, TicketStatus::Closed);
    assert!(h.platform.deleted(&ticket.channel_id));
    assert!(!h.lifecycle.timers().has_deletion(&ticket.channel_id));
}

#[tokio::test]
async fn cancel_close_restores_open_and_defuses_the_timer() {
    let h = TestHarness::new().await;
    let ticket = seed_delayed_ticket(&h, 1).await;

    h.lifecycle
        .close_now(&ticket.channel_id, &staff(), None, None)
        .await
        .unwrap();
    h.lifecycle
        .cancel_close(&ticket.channel_id, &opener())
        .await
        .unwrap();

    let restored = h.tickets.get(ticket.ticket_id).await.unwrap().unwrap();
    assert_eq!(restored.status, TicketStatus::Open);
    assert!(!h.lifecycle.timers().has_deletion(&ticket.channel_id));

    // The canceled timer never acts, even past its deadline.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!h.platform.deleted(&ticket.channel_id));
    let still = h.tickets.get(ticket.ticket_id).await.unwrap().unwrap();
    assert_eq!(still.status, TicketStatus::Open);
}

#[tokio::test]
async fn countdown_swaps_controls_to_cancel_and_cancel_restores_them() {
    let h = TestHarness::new().await;
    let ticket = seed_delayed_ticket(&h, 60).await;

    h.lifecycle
        .close_now(&ticket.channel_id, &staff(), None, None)
        .await
        .unwrap();

    // During the countdown the control row offers only Cancel Close; the
    // closing notice itself carries no buttons.
    let messages = h.platform.messages_in(&ticket.channel_id);
    let controls = &messages[0].message.buttons[0];
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0].custom_id, "ticket_cancel_close");
    assert!(
        messages
            .last()
            .unwrap()
            .message
            .buttons
            .iter()
            .all(|row| row.is_empty())
    );

    h.lifecycle
        .cancel_close(&ticket.channel_id, &opener())
        .await
        .unwrap();

    // Cancel puts the full row back.
    let messages = h.platform.messages_in(&ticket.channel_id);
    let controls = &messages[0].message.buttons[0];
    assert!(controls.iter().any(|b| b.custom_id == "ticket_close"));
    assert!(controls.iter().any(|b| b.custom_id == "ticket_claim"));

    h.lifecycle.shutdown();
}

#[tokio::test]
async fn cancel_without_a_pending_close_is_rejected() {
    let h = TestHarness::new().await;
    let panel = h.seed_panel().await;
    let ticket = h
        .lifecycle
        .open_ticket(panel.panel_id, None, &opener(), &[])
        .await
        .unwrap();

    let err = h
        .lifecycle
        .cancel_close(&ticket.channel_id, &opener())
        .await
        .unwrap_err();
    assert_denied(err, DenyReason::NothingToCancel);
}

#[tokio::test]
async fn concurrent_closes_yield_one_transcript_and_one_deletion() {
    let h = TestHarness::new().await;
    h.set_guild_log_channel("guild-1", "log-chan").await;
    let panel = h.seed_panel().await;
    let ticket = h
        .lifecycle
        .open_ticket(panel.panel_id, None, &opener(), &[])
        .await
        .unwrap();

    let a = {
        let svc = h.lifecycle.clone();
        let channel = ticket.channel_id.clone();
        tokio::spawn(async move { svc.close_now(&channel, &staff(), None, Some(0)).await })
    };
    let b = {
        let svc = h.lifecycle.clone();
        let channel = ticket.channel_id.clone();
        tokio::spawn(async move { svc.close_now(&channel, &staff(), None, Some(0)).await })
    };

    let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
    assert!(ra.is_ok() != rb.is_ok(), "exactly one close must win");

    let log = h.log.snapshot();
    let renders = log
        .iter()
        .filter(|e| **e == format!("render_transcript:{}", ticket.channel_id))
        .count();
    let deletes = log
        .iter()
        .filter(|e| **e == format!("delete_channel:{}", ticket.channel_id))
        .count();
    assert_eq!(renders, 1);
    assert_eq!(deletes, 1);
}

#[tokio::test]
async fn close_request_deadline_auto_accepts_exactly_once() {
    let h = TestHarness::new().await;
    h.set_guild_log_channel("guild-1", "log-chan").await;
    let ticket = seed_delayed_ticket(&h, 0).await;

    h.lifecycle
        .request_close(&ticket.channel_id, &staff(), Some("inactive"), Some(1))
        .await
        .unwrap();
    assert!(h.lifecycle.timers().has_close_request(&ticket.channel_id));

    tokio::time::sleep(Duration::from_millis(1600)).await;

    let done = h.tickets.get(ticket.ticket_id).await.unwrap().unwrap();
    assert_eq!(done.status, TicketStatus::Closed);
    assert!(!h.lifecycle.timers().has_close_request(&ticket.channel_id));

    // Exactly one close log, alongside the opened record.
    let close_logs = h
        .platform
        .messages_in("log-chan")
        .iter()
        .filter(|m| {
            m.message
                .embed
                .as_ref()
                .is_some_and(|e| e.title.ends_with("closed"))
        })
        .count();
    assert_eq!(close_logs, 1);
}

#[tokio::test]
async fn second_close_request_is_rejected_while_one_is_pending() {
    let h = TestHarness::new().await;
    let ticket = seed_delayed_ticket(&h, 0).await;

    h.lifecycle
        .request_close(&ticket.channel_id, &staff(), None, None)
        .await
        .unwrap();
    let err = h
        .lifecycle
        .request_close(&ticket.channel_id, &staff(), None, None)
        .await
        .unwrap_err();
    assert_denied(err, DenyReason::CloseRequestPending);
}

#[tokio::test]
async fn only_the_opener_resolves_a_close_request() {
    let h = TestHarness::new().await;
    let ticket = seed_delayed_ticket(&h, 0).await;

    h.lifecycle
        .request_close(&ticket.channel_id, &staff(), None, None)
        .await
        .unwrap();

    let err = h
        .lifecycle
        .accept_close_request(&ticket.channel_id, &staff())
        .await
        .unwrap_err();
    assert_denied(err, DenyReason::NotRequester);

    // Deny keeps it open and clears the request.
    h.lifecycle
        .deny_close_request(&ticket.channel_id, &opener())
        .await
        .unwrap();
    let still = h.tickets.get(ticket.ticket_id).await.unwrap().unwrap();
    assert_eq!(still.status, TicketStatus::Open);
    assert!(!h.lifecycle.timers().has_close_request(&ticket.channel_id));

    let err = h
        .lifecycle
        .accept_close_request(&ticket.channel_id, &opener())
        .await
        .unwrap_err();
    assert_denied(err, DenyReason::NoCloseRequest);
}

#[tokio::test]
async fn accepting_a_close_request_closes_the_ticket() {
    let h = TestHarness::new().await;
    let ticket = seed_delayed_ticket(&h, 0).await;

    h.lifecycle
        .request_close(&ticket.channel_id, &staff(), Some("resolved"), Some(60))
        .await
        .unwrap();
    h.lifecycle
        .accept_close_request(&ticket.channel_id, &opener())
        .await
        .unwrap();

    let done = h.tickets.get(ticket.ticket_id).await.unwrap().unwrap();
    assert_eq!(done.status, TicketStatus::Closed);
    assert!(h.platform.deleted(&ticket.channel_id));

    // The deadline timer was aborted with the request.
    assert!(!h.lifecycle.timers().has_close_request(&ticket.channel_id));
}

#[tokio::test]
async fn shutdown_aborts_countdowns_and_recovery_reopens() {
    let h = TestHarness::new().await;
    let ticket = seed_delayed_ticket(&h, 1).await;

    h.lifecycle
        .close_now(&ticket.channel_id, &staff(), None, None)
        .await
        .unwrap();
    h.lifecycle.shutdown();
    assert_eq!(h.lifecycle.timers().pending_deletion_count(), 0);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!h.platform.deleted(&ticket.channel_id));
    let stuck = h.tickets.get(ticket.ticket_id).await.unwrap().unwrap();
    assert_eq!(stuck.status, TicketStatus::Closing);

    // Next startup puts the row back in play.
    let restored = h.lifecycle.recover_on_startup().await.unwrap();
    assert_eq!(restored, 1);
    let open = h.tickets.get(ticket.ticket_id).await.unwrap().unwrap();
    assert_eq!(open.status, TicketStatus::Open);
}
