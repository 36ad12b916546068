// ticketeer-core/src/tasks/autoclose.rs
//
// Background sweeper for inactive tickets. Candidates come from one store
// query; each is closed through the ordinary close path with the synthetic
// "auto-close" actor and no deletion countdown. One bad ticket never stops
// the sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use ticketeer_common::Error;
use ticketeer_common::models::Actor;
use ticketeer_common::traits::repository_traits::TicketRepository;

use crate::services::TicketLifecycleService;

const AUTOCLOSE_REASON: &str = "Automatically closed due to inactivity.";

/// One sweep. Returns how many tickets were closed.
pub async fn run_autoclose_pass(
    tickets: &dyn TicketRepository,
    lifecycle: &TicketLifecycleService,
) -> Result<usize, Error> {
    let candidates = tickets.autoclose_candidates(Utc::now()).await?;
    let mut closed = 0usize;

    for ticket in candidates {
        match lifecycle
            .close_now(
                &ticket.channel_id,
                &Actor::auto_close(),
                Some(AUTOCLOSE_REASON),
                Some(0),
            )
            .await
        {
            Ok(()) => closed += 1,
            // Rejections mean someone beat the sweep to it (already closing);
            // that is fine.
            Err(e) if e.is_rejection() => {}
            Err(e) => {
                error!(
                    "auto-close of ticket #{} (channel {}) failed: {e}",
                    ticket.number, ticket.channel_id
                );
            }
        }
    }

    if closed > 0 {
        info!("auto-close pass closed {closed} inactive ticket(s)");
    }
    Ok(closed)
}

/// Spawn the periodic sweeper. The first pass runs immediately, then every
/// `period` (hourly in production).
pub fn spawn_autoclose_task(
    tickets: Arc<dyn TicketRepository>,
    lifecycle: TicketLifecycleService,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Err(e) = run_autoclose_pass(tickets.as_ref(), &lifecycle).await {
                error!("auto-close pass failed: {e}");
            }
        }
    })
}
