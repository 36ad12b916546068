// ticketeer-core/src/timers.rs
//
// In-memory registries for the two countdowns a ticket can carry: the
// post-close deletion delay and a pending close request. Entries are keyed by
// channel id. Resolution is remove-first: whichever path removes the entry
// (cancel, expiry, accept, deny) owns it, and every other path sees a miss
// and backs off. A process restart clears both maps by construction;
// persistent state is recovered separately.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use ticketeer_common::models::Actor;
use ticketeer_common::traits::platform_traits::MessageRef;

/// A scheduled channel deletion for a ticket in `closing`.
pub struct PendingDeletion {
    pub ticket_id: i64,
    pub handle: JoinHandle<()>,
}

/// A staff close request awaiting the opener's answer.
pub struct PendingCloseRequest {
    pub ticket_id: i64,
    pub requested_by: Actor,
    pub reason: Option<String>,
    /// The accept/deny prompt message, edited once resolved.
    pub message: MessageRef,
    /// Deadline task that auto-accepts; absent when no deadline was given.
    pub handle: Option<JoinHandle<()>>,
}

#[derive(Clone, Default)]
pub struct TimerRegistry {
    deletions: Arc<DashMap<String, PendingDeletion>>,
    close_requests: Arc<DashMap<String, PendingCloseRequest>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_deletion(&self, channel_id: &str, pending: PendingDeletion) {
        if let Some(old) = self.deletions.insert(channel_id.to_string(), pending) {
            debug!("replacing stale deletion timer for channel {channel_id}");
            old.handle.abort();
        }
    }

    /// Claim the deletion entry. The winner must either abort the handle
    /// (cancel path) or be the timer task itself (expiry path) and just drop
    /// it.
    pub fn take_deletion(&self, channel_id: &str) -> Option<PendingDeletion> {
        self.deletions.remove(channel_id).map(|(_, v)| v)
    }

    pub fn has_deletion(&self, channel_id: &str) -> bool {
        self.deletions.contains_key(channel_id)
    }

    pub fn insert_close_request(&self, channel_id: &str, pending: PendingCloseRequest) {
        if let Some(old) = self.close_requests.insert(channel_id.to_string(), pending) {
            debug!("replacing stale close request for channel {channel_id}");
            if let Some(h) = old.handle {
                h.abort();
            }
        }
    }

    pub fn take_close_request(&self, channel_id: &str) -> Option<PendingCloseRequest> {
        self.close_requests.remove(channel_id).map(|(_, v)| v)
    }

    pub fn has_close_request(&self, channel_id: &str) -> bool {
        self.close_requests.contains_key(channel_id)
    }

    /// Requester and prompt of the pending close request, without consuming
    /// it. Callers hold the channel lock, so peek-then-take does not race.
    pub fn peek_close_request(&self, channel_id: &str) -> Option<(i64, Actor, MessageRef)> {
        self.close_requests.get(channel_id).map(|entry| {
            (
                entry.ticket_id,
                entry.requested_by.clone(),
                entry.message.clone(),
            )
        })
    }

    /// Abort every outstanding timer. Called on shutdown; closing-state
    /// recovery at next startup picks up whatever these would have finished.
    pub fn shutdown(&self) {
        self.deletions.retain(|_, pending| {
            pending.handle.abort();
            false
        });
        self.close_requests.retain(|_, pending| {
            if let Some(h) = &pending.handle {
                h.abort();
            }
            false
        });
    }

    pub fn pending_deletion_count(&self) -> usize {
        self.deletions.len()
    }

    pub fn pending_close_request_count(&self) -> usize {
        self.close_requests.len()
    }
}
