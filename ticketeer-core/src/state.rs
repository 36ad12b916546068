// ticketeer-core/src/state.rs
//
// Ticket status transitions. The claim flag lives outside this machine on
// purpose: claiming and closing never gate each other.

use ticketeer_common::Error;
use ticketeer_common::models::TicketStatus;

/// Legal transitions:
///   open    -> closing   (close begins, countdown pending)
///   closing -> open      (cancel, or startup recovery)
///   closing -> closed    (countdown fired, channel deleted)
/// `closed` is terminal; reopening creates a new ticket instead of
/// resurrecting the old row.
pub fn can_transition(from: TicketStatus, to: TicketStatus) -> bool {
    matches!(
        (from, to),
        (TicketStatus::Open, TicketStatus::Closing)
            | (TicketStatus::Closing, TicketStatus::Open)
            | (TicketStatus::Closing, TicketStatus::Closed)
    )
}

pub fn ensure_transition(from: TicketStatus, to: TicketStatus) -> Result<(), Error> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(Error::InvalidState(format!(
            "illegal ticket transition {} -> {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TicketStatus::*;

    #[test]
    fn close_cancel_and_finalize_are_legal() {
        assert!(can_transition(Open, Closing));
        assert!(can_transition(Closing, Open));
        assert!(can_transition(Closing, Closed));
    }

    #[test]
    fn closed_is_terminal() {
        assert!(!can_transition(Closed, Open));
        assert!(!can_transition(Closed, Closing));
        assert!(!can_transition(Closed, Closed));
    }

    #[test]
    fn no_direct_open_to_closed() {
        assert!(!can_transition(Open, Closed));
    }

    #[test]
    fn self_transitions_are_illegal() {
        assert!(!can_transition(Open, Open));
        assert!(!can_transition(Closing, Closing));
    }

    #[test]
    fn ensure_transition_reports_invalid_state() {
        let err = ensure_transition(Closed, Open).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }
}
