//! Defines all public event types broadcast by a session engine.
//!
//! The state snapshot stream tells a consumer *where* a session is; these
//! events tell it *what just happened*, which is what a consumer needs for
//! cues such as a chime on each new segment or a banner on round completion.

use crate::session::IntervalPosition;
use crate::summary::CompletionSummary;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

/// Events describing one run of a session, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// `start()` was accepted and the lead-in countdown began.
    LeadInStarted { seconds: u32 },
    /// One lead-in second elapsed.
    LeadInTick { seconds_remaining: u32 },
    /// A segment (or work/rest step) became current.
    SegmentStarted {
        segment_index: usize,
        round: u32,
        interval: Option<IntervalPosition>,
    },
    /// The segment list wrapped and the round counter moved on.
    RoundCompleted { rounds_completed: u32 },
    Paused { total_elapsed_seconds: u32 },
    Resumed { total_elapsed_seconds: u32 },
    /// Terminal. Sent once per run.
    Completed(CompletionSummary),
    /// The run was abandoned; nothing is recorded.
    Cancelled,
    /// The engine returned to `Idle` after a completed run.
    Reset,
}

/// Receives the next event, skipping past any that a slow listener missed.
///
/// Returns `None` only once every sender is gone.
pub async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> Option<SessionEvent> {
    loop {
        match events.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event listener fell behind; {} events skipped.", skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(rounds_completed: u32) -> SessionEvent {
        SessionEvent::RoundCompleted { rounds_completed }
    }

    #[tokio::test]
    async fn lagging_listener_keeps_going_until_closed() {
        let (tx, mut rx) = broadcast::channel(2);
        for n in 1..=5 {
            tx.send(round(n)).unwrap();
        }

        assert_eq!(next_event(&mut rx).await, Some(round(4)));
        assert_eq!(next_event(&mut rx).await, Some(round(5)));

        tx.send(SessionEvent::Cancelled).unwrap();
        drop(tx);
        assert_eq!(next_event(&mut rx).await, Some(SessionEvent::Cancelled));
        assert_eq!(next_event(&mut rx).await, None);
    }
}
