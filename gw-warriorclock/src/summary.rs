//! The terminal record of a completed session and the sink that receives it.

use crate::common::{format_clock, SessionKind};
use serde::{Deserialize, Serialize};

/// What a completed session achieved. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    /// Active seconds; lead-in and paused time are excluded.
    pub total_elapsed_seconds: u32,
    pub rounds_completed: u32,
    /// Reps into an unfinished round.
    pub reps_completed: Option<u32>,
    pub note: Option<String>,
}

impl CompletionSummary {
    /// Renders the result the way a log line shows it, e.g. `3+5 rounds in 12:00`.
    pub fn display_string(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        match self.reps_completed {
            Some(reps) if reps > 0 => {
                parts.push(format!("{}+{} rounds", self.rounds_completed, reps))
            }
            _ => parts.push(format!("{} rounds", self.rounds_completed)),
        }
        if self.total_elapsed_seconds > 0 {
            parts.push(format_clock(self.total_elapsed_seconds));
        }
        parts.join(" in ")
    }
}

/// Receives each completed session exactly once.
///
/// Implemented by whatever records today's activity. The engine calls it from
/// its dispatcher, so implementations should return quickly and must not call
/// back into the engine that invoked them.
pub trait CompletionSink: Send + Sync {
    fn session_completed(&self, kind: SessionKind, name: &str, summary: &CompletionSummary);
}
