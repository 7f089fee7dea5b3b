//! The observable state of a session engine.

use crate::error::StateKind;
use crate::session::IntervalPosition;
use crate::summary::CompletionSummary;

/// Position and counters of a running session.
///
/// This is the payload of both `Active` and `Paused`; pausing stores it
/// untouched and resuming puts the same value back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveState {
    pub segment_index: usize,
    /// 1-based.
    pub round: u32,
    /// `None` while on a manually advanced segment.
    pub time_remaining_in_segment: Option<u32>,
    pub total_elapsed_seconds: u32,
    /// Seconds left before a time cap ends the session.
    pub cap_remaining: Option<u32>,
    /// Set only under work/rest intervals.
    pub interval: Option<IntervalPosition>,
}

/// Exactly one of these holds at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    LeadIn {
        seconds_remaining: u32,
    },
    Active(ActiveState),
    Paused(ActiveState),
    Completed(CompletionSummary),
}

impl EngineState {
    pub fn kind(&self) -> StateKind {
        match self {
            EngineState::Idle => StateKind::Idle,
            EngineState::LeadIn { .. } => StateKind::LeadIn,
            EngineState::Active(_) => StateKind::Active,
            EngineState::Paused(_) => StateKind::Paused,
            EngineState::Completed(_) => StateKind::Completed,
        }
    }

    /// The running payload, whether active or paused.
    pub fn active(&self) -> Option<&ActiveState> {
        match self {
            EngineState::Active(active) | EngineState::Paused(active) => Some(active),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&CompletionSummary> {
        match self {
            EngineState::Completed(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineState::Completed(_))
    }
}
