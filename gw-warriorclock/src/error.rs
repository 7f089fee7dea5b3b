//! Error types for session construction and engine transitions.
//!
//! There are exactly two engine failure modes. A `DefinitionError` is raised
//! before any session exists and means the configuration was malformed. A
//! `TransitionError` is raised at run time when an action is not allowed in
//! the current state; it never changes engine state.

use std::fmt;
use thiserror::Error;

/// A session definition failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("a session needs at least one segment")]
    EmptySegments,

    #[error("segment {index} has a non-positive or missing duration")]
    NonPositiveDuration { index: usize },

    #[error("segment {index} has no duration but the format advances on time only")]
    UntimedSegment { index: usize },

    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("parameter `{0}` must be greater than zero")]
    NonPositiveParameter(&'static str),

    #[error("round count {rounds} does not match the format's {expected} rounds")]
    RoundMismatch { rounds: u32, expected: u32 },

    #[error("this format needs a bounded round count")]
    UnboundedRounds,
}

/// The user-facing actions an engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Start,
    Pause,
    Resume,
    AdvanceManually,
    CompleteRound,
    Cancel,
    Finish,
    RecordReps,
    SetNote,
    Reset,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Start => "start",
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::AdvanceManually => "advance",
            Action::CompleteRound => "complete a round",
            Action::Cancel => "cancel",
            Action::Finish => "finish",
            Action::RecordReps => "record reps",
            Action::SetNote => "set a note",
            Action::Reset => "reset",
        };
        f.write_str(label)
    }
}

/// The variant of `EngineState` without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Idle,
    LeadIn,
    Active,
    Paused,
    Completed,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StateKind::Idle => "idle",
            StateKind::LeadIn => "in lead-in",
            StateKind::Active => "active",
            StateKind::Paused => "paused",
            StateKind::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Why an action was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    /// The action is not defined for the current state.
    WrongState,
    /// The state allows it but the session's format or current segment does not.
    FormatForbids,
    /// The engine's dispatcher is gone, so nothing could be applied.
    EngineStopped,
}

/// An action was attempted in a state that forbids it. State is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub action: Action,
    /// The state the action was checked against; `None` once the engine has stopped.
    pub state: Option<StateKind>,
    pub reason: TransitionReason,
}

impl TransitionError {
    pub(crate) fn wrong_state(action: Action, state: StateKind) -> Self {
        Self {
            action,
            state: Some(state),
            reason: TransitionReason::WrongState,
        }
    }

    pub(crate) fn format_forbids(action: Action, state: StateKind) -> Self {
        Self {
            action,
            state: Some(state),
            reason: TransitionReason::FormatForbids,
        }
    }

    pub(crate) fn engine_stopped(action: Action) -> Self {
        Self {
            action,
            state: None,
            reason: TransitionReason::EngineStopped,
        }
    }
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.reason, self.state) {
            (TransitionReason::EngineStopped, _) | (_, None) => {
                write!(f, "cannot {}: the engine has stopped", self.action)
            }
            (TransitionReason::WrongState, Some(state)) => {
                write!(f, "cannot {} while {}", self.action, state)
            }
            (TransitionReason::FormatForbids, Some(state)) => write!(
                f,
                "cannot {} while {}: the session's format does not allow it",
                self.action, state
            ),
        }
    }
}

impl std::error::Error for TransitionError {}

/// A content lookup or resolution failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("no {0} is available")]
    NotFound(&'static str),

    #[error("no breath session named '{0}'")]
    UnknownBreath(String),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
