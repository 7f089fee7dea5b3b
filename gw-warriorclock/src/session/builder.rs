//! Turns format-specific configuration into validated session definitions.
//!
//! These structs are designed to be deserialized from a configuration file
//! (e.g., the `[[workouts]]` tables of a TOML file) using `serde`, so that
//! user-authored sessions can be declared outside the application code.

use crate::common::SessionKind;
use crate::error::DefinitionError;
use crate::session::definition::{Format, RoundCount, SessionDefinition};
use crate::session::segment::{Segment, SegmentKind};
use serde::{Deserialize, Serialize};

/// Work seconds of a Tabata interval when the workout does not say.
pub const TABATA_WORK_SECONDS: u32 = 20;
/// Rest seconds of a Tabata interval when the workout does not say.
pub const TABATA_REST_SECONDS: u32 = 10;
/// Work/rest pairs per exercise in a Tabata.
pub const TABATA_INTERVALS: u32 = 8;

/// Anything an engine can be built from.
///
/// Configurations validate on conversion; a `SessionDefinition` is already valid.
pub trait IntoDefinition {
    fn into_definition(self) -> Result<SessionDefinition, DefinitionError>;
}

impl IntoDefinition for SessionDefinition {
    fn into_definition(self) -> Result<SessionDefinition, DefinitionError> {
        Ok(self)
    }
}

impl IntoDefinition for &BreathConfig {
    fn into_definition(self) -> Result<SessionDefinition, DefinitionError> {
        self.build()
    }
}

impl IntoDefinition for &WorkoutConfig {
    fn into_definition(self) -> Result<SessionDefinition, DefinitionError> {
        self.build()
    }
}

impl IntoDefinition for TimerConfig {
    fn into_definition(self) -> Result<SessionDefinition, DefinitionError> {
        self.build()
    }
}

/// A breath phase as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreathPhaseKind {
    Inhale,
    HoldIn,
    Exhale,
    HoldOut,
}

impl From<BreathPhaseKind> for SegmentKind {
    fn from(kind: BreathPhaseKind) -> Self {
        match kind {
            BreathPhaseKind::Inhale => SegmentKind::Inhale,
            BreathPhaseKind::HoldIn => SegmentKind::HoldAfterInhale,
            BreathPhaseKind::Exhale => SegmentKind::Exhale,
            BreathPhaseKind::HoldOut => SegmentKind::HoldAfterExhale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathPhase {
    pub kind: BreathPhaseKind,
    pub seconds: u32,
}

impl BreathPhase {
    pub fn new(kind: BreathPhaseKind, seconds: u32) -> Self {
        Self { kind, seconds }
    }
}

/// A breathing pattern repeated for a number of rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub phases: Vec<BreathPhase>,
    pub rounds: u32,
    /// Marks the curated session offered when the user has not picked one.
    #[serde(default)]
    pub is_default: bool,
}

impl BreathConfig {
    pub fn build(&self) -> Result<SessionDefinition, DefinitionError> {
        let segments = self
            .phases
            .iter()
            .map(|phase| Segment::timed(phase.kind.into(), phase.seconds))
            .collect();
        SessionDefinition::new(
            SessionKind::Breath,
            self.name.clone(),
            segments,
            RoundCount::Bounded(self.rounds),
            Format::FixedRounds(self.rounds),
        )
    }
}

/// The workout styles offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkoutType {
    /// As many rounds as possible within the time cap.
    Amrap,
    /// Work/rest intervals per exercise.
    Tabata,
    /// A prescribed number of rounds at the user's pace.
    Rounds,
    /// The circuit as fast as possible within the time cap.
    TimeLimited,
}

impl WorkoutType {
    pub fn display_name(&self) -> &'static str {
        match self {
            WorkoutType::Amrap => "AMRAP",
            WorkoutType::Tabata => "Tabata",
            WorkoutType::Rounds => "For Rounds",
            WorkoutType::TimeLimited => "For Time",
        }
    }
}

/// One exercise prescription inside a workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseConfig {
    pub exercise: String,
    #[serde(default)]
    pub reps: Option<u32>,
    /// Seconds; makes the exercise time-based.
    #[serde(default)]
    pub duration: Option<u32>,
}

impl ExerciseConfig {
    pub fn reps(exercise: impl Into<String>, reps: u32) -> Self {
        Self {
            exercise: exercise.into(),
            reps: Some(reps),
            duration: None,
        }
    }

    /// An exercise with no prescription of its own, as used in interval workouts.
    pub fn named(exercise: impl Into<String>) -> Self {
        Self {
            exercise: exercise.into(),
            reps: None,
            duration: None,
        }
    }

    pub fn timed(exercise: impl Into<String>, seconds: u32) -> Self {
        Self {
            exercise: exercise.into(),
            reps: None,
            duration: Some(seconds),
        }
    }
}

/// A workout circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub workout_type: WorkoutType,
    pub exercises: Vec<ExerciseConfig>,
    /// Seconds; required for AMRAP and For Time.
    #[serde(default)]
    pub time_cap: Option<u32>,
    /// Required for For Rounds.
    #[serde(default)]
    pub rounds: Option<u32>,
    #[serde(default)]
    pub work_interval: Option<u32>,
    #[serde(default)]
    pub rest_interval: Option<u32>,
}

impl WorkoutConfig {
    pub fn build(&self) -> Result<SessionDefinition, DefinitionError> {
        let (segments, rounds, format) = match self.workout_type {
            WorkoutType::Amrap | WorkoutType::TimeLimited => {
                let cap_seconds = self
                    .time_cap
                    .ok_or(DefinitionError::MissingParameter("time_cap"))?;
                (
                    self.exercise_segments(),
                    RoundCount::Unbounded,
                    Format::TimeCapped { cap_seconds },
                )
            }
            WorkoutType::Rounds => {
                let rounds = self
                    .rounds
                    .ok_or(DefinitionError::MissingParameter("rounds"))?;
                (
                    self.exercise_segments(),
                    RoundCount::Bounded(rounds),
                    Format::UserPacedRounds,
                )
            }
            WorkoutType::Tabata => {
                // Interval timing replaces any per-exercise prescription.
                let segments = self
                    .exercises
                    .iter()
                    .map(|exercise| Segment::exercise(&exercise.exercise, None, None))
                    .collect();
                (
                    segments,
                    RoundCount::Bounded(1),
                    Format::WorkRestIntervals {
                        work_seconds: self.work_interval.unwrap_or(TABATA_WORK_SECONDS),
                        rest_seconds: self.rest_interval.unwrap_or(TABATA_REST_SECONDS),
                        intervals_per_segment: TABATA_INTERVALS,
                    },
                )
            }
        };
        SessionDefinition::new(SessionKind::Workout, self.name.clone(), segments, rounds, format)
    }

    fn exercise_segments(&self) -> Vec<Segment> {
        self.exercises
            .iter()
            .map(|exercise| Segment::exercise(&exercise.exercise, exercise.reps, exercise.duration))
            .collect()
    }

    /// A rough length hint for listings.
    pub fn estimated_duration(&self) -> String {
        match self.workout_type {
            WorkoutType::Amrap | WorkoutType::TimeLimited => match self.time_cap {
                Some(cap) => format!("{} min", cap / 60),
                None => "Variable".to_string(),
            },
            WorkoutType::Tabata => {
                let pair = self.work_interval.unwrap_or(TABATA_WORK_SECONDS)
                    + self.rest_interval.unwrap_or(TABATA_REST_SECONDS);
                let total = pair * TABATA_INTERVALS * self.exercises.len() as u32;
                format!("{} min", total / 60)
            }
            WorkoutType::Rounds => format!("{} rounds", self.rounds.unwrap_or(1)),
        }
    }
}

/// A bare countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub duration_seconds: u32,
}

impl TimerConfig {
    pub fn build(&self) -> Result<SessionDefinition, DefinitionError> {
        if self.duration_seconds == 0 {
            return Err(DefinitionError::NonPositiveParameter("duration"));
        }
        SessionDefinition::new(
            SessionKind::Timer,
            format!("Timer {}", crate::common::format_clock(self.duration_seconds)),
            vec![Segment::timed(SegmentKind::Work, self.duration_seconds)],
            RoundCount::Unbounded,
            Format::TimeCapped {
                cap_seconds: self.duration_seconds,
            },
        )
    }
}
