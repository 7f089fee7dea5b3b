//! Contains everything that describes a session before it runs.
//!
//! Segments are the atomic units, a `SessionDefinition` arranges them under a
//! `Format`, and the builders turn user-facing configuration into validated
//! definitions. The execution engine consumes definitions and never mutates them.

pub mod builder;
pub mod definition;
pub mod segment;

pub use builder::{
    BreathConfig, BreathPhase, BreathPhaseKind, ExerciseConfig, IntoDefinition, TimerConfig,
    WorkoutConfig, WorkoutType,
};
pub use definition::{
    Format, IntervalPhase, IntervalPosition, RoundCount, SessionDefinition,
};
pub use segment::{Segment, SegmentKind};
