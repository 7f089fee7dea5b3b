//! The immutable description of what a session runs.
//!
//! A `SessionDefinition` can only be obtained through `SessionDefinition::new`
//! (or the configuration builders that call it), so every value in circulation
//! has passed validation. The engine reads it and never mutates it.

use crate::common::SessionKind;
use crate::error::DefinitionError;
use crate::session::segment::{Segment, SegmentKind};
use serde::Serialize;

/// Completion semantics of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Format {
    /// Ends when the cap runs out, wherever the session is.
    TimeCapped { cap_seconds: u32 },
    /// Ends after `n` clock-driven passes over the segments.
    FixedRounds(u32),
    /// The user moves through segments and rounds.
    UserPacedRounds,
    /// Each segment expands into alternating work and rest intervals.
    WorkRestIntervals {
        work_seconds: u32,
        rest_seconds: u32,
        intervals_per_segment: u32,
    },
}

/// How many rounds a session targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundCount {
    Bounded(u32),
    Unbounded,
}

impl RoundCount {
    pub fn bounded(self) -> Option<u32> {
        match self {
            RoundCount::Bounded(n) => Some(n),
            RoundCount::Unbounded => None,
        }
    }
}

/// Work or rest half of an interval pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntervalPhase {
    Work,
    Rest,
}

/// Where a work/rest step sits within its exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntervalPosition {
    /// 1-based interval number within the current segment.
    pub number: u32,
    pub of: u32,
    pub phase: IntervalPhase,
}

/// One step of the run-time plan.
///
/// Outside work/rest formats the plan mirrors the segment list one to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlanStep {
    pub segment_index: usize,
    pub duration_seconds: Option<u32>,
    pub manual: bool,
    pub interval: Option<IntervalPosition>,
}

/// A validated, immutable session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionDefinition {
    kind: SessionKind,
    name: String,
    segments: Vec<Segment>,
    rounds: RoundCount,
    format: Format,
}

impl SessionDefinition {
    /// Validates and builds a definition.
    pub fn new(
        kind: SessionKind,
        name: impl Into<String>,
        segments: Vec<Segment>,
        rounds: RoundCount,
        format: Format,
    ) -> Result<Self, DefinitionError> {
        let definition = Self {
            kind,
            name: name.into(),
            segments,
            rounds,
            format,
        };
        definition.validate()?;
        Ok(definition)
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        if self.segments.is_empty() {
            return Err(DefinitionError::EmptySegments);
        }
        for (index, segment) in self.segments.iter().enumerate() {
            match segment.duration_seconds {
                Some(0) => return Err(DefinitionError::NonPositiveDuration { index }),
                None if segment.kind.requires_duration() => {
                    return Err(DefinitionError::NonPositiveDuration { index })
                }
                _ => {}
            }
            if let SegmentKind::Exercise {
                target_reps: Some(0),
                ..
            } = segment.kind
            {
                return Err(DefinitionError::NonPositiveParameter("reps"));
            }
        }
        if self.rounds == RoundCount::Bounded(0) {
            return Err(DefinitionError::NonPositiveParameter("rounds"));
        }

        match self.format {
            Format::TimeCapped { cap_seconds } => {
                if cap_seconds == 0 {
                    return Err(DefinitionError::NonPositiveParameter("time_cap"));
                }
            }
            Format::FixedRounds(n) => {
                if n == 0 {
                    return Err(DefinitionError::NonPositiveParameter("rounds"));
                }
                match self.rounds {
                    RoundCount::Bounded(rounds) if rounds != n => {
                        return Err(DefinitionError::RoundMismatch { rounds, expected: n })
                    }
                    RoundCount::Unbounded => return Err(DefinitionError::UnboundedRounds),
                    _ => {}
                }
                if let Some(index) = self.segments.iter().position(Segment::is_manual) {
                    return Err(DefinitionError::UntimedSegment { index });
                }
            }
            Format::UserPacedRounds => {}
            Format::WorkRestIntervals {
                work_seconds,
                rest_seconds,
                intervals_per_segment,
            } => {
                if work_seconds == 0 {
                    return Err(DefinitionError::NonPositiveParameter("work_interval"));
                }
                if rest_seconds == 0 {
                    return Err(DefinitionError::NonPositiveParameter("rest_interval"));
                }
                if intervals_per_segment == 0 {
                    return Err(DefinitionError::NonPositiveParameter("intervals"));
                }
                if self.rounds == RoundCount::Unbounded {
                    return Err(DefinitionError::UnboundedRounds);
                }
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn rounds(&self) -> RoundCount {
        self.rounds
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// The round past which the clock completes the session, if any.
    ///
    /// Time-capped sessions have none: the cap alone ends them.
    pub fn round_target(&self) -> Option<u32> {
        match self.format {
            Format::FixedRounds(n) => Some(n),
            Format::UserPacedRounds | Format::WorkRestIntervals { .. } => self.rounds.bounded(),
            Format::TimeCapped { .. } => None,
        }
    }

    /// Whether the user may step through segments and rounds at will.
    pub fn is_user_paced(&self) -> bool {
        self.format == Format::UserPacedRounds
    }

    /// Expands the segments into the steps the engine actually walks.
    pub(crate) fn plan(&self) -> Vec<PlanStep> {
        match self.format {
            Format::WorkRestIntervals {
                work_seconds,
                rest_seconds,
                intervals_per_segment,
            } => {
                let mut steps = Vec::with_capacity(
                    self.segments.len() * intervals_per_segment as usize * 2,
                );
                for segment_index in 0..self.segments.len() {
                    for number in 1..=intervals_per_segment {
                        for (phase, seconds) in [
                            (IntervalPhase::Work, work_seconds),
                            (IntervalPhase::Rest, rest_seconds),
                        ] {
                            steps.push(PlanStep {
                                segment_index,
                                duration_seconds: Some(seconds),
                                manual: false,
                                interval: Some(IntervalPosition {
                                    number,
                                    of: intervals_per_segment,
                                    phase,
                                }),
                            });
                        }
                    }
                }
                steps
            }
            _ => self
                .segments
                .iter()
                .enumerate()
                .map(|(segment_index, segment)| PlanStep {
                    segment_index,
                    duration_seconds: segment.duration_seconds,
                    manual: segment.is_manual(),
                    interval: None,
                })
                .collect(),
        }
    }

    /// Seconds for one pass over the plan, when every step is timed.
    ///
    /// `None` also when the sum does not fit in a `u32`.
    pub fn duration_per_round(&self) -> Option<u32> {
        self.plan()
            .iter()
            .try_fold(0u32, |total, step| total.checked_add(step.duration_seconds?))
    }

    /// Expected active seconds for the whole session, when knowable up front.
    pub fn total_duration(&self) -> Option<u32> {
        if let Format::TimeCapped { cap_seconds } = self.format {
            return Some(cap_seconds);
        }
        let per_round = self.duration_per_round()?;
        per_round.checked_mul(self.round_target()?)
    }

    /// The durations of the segments, e.g. `4s / 7s / 8s`.
    pub fn pattern_string(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment.duration_seconds {
                Some(seconds) => format!("{}s", seconds),
                None => "-".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" / ")
    }
}
