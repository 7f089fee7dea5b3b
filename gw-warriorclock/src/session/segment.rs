//! Defines segments, the atomic timed or rep-based units of a session.

use serde::Serialize;

/// The closed set of segment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentKind {
    Inhale,
    HoldAfterInhale,
    Exhale,
    HoldAfterExhale,
    Work,
    Rest,
    Exercise {
        target_reps: Option<u32>,
        target_duration_seconds: Option<u32>,
    },
}

impl SegmentKind {
    /// Short upper-case cue shown while the segment runs.
    pub fn instruction(&self) -> &'static str {
        match self {
            SegmentKind::Inhale => "INHALE",
            SegmentKind::HoldAfterInhale | SegmentKind::HoldAfterExhale => "HOLD",
            SegmentKind::Exhale => "EXHALE",
            SegmentKind::Work => "WORK",
            SegmentKind::Rest => "REST",
            SegmentKind::Exercise { .. } => "GO",
        }
    }

    /// Kinds that only make sense with an intrinsic duration.
    pub(crate) fn requires_duration(&self) -> bool {
        !matches!(self, SegmentKind::Exercise { .. })
    }
}

/// One atomic unit within a session.
///
/// Breath phases and work/rest intervals always carry a duration. Exercise
/// segments carry one only when they are time-based; rep-based exercises have
/// none and are advanced by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub duration_seconds: Option<u32>,
    pub label: Option<String>,
}

impl Segment {
    /// A timed segment of any non-exercise kind.
    pub fn timed(kind: SegmentKind, seconds: u32) -> Self {
        Self {
            kind,
            duration_seconds: Some(seconds),
            label: None,
        }
    }

    /// An exercise prescription. A duration makes it time-based.
    pub fn exercise(label: impl Into<String>, reps: Option<u32>, duration: Option<u32>) -> Self {
        Self {
            kind: SegmentKind::Exercise {
                target_reps: reps,
                target_duration_seconds: duration,
            },
            duration_seconds: duration,
            label: Some(label.into()),
        }
    }

    /// True when the user, not the clock, moves past this segment.
    pub fn is_manual(&self) -> bool {
        matches!(self.kind, SegmentKind::Exercise { .. }) && self.duration_seconds.is_none()
    }

    /// Human readable prescription, e.g. `10 Push-ups` or `30s Plank`.
    pub fn display_string(&self) -> String {
        let name = self.label.as_deref().unwrap_or(self.kind.instruction());
        match self.kind {
            SegmentKind::Exercise {
                target_reps: Some(reps),
                ..
            } => format!("{} {}", reps, name),
            _ => match self.duration_seconds {
                Some(seconds) => format!("{}s {}", seconds, name),
                None => name.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rep_based_exercise_is_manual() {
        assert!(Segment::exercise("Push-ups", Some(10), None).is_manual());
        assert!(Segment::exercise("Burpees", None, None).is_manual());
        assert!(!Segment::exercise("Plank", None, Some(30)).is_manual());
        assert!(!Segment::timed(SegmentKind::Inhale, 4).is_manual());
    }

    #[test]
    fn display_prefers_reps_then_duration() {
        assert_eq!(
            Segment::exercise("Push-ups", Some(10), None).display_string(),
            "10 Push-ups"
        );
        assert_eq!(
            Segment::exercise("Plank", None, Some(30)).display_string(),
            "30s Plank"
        );
        assert_eq!(Segment::timed(SegmentKind::Exhale, 8).display_string(), "8s EXHALE");
    }
}
