//! Contains common, primitive types shared across the crate.
//!
//! This module defines the ID types used to address user-authored content and
//! the small enums that classify a session. Using distinct types keeps a
//! workout key from being passed where a breath key is expected.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Uniquely and safely identifies a user-authored breath session.
    ///
    /// Returned when a custom breath session is added to the content library.
    /// Keys are never reused, so a stale id cannot resolve to a newer session.
    pub struct BreathId;

    /// Uniquely and safely identifies a user-authored workout.
    pub struct WorkoutId;
}

/// Which family of activity a session belongs to.
///
/// The kind selects the lead-in length and tells the daily record which slot
/// a completed session fills. It has no influence on completion rules; those
/// come from the session's `Format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Breath,
    Workout,
    Timer,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionKind::Breath => "breath",
            SessionKind::Workout => "workout",
            SessionKind::Timer => "timer",
        };
        f.write_str(label)
    }
}

/// Formats whole seconds as `mm:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_format_pads_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(720), "12:00");
    }
}
