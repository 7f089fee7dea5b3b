//! Curated and user-authored session content.
//!
//! The `ContentLibrary` answers one question for a consumer: *which session
//! runs today?* It also picks the day's verse. Curated content ships with the
//! crate; custom sessions are added
//! at run time (or from configuration) and kept in slot maps keyed by
//! `BreathId` and `WorkoutId`. A user's explicit selection always wins over the
//! curated choice. The engine never sees any of this; it only receives the
//! resolved `SessionDefinition`.

use crate::common::{BreathId, WorkoutId};
use crate::config::{CalendarConfig, WarriorConfig};
use crate::error::ContentError;
use crate::session::{
    BreathConfig, BreathPhase, BreathPhaseKind, ExerciseConfig, SessionDefinition, TimerConfig,
    WorkoutConfig, WorkoutType,
};
use chrono::{NaiveDate, Utc};
use slotmap::SlotMap;
use tracing::{debug, info};

/// Days elapsed since the app start date. Drives curated rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayIndex(pub u32);

impl DayIndex {
    /// Whole days from `start` to `today`; 0 when `today` is not after `start`.
    pub fn between(start: NaiveDate, today: NaiveDate) -> Self {
        let days = today.signed_duration_since(start).num_days();
        DayIndex(u32::try_from(days.max(0)).unwrap_or(u32::MAX))
    }

    /// Today's index in the configured time zone.
    pub fn today(calendar: &CalendarConfig) -> Self {
        let today = Utc::now().with_timezone(&calendar.timezone).date_naive();
        Self::between(calendar.app_start_date, today)
    }

    /// Picks the rotation slot for a list of `len` items.
    pub fn rotate(self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.0 as usize % len)
    }
}

/// Where a resolved session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Custom,
    Curated,
}

/// The one session to run, chosen by precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSession {
    pub source: ContentSource,
    pub name: String,
    pub definition: SessionDefinition,
}

/// A named countdown offered as a quick start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerPreset {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub timer: TimerConfig,
}

/// A scripture verse for the day it rotates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verse {
    /// Stable key stored in the daily record.
    pub id: &'static str,
    pub reference: &'static str,
    pub text: &'static str,
    pub theme: &'static str,
}

/// The breath session chosen to run by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreathSelection {
    Custom(BreathId),
    Curated(usize),
}

/// Curated content plus the user's custom stores.
#[derive(Debug, Clone)]
pub struct ContentLibrary {
    curated_breaths: Vec<BreathConfig>,
    curated_workouts: Vec<WorkoutConfig>,
    timer_presets: Vec<TimerPreset>,
    verses: Vec<Verse>,
    custom_breaths: SlotMap<BreathId, BreathConfig>,
    custom_workouts: SlotMap<WorkoutId, WorkoutConfig>,
    breath_selection: Option<BreathSelection>,
}

impl Default for ContentLibrary {
    fn default() -> Self {
        Self::curated()
    }
}

impl ContentLibrary {
    /// The bundled content with empty custom stores.
    pub fn curated() -> Self {
        Self {
            curated_breaths: curated_breaths(),
            curated_workouts: curated_workouts(),
            timer_presets: timer_presets(),
            verses: curated_verses(),
            custom_breaths: SlotMap::with_key(),
            custom_workouts: SlotMap::with_key(),
            breath_selection: None,
        }
    }

    /// Bundled content plus every custom session declared in configuration.
    ///
    /// Invalid custom sessions are rejected up front so they never reach an engine.
    pub fn from_config(config: &WarriorConfig) -> Result<Self, ContentError> {
        let mut library = Self::curated();
        for breath in &config.breath_sessions {
            library.add_custom_breath(breath.clone())?;
        }
        for workout in &config.workouts {
            library.add_custom_workout(workout.clone())?;
        }
        if let Some(name) = &config.default_breath_session {
            library.select_breath(name)?;
        }
        info!(
            "Content library loaded: {} custom breath sessions, {} custom workouts.",
            library.custom_breaths.len(),
            library.custom_workouts.len()
        );
        Ok(library)
    }

    // --- Curated ---

    pub fn curated_breaths(&self) -> &[BreathConfig] {
        &self.curated_breaths
    }

    pub fn curated_workouts(&self) -> &[WorkoutConfig] {
        &self.curated_workouts
    }

    pub fn timer_presets(&self) -> &[TimerPreset] {
        &self.timer_presets
    }

    pub fn curated_verses(&self) -> &[Verse] {
        &self.verses
    }

    /// The curated breath session used when nothing custom is selected.
    ///
    /// A curated pick made with `select_breath` comes first, then the session
    /// flagged as default, then the first one.
    pub fn default_breath(&self) -> Option<&BreathConfig> {
        if let Some(BreathSelection::Curated(index)) = self.breath_selection {
            return self.curated_breaths.get(index);
        }
        self.curated_breaths
            .iter()
            .find(|breath| breath.is_default)
            .or_else(|| self.curated_breaths.first())
    }

    /// The verse for a given day.
    pub fn verse_for_day(&self, day: DayIndex) -> Option<&Verse> {
        let index = day.rotate(self.verses.len())?;
        self.verses.get(index)
    }

    pub fn verse(&self, id: &str) -> Option<&Verse> {
        self.verses.iter().find(|verse| verse.id == id)
    }

    /// The curated workout for a given day.
    pub fn workout_for_day(&self, day: DayIndex) -> Option<&WorkoutConfig> {
        let index = day.rotate(self.curated_workouts.len())?;
        self.curated_workouts.get(index)
    }

    // --- Custom ---

    pub fn add_custom_breath(&mut self, breath: BreathConfig) -> Result<BreathId, ContentError> {
        breath.build()?;
        debug!("Added custom breath session '{}'.", breath.name);
        Ok(self.custom_breaths.insert(breath))
    }

    pub fn add_custom_workout(
        &mut self,
        workout: WorkoutConfig,
    ) -> Result<WorkoutId, ContentError> {
        workout.build()?;
        debug!("Added custom workout '{}'.", workout.name);
        Ok(self.custom_workouts.insert(workout))
    }

    pub fn remove_custom_breath(&mut self, id: BreathId) -> Option<BreathConfig> {
        if self.breath_selection == Some(BreathSelection::Custom(id)) {
            self.breath_selection = None;
        }
        self.custom_breaths.remove(id)
    }

    pub fn remove_custom_workout(&mut self, id: WorkoutId) -> Option<WorkoutConfig> {
        self.custom_workouts.remove(id)
    }

    pub fn custom_breath(&self, id: BreathId) -> Option<&BreathConfig> {
        self.custom_breaths.get(id)
    }

    pub fn custom_workout(&self, id: WorkoutId) -> Option<&WorkoutConfig> {
        self.custom_workouts.get(id)
    }

    pub fn custom_breaths(&self) -> impl Iterator<Item = (BreathId, &BreathConfig)> {
        self.custom_breaths.iter()
    }

    pub fn custom_workouts(&self) -> impl Iterator<Item = (WorkoutId, &WorkoutConfig)> {
        self.custom_workouts.iter()
    }

    // --- Selection ---

    /// Makes the breath session called `name` the one that runs by default.
    ///
    /// Custom sessions are matched before curated ones.
    pub fn select_breath(&mut self, name: &str) -> Result<(), ContentError> {
        let selection = self
            .custom_breaths
            .iter()
            .find(|(_, breath)| breath.name == name)
            .map(|(id, _)| BreathSelection::Custom(id))
            .or_else(|| {
                self.curated_breaths
                    .iter()
                    .position(|breath| breath.name == name)
                    .map(BreathSelection::Curated)
            })
            .ok_or_else(|| ContentError::UnknownBreath(name.to_string()))?;
        info!("Default breath session is now '{}'.", name);
        self.breath_selection = Some(selection);
        Ok(())
    }

    /// The custom breath session picked with `select_breath`, if any.
    pub fn selected_breath(&self) -> Option<BreathId> {
        match self.breath_selection {
            Some(BreathSelection::Custom(id)) => Some(id),
            _ => None,
        }
    }

    // --- Resolution ---

    /// The breath session to run: the user's pick, else the default.
    pub fn resolve_breath(
        &self,
        selection: Option<BreathId>,
    ) -> Result<ResolvedSession, ContentError> {
        if let Some(breath) = selection.and_then(|id| self.custom_breaths.get(id)) {
            return resolved(ContentSource::Custom, &breath.name, breath.build()?);
        }
        let breath = self
            .default_breath()
            .ok_or(ContentError::NotFound("breath session"))?;
        resolved(ContentSource::Curated, &breath.name, breath.build()?)
    }

    /// The breath session to run when the user has not picked one just now.
    pub fn resolve_default_breath(&self) -> Result<ResolvedSession, ContentError> {
        self.resolve_breath(self.selected_breath())
    }

    /// The workout to run: the user's pick, else the curated one for `day`.
    pub fn resolve_workout(
        &self,
        selection: Option<WorkoutId>,
        day: DayIndex,
    ) -> Result<ResolvedSession, ContentError> {
        if let Some(workout) = selection.and_then(|id| self.custom_workouts.get(id)) {
            return resolved(ContentSource::Custom, &workout.name, workout.build()?);
        }
        let workout = self
            .workout_for_day(day)
            .ok_or(ContentError::NotFound("workout"))?;
        resolved(ContentSource::Curated, &workout.name, workout.build()?)
    }
}

fn resolved(
    source: ContentSource,
    name: &str,
    definition: SessionDefinition,
) -> Result<ResolvedSession, ContentError> {
    debug!("Resolved {:?} session '{}'.", source, name);
    Ok(ResolvedSession {
        source,
        name: name.to_string(),
        definition,
    })
}

// --- Bundled content ---

fn breath(
    name: &str,
    description: &str,
    phases: &[(BreathPhaseKind, u32)],
    rounds: u32,
    is_default: bool,
) -> BreathConfig {
    BreathConfig {
        name: name.to_string(),
        description: Some(description.to_string()),
        phases: phases
            .iter()
            .map(|&(kind, seconds)| BreathPhase::new(kind, seconds))
            .collect(),
        rounds,
        is_default,
    }
}

fn curated_breaths() -> Vec<BreathConfig> {
    use BreathPhaseKind::*;
    vec![
        breath(
            "Box Breathing",
            "4-4-4-4 tactical breathing for calm and focus",
            &[(Inhale, 4), (HoldIn, 4), (Exhale, 4), (HoldOut, 4)],
            5,
            true,
        ),
        breath(
            "Warrior Breath",
            "5-5-5 breathing for strength and endurance",
            &[(Inhale, 5), (HoldIn, 5), (Exhale, 5)],
            7,
            false,
        ),
        breath(
            "Before Battle",
            "4-7-8 calming pattern to prepare for challenges",
            &[(Inhale, 4), (HoldIn, 7), (Exhale, 8)],
            4,
            false,
        ),
        breath(
            "Morning Dedication",
            "Simple breath focus for morning prayer",
            &[(Inhale, 4), (Exhale, 4)],
            10,
            false,
        ),
    ]
}

fn curated_workouts() -> Vec<WorkoutConfig> {
    vec![
        WorkoutConfig {
            name: "Shield Wall".to_string(),
            description: Some("Bodyweight AMRAP".to_string()),
            workout_type: WorkoutType::Amrap,
            exercises: vec![
                ExerciseConfig::reps("Push-ups", 10),
                ExerciseConfig::reps("Air Squats", 15),
                ExerciseConfig::reps("Sit-ups", 20),
            ],
            time_cap: Some(12 * 60),
            rounds: None,
            work_interval: None,
            rest_interval: None,
        },
        WorkoutConfig {
            name: "Long March".to_string(),
            description: Some("Three rounds at your own pace".to_string()),
            workout_type: WorkoutType::Rounds,
            exercises: vec![
                ExerciseConfig::reps("Walking Lunges", 20),
                ExerciseConfig::reps("Burpees", 10),
                ExerciseConfig::timed("Plank", 45),
            ],
            time_cap: None,
            rounds: Some(3),
            work_interval: None,
            rest_interval: None,
        },
        WorkoutConfig {
            name: "Sling and Stone".to_string(),
            description: Some("Four Tabata blocks".to_string()),
            workout_type: WorkoutType::Tabata,
            exercises: vec![
                ExerciseConfig::named("Mountain Climbers"),
                ExerciseConfig::named("Jump Squats"),
                ExerciseConfig::named("Push-ups"),
                ExerciseConfig::named("Hollow Rocks"),
            ],
            time_cap: None,
            rounds: None,
            work_interval: None,
            rest_interval: None,
        },
        WorkoutConfig {
            name: "Jericho".to_string(),
            description: Some("The circuit as fast as possible".to_string()),
            workout_type: WorkoutType::TimeLimited,
            exercises: vec![
                ExerciseConfig::reps("Burpees", 50),
                ExerciseConfig::reps("Air Squats", 100),
                ExerciseConfig::reps("Push-ups", 50),
            ],
            time_cap: Some(20 * 60),
            rounds: None,
            work_interval: None,
            rest_interval: None,
        },
    ]
}

fn curated_verses() -> Vec<Verse> {
    vec![
        Verse {
            id: "joshua-1-9",
            reference: "Joshua 1:9",
            text: "Have not I commanded thee? Be strong and of a good courage; be not afraid, \
                   neither be thou dismayed: for the LORD thy God is with thee whithersoever thou goest.",
            theme: "courage",
        },
        Verse {
            id: "isaiah-40-31",
            reference: "Isaiah 40:31",
            text: "But they that wait upon the LORD shall renew their strength; they shall mount up \
                   with wings as eagles; they shall run, and not be weary; and they shall walk, and not faint.",
            theme: "endurance",
        },
        Verse {
            id: "philippians-4-13",
            reference: "Philippians 4:13",
            text: "I can do all things through Christ which strengtheneth me.",
            theme: "strength",
        },
        Verse {
            id: "2-timothy-1-7",
            reference: "2 Timothy 1:7",
            text: "For God hath not given us the spirit of fear; but of power, and of love, \
                   and of a sound mind.",
            theme: "courage",
        },
        Verse {
            id: "psalm-18-32",
            reference: "Psalm 18:32",
            text: "It is God that girdeth me with strength, and maketh my way perfect.",
            theme: "strength",
        },
        Verse {
            id: "ephesians-6-10",
            reference: "Ephesians 6:10",
            text: "Finally, my brethren, be strong in the Lord, and in the power of his might.",
            theme: "strength",
        },
        Verse {
            id: "1-corinthians-9-27",
            reference: "1 Corinthians 9:27",
            text: "But I keep under my body, and bring it into subjection.",
            theme: "discipline",
        },
    ]
}

fn timer_presets() -> Vec<TimerPreset> {
    vec![
        TimerPreset {
            title: "AMRAP 12 min",
            subtitle: "As many rounds as possible",
            timer: TimerConfig {
                duration_seconds: 12 * 60,
            },
        },
        TimerPreset {
            title: "EMOM 10 min",
            subtitle: "Every minute on the minute",
            timer: TimerConfig {
                duration_seconds: 10 * 60,
            },
        },
        TimerPreset {
            title: "Tabata 4 min",
            subtitle: "20s work / 10s rest x 8",
            timer: TimerConfig {
                duration_seconds: 4 * 60,
            },
        },
    ]
}
