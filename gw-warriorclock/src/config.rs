//! Defines all configuration structures for Warrior Clock.
//!
//! These structs are deserialized from an optional TOML file layered with
//! `WARRIOR__*` environment variables through the `config` crate. Every field
//! has a default, so an empty file (or no file at all) is a valid configuration.

use crate::common::SessionKind;
use crate::session::{BreathConfig, WorkoutConfig};
use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// The top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WarriorConfig {
    /// How fast the session clock ticks.
    pub resolution: ClockResolution,

    /// Lead-in countdown lengths per session kind.
    pub lead_in: LeadInConfig,

    /// Time zone and the day the app was first used.
    pub calendar: CalendarConfig,

    /// User-authored breath sessions, added to the custom store at startup.
    pub breath_sessions: Vec<BreathConfig>,

    /// User-authored workouts, added to the custom store at startup.
    pub workouts: Vec<WorkoutConfig>,

    /// Name of the breath session to run by default, custom or curated.
    pub default_breath_session: Option<String>,
}

/// Defines the operational speed of the session clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockResolution {
    /// One tick per second.
    #[default]
    Standard,
    /// Several session seconds per wall-clock second. For demos.
    Accelerated { ticks_per_second: u32 },
}

/// The fastest accelerated clock `load` accepts.
pub const MAX_TICKS_PER_SECOND: u32 = 1_000;

impl ClockResolution {
    /// Never shorter than a millisecond, whatever `ticks_per_second` says.
    pub fn tick_period(&self) -> Duration {
        match self {
            ClockResolution::Standard => Duration::from_secs(1),
            ClockResolution::Accelerated { ticks_per_second } => {
                let ticks = (*ticks_per_second).clamp(1, MAX_TICKS_PER_SECOND);
                Duration::from_secs(1) / ticks
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if let ClockResolution::Accelerated { ticks_per_second } = *self {
            if ticks_per_second == 0 || ticks_per_second > MAX_TICKS_PER_SECOND {
                bail!(
                    "resolution.accelerated.ticks_per_second must be between 1 and {}, got {}",
                    MAX_TICKS_PER_SECOND,
                    ticks_per_second
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LeadInConfig {
    pub breath: u32,
    pub workout: u32,
    pub timer: u32,
}

impl Default for LeadInConfig {
    fn default() -> Self {
        Self {
            breath: 5,
            workout: 10,
            timer: 3,
        }
    }
}

/// Calendar settings used to compute the rotation day.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    /// IANA name such as "America/New_York". Defaults to UTC.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    /// Day zero of the curated rotation. Defaults to today.
    #[serde(default = "default_start_date")]
    pub app_start_date: NaiveDate,
}

// --- Default value functions for serde ---

fn default_timezone() -> Tz {
    Tz::UTC
}

fn default_start_date() -> NaiveDate {
    Utc::now().date_naive()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            app_start_date: default_start_date(),
        }
    }
}

impl WarriorConfig {
    /// Loads configuration from an optional TOML file and the environment.
    ///
    /// Environment keys use `__` between levels, e.g. `WARRIOR__LEAD_IN__BREATH=3`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Loading configuration from {}.", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("WARRIOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?;
        let config: Self = config
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that deserialize but cannot drive a session.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.resolution.validate()
    }

    pub fn tick_period(&self) -> Duration {
        self.resolution.tick_period()
    }

    /// Lead-in seconds for a session of the given kind.
    pub fn lead_in_for(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Breath => self.lead_in.breath,
            SessionKind::Workout => self.lead_in.workout,
            SessionKind::Timer => self.lead_in.timer,
        }
    }
}
