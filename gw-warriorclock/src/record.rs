//! An in-memory daily activity log.
//!
//! One `DailyRecord` exists per calendar day. `DailyLog` implements
//! `CompletionSink`, so handing it to an engine is all that is needed to record
//! completed sessions. Breath and workout sessions fill the day's two slots;
//! timer runs are kept as extra workouts and do not count toward completion.
//! The day's verse and the user's note on it are kept alongside.

use crate::common::SessionKind;
use crate::summary::{CompletionSink, CompletionSummary};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// A session recorded outside the day's two slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraWorkout {
    pub description: String,
    pub completed_at: DateTime<Utc>,
}

/// Everything done on one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyRecord {
    /// Id of the verse read that day.
    pub verse: Option<String>,
    pub verse_note: Option<String>,
    pub breath_session: Option<String>,
    pub breath_completed: bool,
    pub breath_completed_at: Option<DateTime<Utc>>,
    pub workout: Option<String>,
    pub workout_completed: bool,
    pub workout_completed_at: Option<DateTime<Utc>>,
    pub workout_summary: Option<CompletionSummary>,
    pub extra_workouts: Vec<ExtraWorkout>,
}

impl DailyRecord {
    pub fn is_fully_completed(&self) -> bool {
        self.breath_completed && self.workout_completed
    }

    /// Share of the day's two slots that are done, 0.0 ..= 1.0.
    pub fn completion_percentage(&self) -> f64 {
        let done = u8::from(self.breath_completed) + u8::from(self.workout_completed);
        f64::from(done) / 2.0
    }

    pub fn has_any_activity(&self) -> bool {
        self.breath_completed
            || self.workout_completed
            || self.verse_note.is_some()
            || !self.extra_workouts.is_empty()
    }

    fn record(
        &mut self,
        kind: SessionKind,
        name: &str,
        summary: &CompletionSummary,
        at: DateTime<Utc>,
    ) {
        match kind {
            SessionKind::Breath => {
                self.breath_session = Some(name.to_string());
                self.breath_completed = true;
                self.breath_completed_at = Some(at);
            }
            SessionKind::Workout => {
                self.workout = Some(name.to_string());
                self.workout_completed = true;
                self.workout_completed_at = Some(at);
                self.workout_summary = Some(summary.clone());
            }
            SessionKind::Timer => self.extra_workouts.push(ExtraWorkout {
                description: format!("{}: {}", name, summary.display_string()),
                completed_at: at,
            }),
        }
    }
}

/// Daily records keyed by local date.
#[derive(Debug)]
pub struct DailyLog {
    timezone: Tz,
    records: Mutex<BTreeMap<NaiveDate, DailyRecord>>,
}

impl DailyLog {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            records: Mutex::new(BTreeMap::new()),
        }
    }

    /// Today's date in the log's time zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    /// Records a completed session against a specific day.
    pub fn record_on(
        &self,
        date: NaiveDate,
        kind: SessionKind,
        name: &str,
        summary: &CompletionSummary,
    ) {
        info!(
            "Recording {} '{}' on {}: {}.",
            kind,
            name,
            date,
            summary.display_string()
        );
        self.update(date, |record| record.record(kind, name, summary, Utc::now()));
    }

    /// Notes that the verse `verse_id` was read on `date`.
    pub fn record_verse(&self, date: NaiveDate, verse_id: &str) {
        debug!("Verse '{}' read on {}.", verse_id, date);
        self.update(date, |record| record.verse = Some(verse_id.to_string()));
    }

    /// Replaces the day's verse note. An empty note clears it.
    pub fn set_verse_note(&self, date: NaiveDate, note: impl Into<String>) {
        let note = note.into();
        let note = (!note.trim().is_empty()).then_some(note);
        self.update(date, |record| record.verse_note = note);
    }

    fn update(&self, date: NaiveDate, apply: impl FnOnce(&mut DailyRecord)) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        apply(records.entry(date).or_default());
    }

    pub fn record(&self, date: NaiveDate) -> Option<DailyRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&date)
            .cloned()
    }

    /// All records from `from` to `to`, inclusive, in date order.
    pub fn records_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<(NaiveDate, DailyRecord)> {
        if from > to {
            return Vec::new();
        }
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .range(from..=to)
            .map(|(date, record)| (*date, record.clone()))
            .collect()
    }

    /// Consecutive fully completed days ending on `as_of`.
    ///
    /// An unfinished `as_of` does not break the streak; counting starts the
    /// day before instead.
    pub fn streak(&self, as_of: NaiveDate) -> u32 {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let done = |date: &NaiveDate| records.get(date).is_some_and(DailyRecord::is_fully_completed);

        let mut day = if done(&as_of) {
            Some(as_of)
        } else {
            as_of.pred_opt()
        };
        let mut streak = 0;
        while let Some(date) = day.filter(|date| done(date)) {
            streak += 1;
            day = date.pred_opt();
        }
        streak
    }
}

impl CompletionSink for DailyLog {
    fn session_completed(&self, kind: SessionKind, name: &str, summary: &CompletionSummary) {
        self.record_on(self.today(), kind, name, summary);
    }
}
