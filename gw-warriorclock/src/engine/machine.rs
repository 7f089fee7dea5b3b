//! The synchronous session state machine.
//!
//! `SessionMachine` holds every counter of a run and applies ticks and user
//! actions one at a time. It has no clock and no threads: the caller decides
//! when a tick happens. `SessionEngine` wraps it in a dispatcher that feeds it
//! ticks from a `SessionClock`; tests drive it directly.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> LeadIn -> Active -> (Paused <-> Active) -> Completed
//!   ^________cancel___|_________|                        |
//!   ^__________________________________________reset_____|
//! ```

use crate::engine::state::{ActiveState, EngineState};
use crate::error::{Action, StateKind, TransitionError};
use crate::events::SessionEvent;
use crate::session::definition::PlanStep;
use crate::session::{Format, Segment, SessionDefinition};
use crate::summary::CompletionSummary;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Applies the transition rules to one run of a session.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    definition: Arc<SessionDefinition>,
    plan: Vec<PlanStep>,
    lead_in_seconds: u32,
    state: EngineState,
    /// Index into `plan`; always in bounds.
    cursor: usize,
    rounds_completed: u32,
    reps_completed: Option<u32>,
    note: Option<String>,
}

impl SessionMachine {
    /// Creates a machine in `Idle` for an already validated definition.
    pub fn new(definition: Arc<SessionDefinition>, lead_in_seconds: u32) -> Self {
        let plan = definition.plan();
        Self {
            definition,
            plan,
            lead_in_seconds,
            state: EngineState::Idle,
            cursor: 0,
            rounds_completed: 0,
            reps_completed: None,
            note: None,
        }
    }

    // --- Queries ---

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn definition(&self) -> &SessionDefinition {
        &self.definition
    }

    pub fn lead_in_seconds(&self) -> u32 {
        self.lead_in_seconds
    }

    /// True while the clock must be running: in lead-in or active.
    pub fn needs_clock(&self) -> bool {
        matches!(self.state, EngineState::LeadIn { .. } | EngineState::Active(_))
    }

    /// The segment under the cursor while active or paused.
    pub fn current_segment(&self) -> Option<&Segment> {
        let active = self.state.active()?;
        self.definition.segments().get(active.segment_index)
    }

    /// 0.0 ..= 1.0 through the session, when its length is known up front.
    pub fn progress(&self) -> Option<f64> {
        let total = self.definition.total_duration()?;
        let elapsed = match &self.state {
            EngineState::Active(active) | EngineState::Paused(active) => {
                active.total_elapsed_seconds
            }
            EngineState::Completed(_) => return Some(1.0),
            _ => 0,
        };
        Some((f64::from(elapsed) / f64::from(total)).min(1.0))
    }

    /// Checks whether `action` is allowed right now without applying it.
    pub fn check(&self, action: Action) -> Result<(), TransitionError> {
        let state = self.state.kind();
        let allowed = match (action, state) {
            (Action::Start, StateKind::Idle) => true,
            (Action::Pause, StateKind::Active) => true,
            (Action::Resume, StateKind::Paused) => true,
            (Action::AdvanceManually, StateKind::Active) => {
                if self.definition.is_user_paced() || self.plan[self.cursor].manual {
                    true
                } else {
                    return Err(TransitionError::format_forbids(action, state));
                }
            }
            (Action::CompleteRound, StateKind::Active) => {
                if self.definition.is_user_paced() {
                    true
                } else {
                    return Err(TransitionError::format_forbids(action, state));
                }
            }
            (
                Action::Cancel,
                StateKind::Idle | StateKind::LeadIn | StateKind::Active | StateKind::Paused,
            ) => true,
            (
                Action::Finish | Action::RecordReps | Action::SetNote,
                StateKind::Active | StateKind::Paused,
            ) => true,
            (Action::Reset, StateKind::Idle | StateKind::Completed) => true,
            _ => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(TransitionError::wrong_state(action, state))
        }
    }

    // --- Commands ---

    pub fn start(&mut self) -> Result<Vec<SessionEvent>, TransitionError> {
        self.check(Action::Start)?;
        self.clear_counters();
        info!(
            "Starting '{}' with a {}s lead-in.",
            self.definition.name(),
            self.lead_in_seconds
        );
        if self.lead_in_seconds == 0 {
            return Ok(self.activate());
        }
        self.state = EngineState::LeadIn {
            seconds_remaining: self.lead_in_seconds,
        };
        Ok(vec![SessionEvent::LeadInStarted {
            seconds: self.lead_in_seconds,
        }])
    }

    /// Applies one clock tick. Ticks outside lead-in and active are ignored.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        match self.state.clone() {
            EngineState::LeadIn { seconds_remaining } => {
                let seconds_remaining = seconds_remaining.saturating_sub(1);
                trace!("Lead-in tick, {}s remaining.", seconds_remaining);
                let mut events = vec![SessionEvent::LeadInTick { seconds_remaining }];
                if seconds_remaining == 0 {
                    events.extend(self.activate());
                } else {
                    self.state = EngineState::LeadIn { seconds_remaining };
                }
                events
            }
            EngineState::Active(active) => self.tick_active(active),
            other => {
                trace!("Ignoring tick while {}.", other.kind());
                Vec::new()
            }
        }
    }

    pub fn pause(&mut self) -> Result<Vec<SessionEvent>, TransitionError> {
        self.check(Action::Pause)?;
        let active = self.running_payload();
        info!("Paused at {}s.", active.total_elapsed_seconds);
        let event = SessionEvent::Paused {
            total_elapsed_seconds: active.total_elapsed_seconds,
        };
        self.state = EngineState::Paused(active);
        Ok(vec![event])
    }

    pub fn resume(&mut self) -> Result<Vec<SessionEvent>, TransitionError> {
        self.check(Action::Resume)?;
        let active = self.running_payload();
        info!("Resumed at {}s.", active.total_elapsed_seconds);
        let event = SessionEvent::Resumed {
            total_elapsed_seconds: active.total_elapsed_seconds,
        };
        self.state = EngineState::Active(active);
        Ok(vec![event])
    }

    pub fn advance_manually(&mut self) -> Result<Vec<SessionEvent>, TransitionError> {
        self.check(Action::AdvanceManually)?;
        let mut active = self.running_payload();
        let mut events = Vec::new();
        if self.advance_step(&mut active, &mut events) {
            return Ok(self.complete(active.total_elapsed_seconds, events));
        }
        self.state = EngineState::Active(active);
        Ok(events)
    }

    pub fn complete_round(&mut self) -> Result<Vec<SessionEvent>, TransitionError> {
        self.check(Action::CompleteRound)?;
        let mut active = self.running_payload();
        let mut events = Vec::new();
        self.cursor = 0;
        if self.wrap_round(&mut active, &mut events) {
            return Ok(self.complete(active.total_elapsed_seconds, events));
        }
        self.enter_step(&mut active, &mut events);
        self.state = EngineState::Active(active);
        Ok(events)
    }

    /// Abandons the run. Cancelling an idle engine is a no-op.
    pub fn cancel(&mut self) -> Result<Vec<SessionEvent>, TransitionError> {
        self.check(Action::Cancel)?;
        if self.state == EngineState::Idle {
            return Ok(Vec::new());
        }
        info!("Cancelled '{}'.", self.definition.name());
        self.state = EngineState::Idle;
        self.clear_counters();
        Ok(vec![SessionEvent::Cancelled])
    }

    /// Ends the run early and produces its summary.
    pub fn finish(&mut self) -> Result<Vec<SessionEvent>, TransitionError> {
        self.check(Action::Finish)?;
        let active = self.running_payload();
        Ok(self.complete(active.total_elapsed_seconds, Vec::new()))
    }

    /// Credits reps into the current, unfinished round.
    pub fn record_reps(&mut self, reps: u32) -> Result<(), TransitionError> {
        self.check(Action::RecordReps)?;
        debug!("Recorded {} reps in the current round.", reps);
        self.reps_completed = Some(reps);
        Ok(())
    }

    pub fn set_note(&mut self, note: impl Into<String>) -> Result<(), TransitionError> {
        self.check(Action::SetNote)?;
        let note = note.into();
        self.note = if note.trim().is_empty() { None } else { Some(note) };
        Ok(())
    }

    /// Returns a completed (or idle) engine to `Idle` for a fresh run.
    pub fn reset(&mut self) -> Result<Vec<SessionEvent>, TransitionError> {
        self.check(Action::Reset)?;
        let was_completed = self.state.is_terminal();
        self.state = EngineState::Idle;
        self.clear_counters();
        if was_completed {
            Ok(vec![SessionEvent::Reset])
        } else {
            Ok(Vec::new())
        }
    }

    // --- Internal ---

    fn clear_counters(&mut self) {
        self.cursor = 0;
        self.rounds_completed = 0;
        self.reps_completed = None;
        self.note = None;
    }

    /// The active or paused payload. Only called after `check` passed.
    fn running_payload(&self) -> ActiveState {
        self.state.active().cloned().unwrap_or_else(|| self.first_active())
    }

    fn first_active(&self) -> ActiveState {
        let step = self.plan[0];
        ActiveState {
            segment_index: step.segment_index,
            round: 1,
            time_remaining_in_segment: step.duration_seconds,
            total_elapsed_seconds: 0,
            cap_remaining: match self.definition.format() {
                Format::TimeCapped { cap_seconds } => Some(cap_seconds),
                _ => None,
            },
            interval: step.interval,
        }
    }

    fn activate(&mut self) -> Vec<SessionEvent> {
        self.cursor = 0;
        let active = self.first_active();
        info!("'{}' is active.", self.definition.name());
        let event = SessionEvent::SegmentStarted {
            segment_index: active.segment_index,
            round: active.round,
            interval: active.interval,
        };
        self.state = EngineState::Active(active);
        vec![event]
    }

    fn tick_active(&mut self, mut active: ActiveState) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        active.total_elapsed_seconds += 1;
        trace!("Active tick, {}s elapsed.", active.total_elapsed_seconds);

        let finished = match active.cap_remaining {
            Some(cap) => {
                let cap = cap.saturating_sub(1);
                active.cap_remaining = Some(cap);
                // Timed segments keep cycling under a cap; only the cap ends the run.
                self.count_down_segment(&mut active, &mut events);
                cap == 0
            }
            None => self.count_down_segment(&mut active, &mut events),
        };

        if finished {
            return self.complete(active.total_elapsed_seconds, events);
        }
        self.state = EngineState::Active(active);
        events
    }

    /// Returns `true` when advancing past the segment exceeded the round target.
    fn count_down_segment(
        &mut self,
        active: &mut ActiveState,
        events: &mut Vec<SessionEvent>,
    ) -> bool {
        let Some(remaining) = active.time_remaining_in_segment else {
            return false;
        };
        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            active.time_remaining_in_segment = Some(remaining);
            return false;
        }
        self.advance_step(active, events)
    }

    /// Moves the cursor one step, wrapping into the next round at the end.
    /// Returns `true` when the round target has been exceeded.
    fn advance_step(&mut self, active: &mut ActiveState, events: &mut Vec<SessionEvent>) -> bool {
        self.cursor += 1;
        if self.cursor >= self.plan.len() {
            self.cursor = 0;
            if self.wrap_round(active, events) {
                return true;
            }
        }
        self.enter_step(active, events);
        false
    }

    fn wrap_round(&mut self, active: &mut ActiveState, events: &mut Vec<SessionEvent>) -> bool {
        self.rounds_completed += 1;
        self.reps_completed = None;
        active.round += 1;
        debug!("Round {} complete.", self.rounds_completed);
        events.push(SessionEvent::RoundCompleted {
            rounds_completed: self.rounds_completed,
        });
        matches!(self.definition.round_target(), Some(target) if active.round > target)
    }

    fn enter_step(&self, active: &mut ActiveState, events: &mut Vec<SessionEvent>) {
        let step = self.plan[self.cursor];
        active.segment_index = step.segment_index;
        active.time_remaining_in_segment = step.duration_seconds;
        active.interval = step.interval;
        debug!(
            "Segment {} of round {} started.",
            step.segment_index, active.round
        );
        events.push(SessionEvent::SegmentStarted {
            segment_index: step.segment_index,
            round: active.round,
            interval: step.interval,
        });
    }

    fn complete(
        &mut self,
        total_elapsed_seconds: u32,
        mut events: Vec<SessionEvent>,
    ) -> Vec<SessionEvent> {
        let summary = CompletionSummary {
            total_elapsed_seconds,
            rounds_completed: self.rounds_completed,
            reps_completed: self.reps_completed,
            note: self.note.take(),
        };
        info!(
            "'{}' completed: {}.",
            self.definition.name(),
            summary.display_string()
        );
        self.state = EngineState::Completed(summary.clone());
        events.push(SessionEvent::Completed(summary));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SessionKind;
    use crate::error::TransitionReason;
    use crate::session::{
        IntervalPhase, IntervalPosition, RoundCount, SegmentKind, TimerConfig,
    };

    fn machine(
        segments: Vec<Segment>,
        rounds: RoundCount,
        format: Format,
        lead_in: u32,
    ) -> SessionMachine {
        let definition =
            SessionDefinition::new(SessionKind::Workout, "test", segments, rounds, format)
                .expect("valid definition");
        SessionMachine::new(Arc::new(definition), lead_in)
    }

    fn box_breath(rounds: u32, lead_in: u32) -> SessionMachine {
        machine(
            vec![
                Segment::timed(SegmentKind::Inhale, 4),
                Segment::timed(SegmentKind::HoldAfterInhale, 4),
                Segment::timed(SegmentKind::Exhale, 4),
                Segment::timed(SegmentKind::HoldAfterExhale, 4),
            ],
            RoundCount::Bounded(rounds),
            Format::FixedRounds(rounds),
            lead_in,
        )
    }

    fn circuit(format: Format, rounds: RoundCount) -> SessionMachine {
        machine(
            vec![
                Segment::exercise("Push-ups", Some(10), None),
                Segment::exercise("Air Squats", Some(15), None),
                Segment::exercise("Sit-ups", Some(20), None),
            ],
            rounds,
            format,
            0,
        )
    }

    fn run_ticks(machine: &mut SessionMachine, n: u32) -> Vec<SessionEvent> {
        (0..n).flat_map(|_| machine.tick()).collect()
    }

    fn completions(events: &[SessionEvent]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, SessionEvent::Completed(_)))
            .count()
    }

    #[test]
    fn box_breath_scenario() {
        let mut machine = box_breath(1, 5);
        machine.start().unwrap();
        assert_eq!(
            machine.state(),
            &EngineState::LeadIn {
                seconds_remaining: 5
            }
        );

        run_ticks(&mut machine, 4);
        assert_eq!(
            machine.state(),
            &EngineState::LeadIn {
                seconds_remaining: 1
            }
        );
        machine.tick();
        let active = machine.state().active().cloned().unwrap();
        assert_eq!(active.segment_index, 0);
        assert_eq!(active.round, 1);
        assert_eq!(active.total_elapsed_seconds, 0);
        assert_eq!(active.time_remaining_in_segment, Some(4));
        assert_eq!(machine.current_segment().unwrap().kind, SegmentKind::Inhale);

        run_ticks(&mut machine, 15);
        assert_eq!(machine.state().kind(), StateKind::Active);
        let events = machine.tick();
        assert_eq!(completions(&events), 1);
        let summary = machine.state().summary().unwrap();
        assert_eq!(summary.total_elapsed_seconds, 16);
        assert_eq!(summary.rounds_completed, 1);
        assert_eq!(summary.reps_completed, None);
    }

    #[test]
    fn fixed_rounds_complete_after_every_round() {
        let mut machine = machine(
            vec![
                Segment::timed(SegmentKind::Inhale, 4),
                Segment::timed(SegmentKind::Exhale, 4),
            ],
            RoundCount::Bounded(2),
            Format::FixedRounds(2),
            3,
        );
        machine.start().unwrap();
        run_ticks(&mut machine, 3);
        assert_eq!(machine.state().kind(), StateKind::Active);

        run_ticks(&mut machine, 8);
        assert_eq!(machine.state().active().unwrap().round, 2);
        run_ticks(&mut machine, 7);
        assert_eq!(machine.state().kind(), StateKind::Active);
        machine.tick();
        let summary = machine.state().summary().unwrap();
        assert_eq!(summary.total_elapsed_seconds, 16);
        assert_eq!(summary.rounds_completed, 2);
    }

    #[test]
    fn time_cap_completes_on_the_last_tick_wherever_the_session_is() {
        let mut machine = circuit(Format::TimeCapped { cap_seconds: 60 }, RoundCount::Unbounded);
        machine.start().unwrap();
        machine.advance_manually().unwrap();

        run_ticks(&mut machine, 59);
        let active = machine.state().active().unwrap();
        assert_eq!(active.cap_remaining, Some(1));
        assert_eq!(active.segment_index, 1);

        let events = machine.tick();
        assert_eq!(completions(&events), 1);
        let summary = machine.state().summary().unwrap();
        assert_eq!(summary.total_elapsed_seconds, 60);
        assert_eq!(summary.rounds_completed, 0);
    }

    #[test]
    fn amrap_freezes_manual_progress_into_the_summary() {
        let mut machine = circuit(Format::TimeCapped { cap_seconds: 30 }, RoundCount::Unbounded);
        machine.start().unwrap();
        for _ in 0..7 {
            machine.advance_manually().unwrap();
        }
        machine.record_reps(12).unwrap();
        run_ticks(&mut machine, 30);

        let summary = machine.state().summary().unwrap();
        assert_eq!(summary.rounds_completed, 2);
        assert_eq!(summary.reps_completed, Some(12));
    }

    #[test]
    fn user_paced_rounds_complete_only_after_every_segment_of_every_round() {
        let mut machine = circuit(Format::UserPacedRounds, RoundCount::Bounded(2));
        machine.start().unwrap();
        machine.advance_manually().unwrap();
        machine.advance_manually().unwrap();
        run_ticks(&mut machine, 100);
        assert_eq!(machine.state().kind(), StateKind::Active);

        for _ in 0..2 {
            machine.advance_manually().unwrap();
        }
        assert_eq!(machine.state().active().unwrap().round, 2);
        let events = machine.advance_manually().unwrap();
        assert_eq!(completions(&events), 0);
        assert_eq!(machine.state().active().unwrap().segment_index, 2);

        let events = machine.advance_manually().unwrap();
        assert_eq!(completions(&events), 1);
        let summary = machine.state().summary().unwrap();
        assert_eq!(summary.rounds_completed, 2);
        assert_eq!(summary.total_elapsed_seconds, 100);
    }

    #[test]
    fn complete_round_resets_the_segment_and_counts_toward_the_target() {
        let mut machine = circuit(Format::UserPacedRounds, RoundCount::Bounded(2));
        machine.start().unwrap();
        machine.advance_manually().unwrap();
        machine.complete_round().unwrap();

        let active = machine.state().active().unwrap();
        assert_eq!(active.segment_index, 0);
        assert_eq!(active.round, 2);

        for _ in 0..2 {
            machine.advance_manually().unwrap();
        }
        machine.advance_manually().unwrap();
        assert_eq!(machine.state().summary().unwrap().rounds_completed, 2);
    }

    #[test]
    fn unbounded_user_paced_sessions_end_with_finish() {
        let mut machine = circuit(Format::UserPacedRounds, RoundCount::Unbounded);
        machine.start().unwrap();
        for _ in 0..30 {
            machine.complete_round().unwrap();
        }
        run_ticks(&mut machine, 5);
        machine.set_note("felt strong").unwrap();
        let events = machine.finish().unwrap();
        assert_eq!(completions(&events), 1);

        let summary = machine.state().summary().unwrap();
        assert_eq!(summary.rounds_completed, 30);
        assert_eq!(summary.total_elapsed_seconds, 5);
        assert_eq!(summary.note.as_deref(), Some("felt strong"));
    }

    #[test]
    fn timed_exercise_advances_on_its_own_under_user_pacing() {
        let mut machine = machine(
            vec![
                Segment::exercise("Push-ups", Some(10), None),
                Segment::exercise("Plank", None, Some(30)),
            ],
            RoundCount::Bounded(1),
            Format::UserPacedRounds,
            0,
        );
        machine.start().unwrap();
        machine.advance_manually().unwrap();
        assert_eq!(
            machine.state().active().unwrap().time_remaining_in_segment,
            Some(30)
        );
        run_ticks(&mut machine, 30);
        assert_eq!(machine.state().summary().unwrap().rounds_completed, 1);
    }

    #[test]
    fn work_rest_intervals_drive_themselves_to_completion() {
        let mut machine = machine(
            vec![
                Segment::exercise("Squats", None, None),
                Segment::exercise("Push-ups", None, None),
            ],
            RoundCount::Bounded(1),
            Format::WorkRestIntervals {
                work_seconds: 20,
                rest_seconds: 10,
                intervals_per_segment: 8,
            },
            0,
        );
        machine.start().unwrap();
        assert_eq!(
            machine.state().active().unwrap().interval,
            Some(IntervalPosition {
                number: 1,
                of: 8,
                phase: IntervalPhase::Work
            })
        );

        run_ticks(&mut machine, 20);
        let active = machine.state().active().unwrap();
        assert_eq!(active.time_remaining_in_segment, Some(10));
        assert_eq!(active.interval.unwrap().phase, IntervalPhase::Rest);

        run_ticks(&mut machine, 220);
        let active = machine.state().active().unwrap();
        assert_eq!(active.segment_index, 1);
        assert_eq!(active.interval.unwrap().number, 1);

        run_ticks(&mut machine, 239);
        assert_eq!(machine.state().kind(), StateKind::Active);
        machine.tick();
        let summary = machine.state().summary().unwrap();
        assert_eq!(summary.total_elapsed_seconds, 480);
        assert_eq!(summary.rounds_completed, 1);
    }

    #[test]
    fn manual_actions_are_rejected_when_the_format_forbids_them() {
        let mut machine = box_breath(1, 0);
        machine.start().unwrap();
        let before = machine.state().clone();

        let err = machine.advance_manually().unwrap_err();
        assert_eq!(err.reason, TransitionReason::FormatForbids);
        let err = machine.complete_round().unwrap_err();
        assert_eq!(err.reason, TransitionReason::FormatForbids);
        assert_eq!(machine.state(), &before);

        let mut amrap = circuit(Format::TimeCapped { cap_seconds: 60 }, RoundCount::Unbounded);
        amrap.start().unwrap();
        let err = amrap.complete_round().unwrap_err();
        assert_eq!(err.action, Action::CompleteRound);
        assert_eq!(err.reason, TransitionReason::FormatForbids);
    }

    #[test]
    fn actions_in_idle_are_rejected_but_cancel_is_idempotent() {
        let mut machine = box_breath(1, 5);
        for err in [
            machine.pause().unwrap_err(),
            machine.resume().unwrap_err(),
            machine.advance_manually().unwrap_err(),
            machine.complete_round().unwrap_err(),
            machine.finish().unwrap_err(),
        ] {
            assert_eq!(err.state, Some(StateKind::Idle));
            assert_eq!(err.reason, TransitionReason::WrongState);
        }
        assert!(machine.cancel().unwrap().is_empty());
        assert!(machine.cancel().unwrap().is_empty());
        assert_eq!(machine.state(), &EngineState::Idle);
    }

    #[test]
    fn cancel_from_any_running_state_returns_to_idle() {
        let mut machine = box_breath(2, 5);
        machine.start().unwrap();
        assert_eq!(machine.cancel().unwrap(), vec![SessionEvent::Cancelled]);
        assert_eq!(machine.state(), &EngineState::Idle);
        assert!(machine.cancel().unwrap().is_empty());

        machine.start().unwrap();
        run_ticks(&mut machine, 8);
        machine.pause().unwrap();
        machine.cancel().unwrap();
        assert_eq!(machine.state(), &EngineState::Idle);
        assert!(run_ticks(&mut machine, 50).is_empty());
    }

    #[test]
    fn pause_then_resume_without_ticks_restores_the_exact_payload() {
        let mut machine = box_breath(2, 0);
        machine.start().unwrap();
        run_ticks(&mut machine, 6);
        let before = machine.state().clone();

        machine.pause().unwrap();
        assert_eq!(machine.state().kind(), StateKind::Paused);
        assert!(run_ticks(&mut machine, 10).is_empty());
        machine.resume().unwrap();

        assert_eq!(machine.state(), &before);
    }

    #[test]
    fn completed_is_terminal_and_summary_is_emitted_once() {
        let mut machine = TimerConfig {
            duration_seconds: 3,
        }
        .build()
        .map(|definition| SessionMachine::new(Arc::new(definition), 0))
        .unwrap();
        machine.start().unwrap();
        let events = run_ticks(&mut machine, 10);
        assert_eq!(completions(&events), 1);

        let summary = machine.state().summary().cloned().unwrap();
        assert_eq!(summary.total_elapsed_seconds, 3);
        assert_eq!(summary.rounds_completed, 1);

        for err in [
            machine.start().unwrap_err(),
            machine.pause().unwrap_err(),
            machine.cancel().unwrap_err(),
            machine.finish().unwrap_err(),
        ] {
            assert_eq!(err.state, Some(StateKind::Completed));
        }
        assert_eq!(machine.state().summary(), Some(&summary));
    }

    #[test]
    fn reset_allows_a_fresh_run() {
        let mut machine = box_breath(1, 0);
        machine.start().unwrap();
        run_ticks(&mut machine, 16);
        assert!(machine.state().is_terminal());

        assert_eq!(machine.reset().unwrap(), vec![SessionEvent::Reset]);
        assert_eq!(machine.state(), &EngineState::Idle);
        machine.start().unwrap();
        assert_eq!(
            machine.state().active().unwrap().total_elapsed_seconds,
            0
        );
    }

    #[test]
    fn zero_lead_in_activates_immediately() {
        let mut machine = box_breath(1, 0);
        let events = machine.start().unwrap();
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::SegmentStarted { segment_index: 0, round: 1, .. }]
        ));
        assert!(machine.needs_clock());
    }

    #[test]
    fn progress_tracks_elapsed_over_total() {
        let mut machine = box_breath(1, 0);
        assert_eq!(machine.progress(), Some(0.0));
        machine.start().unwrap();
        run_ticks(&mut machine, 4);
        assert_eq!(machine.progress(), Some(0.25));
    }

    #[test]
    fn progress_is_unknown_when_the_total_does_not_fit() {
        let mut machine = box_breath(2_000_000_000, 0);
        assert_eq!(machine.progress(), None);
        machine.start().unwrap();
        run_ticks(&mut machine, 4);
        assert_eq!(machine.progress(), None);
    }
}
