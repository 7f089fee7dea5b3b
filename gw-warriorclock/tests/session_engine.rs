use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;
use warriorclock::config::ClockResolution;
use warriorclock::prelude::*;
use warriorclock::session::{BreathPhase, BreathPhaseKind, ExerciseConfig};

#[derive(Default)]
struct RecordingSink {
    completed: Mutex<Vec<(SessionKind, String, CompletionSummary)>>,
}

impl RecordingSink {
    fn count(&self) -> usize {
        self.completed.lock().unwrap().len()
    }
}

impl CompletionSink for RecordingSink {
    fn session_completed(&self, kind: SessionKind, name: &str, summary: &CompletionSummary) {
        self.completed
            .lock()
            .unwrap()
            .push((kind, name.to_string(), summary.clone()));
    }
}

fn box_breath(rounds: u32) -> BreathConfig {
    BreathConfig {
        name: "Box Breathing".to_string(),
        description: None,
        phases: vec![
            BreathPhase::new(BreathPhaseKind::Inhale, 4),
            BreathPhase::new(BreathPhaseKind::HoldIn, 4),
            BreathPhase::new(BreathPhaseKind::Exhale, 4),
            BreathPhase::new(BreathPhaseKind::HoldOut, 4),
        ],
        rounds,
        is_default: true,
    }
}

fn for_rounds(rounds: u32) -> WorkoutConfig {
    WorkoutConfig {
        name: "Ladder".to_string(),
        description: None,
        workout_type: WorkoutType::Rounds,
        exercises: vec![
            ExerciseConfig::reps("Push-ups", 10),
            ExerciseConfig::reps("Air Squats", 15),
        ],
        time_cap: None,
        rounds: Some(rounds),
        work_interval: None,
        rest_interval: None,
    }
}

fn drain(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

fn elapsed(engine: &SessionEngine) -> u32 {
    engine
        .snapshot()
        .active()
        .map(|active| active.total_elapsed_seconds)
        .unwrap_or_default()
}

#[tokio::test(start_paused = true)]
async fn box_breath_runs_to_completion_and_reports_once() {
    let config = WarriorConfig::default();
    let sink = Arc::new(RecordingSink::default());
    let engine = SessionEngine::with_sink(&box_breath(1), &config, Some(sink.clone())).unwrap();
    let mut events = engine.subscribe_events();

    engine.start().await.unwrap();
    assert_eq!(
        engine.snapshot(),
        EngineState::LeadIn {
            seconds_remaining: 5
        }
    );

    sleep(Duration::from_millis(5_500)).await;
    let active = engine.snapshot().active().cloned().unwrap();
    assert_eq!(active.segment_index, 0);
    assert_eq!(active.total_elapsed_seconds, 0);

    let summary = engine.wait_for_completion().await.unwrap();
    assert_eq!(summary.total_elapsed_seconds, 16);
    assert_eq!(summary.rounds_completed, 1);

    sleep(Duration::from_secs(30)).await;
    let events = drain(&mut events);
    assert_eq!(events.first(), Some(&SessionEvent::LeadInStarted { seconds: 5 }));
    let completions = events
        .iter()
        .filter(|event| matches!(event, SessionEvent::Completed(_)))
        .count();
    assert_eq!(completions, 1);

    assert_eq!(sink.count(), 1);
    let (kind, name, recorded) = sink.completed.lock().unwrap()[0].clone();
    assert_eq!(kind, SessionKind::Breath);
    assert_eq!(name, "Box Breathing");
    assert_eq!(recorded, summary);
}

#[tokio::test(start_paused = true)]
async fn no_tick_is_applied_while_paused() {
    let config = WarriorConfig::default();
    let engine = SessionEngine::new(
        TimerConfig {
            duration_seconds: 60,
        },
        &config,
    )
    .unwrap();

    engine.start().await.unwrap();
    sleep(Duration::from_millis(13_500)).await;
    assert_eq!(elapsed(&engine), 10);

    engine.pause().await.unwrap();
    let paused = engine.snapshot();
    assert_eq!(paused.kind(), StateKind::Paused);

    sleep(Duration::from_secs(100)).await;
    assert_eq!(engine.snapshot(), paused);

    engine.resume().await.unwrap();
    sleep(Duration::from_millis(500)).await;
    assert_eq!(elapsed(&engine), 10);
    sleep(Duration::from_millis(600)).await;
    assert_eq!(elapsed(&engine), 11);
}

#[tokio::test(start_paused = true)]
async fn pause_landing_on_a_due_tick_keeps_the_pre_pause_state() {
    let engine = SessionEngine::new(
        TimerConfig {
            duration_seconds: 600,
        },
        &WarriorConfig::default(),
    )
    .unwrap();
    engine.start().await.unwrap();
    sleep(Duration::from_secs(4)).await;

    let mut frozen_at: Option<u32> = None;
    for cycle in 1..=4u32 {
        // Whole seconds: a tick is due at the same instant as the pause.
        sleep(Duration::from_secs(u64::from(cycle))).await;
        let before = engine.snapshot();
        assert_eq!(before.kind(), StateKind::Active);

        engine.pause().await.unwrap();
        let paused = engine.snapshot();
        assert_eq!(paused.kind(), StateKind::Paused);
        assert_eq!(paused.active(), before.active());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(engine.snapshot(), paused);

        let now = elapsed(&engine);
        if let Some(previous) = frozen_at {
            assert!(
                now == previous + cycle - 1 || now == previous + cycle,
                "cycle {}: {} seconds after {}",
                cycle,
                now,
                previous
            );
        }
        frozen_at = Some(now);
        engine.resume().await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_landing_on_a_due_tick_records_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let engine = SessionEngine::with_sink(
        TimerConfig {
            duration_seconds: 5,
        },
        &WarriorConfig::default(),
        Some(sink.clone()),
    )
    .unwrap();
    let mut events = engine.subscribe_events();

    engine.start().await.unwrap();
    sleep(Duration::from_secs(7)).await;
    engine.cancel().await.unwrap();
    assert_eq!(engine.snapshot(), EngineState::Idle);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(engine.snapshot(), EngineState::Idle);
    assert_eq!(sink.count(), 0);
    let events = drain(&mut events);
    assert_eq!(events.last(), Some(&SessionEvent::Cancelled));
    assert!(!events
        .iter()
        .any(|event| matches!(event, SessionEvent::Completed(_))));
}

#[tokio::test(start_paused = true)]
async fn pause_then_resume_leaves_the_active_state_untouched() {
    let engine = SessionEngine::new(&box_breath(2), &WarriorConfig::default()).unwrap();
    engine.start().await.unwrap();
    sleep(Duration::from_millis(8_500)).await;

    let before = engine.snapshot();
    engine.pause().await.unwrap();
    engine.resume().await.unwrap();
    assert_eq!(engine.snapshot(), before);
}

#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent_and_records_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let engine =
        SessionEngine::with_sink(&box_breath(1), &WarriorConfig::default(), Some(sink.clone()))
            .unwrap();
    let mut events = engine.subscribe_events();

    engine.start().await.unwrap();
    sleep(Duration::from_millis(7_500)).await;
    engine.cancel().await.unwrap();
    engine.cancel().await.unwrap();
    assert_eq!(engine.snapshot(), EngineState::Idle);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(engine.snapshot(), EngineState::Idle);
    assert_eq!(sink.count(), 0);
    assert!(!drain(&mut events)
        .iter()
        .any(|event| matches!(event, SessionEvent::Completed(_))));
}

#[tokio::test(start_paused = true)]
async fn rejected_actions_leave_state_unchanged() {
    let engine = SessionEngine::new(&box_breath(1), &WarriorConfig::default()).unwrap();

    let err = engine.pause().await.unwrap_err();
    assert_eq!(err.state, Some(StateKind::Idle));
    assert_eq!(err.reason, TransitionReason::WrongState);

    engine.start().await.unwrap();
    sleep(Duration::from_millis(6_500)).await;
    let before = engine.snapshot();
    let err = engine.advance_manually().await.unwrap_err();
    assert_eq!(err.action, Action::AdvanceManually);
    assert_eq!(err.reason, TransitionReason::FormatForbids);
    assert_eq!(engine.snapshot(), before);
}

#[tokio::test(start_paused = true)]
async fn user_paced_rounds_complete_on_the_last_advance() {
    let config = WarriorConfig::default();
    let engine = SessionEngine::new(&for_rounds(2), &config).unwrap();
    engine.start().await.unwrap();
    sleep(Duration::from_millis(10_500)).await;
    assert_eq!(engine.snapshot().kind(), StateKind::Active);

    for _ in 0..3 {
        engine.advance_manually().await.unwrap();
    }
    sleep(Duration::from_secs(20)).await;
    assert_eq!(engine.snapshot().kind(), StateKind::Active);

    engine.record_reps(4).await.unwrap();
    engine.advance_manually().await.unwrap();
    let summary = engine.wait_for_completion().await.unwrap();
    assert_eq!(summary.rounds_completed, 2);
    assert_eq!(summary.reps_completed, None);
    assert_eq!(summary.total_elapsed_seconds, 20);
}

#[tokio::test(start_paused = true)]
async fn finish_closes_a_run_with_reps_and_note() {
    let engine = SessionEngine::new(&for_rounds(5), &WarriorConfig::default()).unwrap();
    engine.start().await.unwrap();
    sleep(Duration::from_millis(10_500)).await;

    engine.complete_round().await.unwrap();
    engine.record_reps(12).await.unwrap();
    engine.set_note("Heavy legs").await.unwrap();
    engine.finish().await.unwrap();

    let summary = engine.snapshot().summary().cloned().unwrap();
    assert_eq!(summary.rounds_completed, 1);
    assert_eq!(summary.reps_completed, Some(12));
    assert_eq!(summary.note.as_deref(), Some("Heavy legs"));
    assert_eq!(summary.display_string(), "1+12 rounds");

    engine.reset().await.unwrap();
    assert_eq!(engine.snapshot(), EngineState::Idle);
}

#[tokio::test(start_paused = true)]
async fn accelerated_clock_runs_faster() {
    let config = WarriorConfig {
        resolution: ClockResolution::Accelerated {
            ticks_per_second: 20,
        },
        ..Default::default()
    };
    let engine = SessionEngine::new(&box_breath(1), &config).unwrap();
    engine.start().await.unwrap();

    let summary = tokio::time::timeout(Duration::from_secs(2), engine.wait_for_completion())
        .await
        .expect("completes within two seconds")
        .unwrap();
    assert_eq!(summary.total_elapsed_seconds, 16);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_acceleration_still_ticks() {
    let config = WarriorConfig {
        resolution: ClockResolution::Accelerated {
            ticks_per_second: 2_000_000_000,
        },
        ..Default::default()
    };
    assert!(config.validate().is_err());

    let engine = SessionEngine::new(&box_breath(1), &config).unwrap();
    engine.start().await.unwrap();
    let summary = tokio::time::timeout(Duration::from_secs(1), engine.wait_for_completion())
        .await
        .expect("completes within a second")
        .unwrap();
    assert_eq!(summary.total_elapsed_seconds, 16);
}

#[tokio::test(start_paused = true)]
async fn state_subscribers_see_the_terminal_state() {
    let config = WarriorConfig::default();
    let engine = SessionEngine::new(
        TimerConfig {
            duration_seconds: 5,
        },
        &config,
    )
    .unwrap();
    let mut state_rx = engine.subscribe_state();
    engine.start().await.unwrap();

    let terminal = state_rx
        .wait_for(EngineState::is_terminal)
        .await
        .unwrap()
        .clone();
    let summary = terminal.summary().unwrap();
    assert_eq!(summary.total_elapsed_seconds, 5);
    assert_eq!(summary.rounds_completed, 1);
}

#[tokio::test]
async fn invalid_configuration_is_rejected_at_construction() {
    let mut workout = for_rounds(3);
    workout.rounds = None;
    let err = SessionEngine::new(&workout, &WarriorConfig::default())
        .err()
        .unwrap();
    assert_eq!(err, DefinitionError::MissingParameter("rounds"));
}
