use anyhow::Result;
use colored::*;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warriorclock::config::{ClockResolution, LeadInConfig};
use warriorclock::events::next_event;
use warriorclock::prelude::*;
use warriorclock::{ENGINE_NAME, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // 2. An accelerated clock so a whole session fits in a few seconds.
    let config = WarriorConfig {
        resolution: ClockResolution::Accelerated {
            ticks_per_second: 20,
        },
        lead_in: LeadInConfig {
            breath: 3,
            ..Default::default()
        },
        ..Default::default()
    };
    info!("{} v{} demo.", ENGINE_NAME, VERSION);

    // 3. Resolve today's sessions and record completions in a daily log.
    let library = ContentLibrary::from_config(&config)?;
    let log = Arc::new(DailyLog::new(config.calendar.timezone));
    let day = DayIndex::today(&config.calendar);

    if let Some(verse) = library.verse_for_day(day) {
        info!("{} {}", verse.reference.bold(), verse.text.italic());
        log.record_verse(log.today(), verse.id);
    }

    let breath = library.resolve_default_breath()?;
    run_clock_driven(breath.definition, &config, Arc::clone(&log)).await?;

    let workout = library.resolve_workout(None, day)?;
    info!("Today's workout is '{}'; finishing it by hand.", workout.name);
    run_by_hand(workout.definition, &config, Arc::clone(&log)).await?;

    let today = log.today();
    if let Some(record) = log.record(today) {
        info!(
            "Today: {:.0}% complete, streak {}.",
            record.completion_percentage() * 100.0,
            log.streak(today)
        );
    }
    Ok(())
}

/// Runs a session that needs no input until the clock completes it.
async fn run_clock_driven(
    definition: SessionDefinition,
    config: &WarriorConfig,
    log: Arc<DailyLog>,
) -> Result<()> {
    let engine = SessionEngine::with_sink(definition, config, Some(log))?;
    spawn_event_listener(&engine);
    engine.start().await?;
    if let Some(summary) = engine.wait_for_completion().await {
        println!(
            "{} {}",
            "COMPLETE".green().bold(),
            summary.display_string().bold()
        );
    }
    Ok(())
}

/// Steps through a few segments, records partial reps and finishes early.
async fn run_by_hand(
    definition: SessionDefinition,
    config: &WarriorConfig,
    log: Arc<DailyLog>,
) -> Result<()> {
    let config = WarriorConfig {
        lead_in: LeadInConfig {
            workout: 0,
            ..config.lead_in
        },
        ..config.clone()
    };
    let engine = SessionEngine::with_sink(definition, &config, Some(log))?;
    spawn_event_listener(&engine);
    engine.start().await?;

    for _ in 0..4 {
        if let Err(err) = engine.advance_manually().await {
            info!("{}", err.to_string().yellow());
            break;
        }
    }
    engine.record_reps(7).await?;
    engine.set_note("Demo run").await?;
    engine.finish().await?;
    if let Some(summary) = engine.wait_for_completion().await {
        println!(
            "{} {}",
            "FINISHED".green().bold(),
            summary.display_string().bold()
        );
    }
    Ok(())
}

/// Prints every event the engine broadcasts.
fn spawn_event_listener(engine: &SessionEngine) {
    let mut events = engine.subscribe_events();
    let definition = engine.definition().clone();
    tokio::spawn(async move {
        while let Some(event) = next_event(&mut events).await {
            match event {
                SessionEvent::LeadInTick { seconds_remaining } if seconds_remaining > 0 => {
                    info!("[LEAD-IN] {}", seconds_remaining.to_string().yellow())
                }
                SessionEvent::SegmentStarted {
                    segment_index,
                    round,
                    ..
                } => {
                    if let Some(segment) = definition.segments().get(segment_index) {
                        info!(
                            "[ROUND {}] {}",
                            round,
                            segment.display_string().cyan().bold()
                        );
                    }
                }
                SessionEvent::Completed(_) => break,
                other => info!("[EVENT] => {:?}", other),
            }
        }
    });
}
