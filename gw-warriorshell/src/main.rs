use anyhow::{bail, Context, Result};
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warriorclock::content::TimerPreset;
use warriorclock::events::next_event;
use warriorclock::prelude::*;
use warriorclock::{ENGINE_NAME, VERSION as LIB_VERSION};

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct ShellHighlighter;

impl Highlighter for ShellHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", "  W A R R I O R   C L O C K".cyan().bold());
    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!("{}", "-".repeat(64).dimmed());
    println!("{}", version_string);
    println!("{}", "-".repeat(64).dimmed());
}

fn print_help() {
    println!("Available commands:");
    println!("  list                  - Shows curated and custom sessions.");
    println!("  today [breath|workout] - Shows today's plan, or loads one of its sessions.");
    println!("  breath <N>            - Loads curated breath session N.");
    println!("  workout <N>           - Loads curated workout N.");
    println!("  custom [breath|workout] <N> - Loads custom session N from the config file.");
    println!("  verse                 - Shows today's verse.");
    println!("  verse note <TEXT>     - Saves a note on today's verse.");
    println!("  timer <SECONDS>       - Loads a bare countdown.");
    println!("  preset <N>            - Loads timer preset N.");
    println!("  start | pause | resume | cancel | finish | reset");
    println!("  next                  - Advances to the next segment.");
    println!("  round                 - Completes the current round.");
    println!("  reps <N>              - Records reps into the unfinished round.");
    println!("  note <TEXT>           - Attaches a note to the summary.");
    println!("  status                - Shows the engine state.");
    println!("  log                   - Shows today's record and streak.");
    println!("  exit                  - Quits the shell.");
}

/// Everything the shell keeps between commands.
struct Shell {
    config: WarriorConfig,
    library: ContentLibrary,
    log: Arc<DailyLog>,
    engine: Option<SessionEngine>,
}

impl Shell {
    fn new(config: WarriorConfig) -> Result<Self> {
        let library = ContentLibrary::from_config(&config)?;
        let log = Arc::new(DailyLog::new(config.calendar.timezone));
        Ok(Self {
            config,
            library,
            log,
            engine: None,
        })
    }

    fn day(&self) -> DayIndex {
        DayIndex::today(&self.config.calendar)
    }

    fn engine(&self) -> Result<&SessionEngine> {
        match &self.engine {
            Some(engine) => Ok(engine),
            None => bail!("no session loaded; try 'today', 'breath <N>' or 'workout <N>'"),
        }
    }

    /// Replaces the loaded session, abandoning any run in progress.
    async fn load(&mut self, definition: SessionDefinition) -> Result<()> {
        if let Some(previous) = self.engine.take() {
            previous.cancel().await.ok();
        }
        let sink: Arc<dyn CompletionSink> = self.log.clone();
        let engine = SessionEngine::with_sink(definition, &self.config, Some(sink))?;
        spawn_event_listener(&engine);
        let definition = engine.definition();
        println!(
            "--> Loaded {} '{}' ({}). Type 'start' to begin.",
            definition.kind(),
            definition.name().cyan(),
            definition.pattern_string()
        );
        self.engine = Some(engine);
        Ok(())
    }

    fn list(&self) {
        println!("{}", "Breath sessions:".bold());
        for (n, breath) in self.library.curated_breaths().iter().enumerate() {
            let marker = if breath.is_default { " (default)" } else { "" };
            println!(
                "  {}. {}{} - {} rounds",
                n + 1,
                breath.name,
                marker.dimmed(),
                breath.rounds
            );
        }
        println!("{}", "Workouts:".bold());
        for (n, workout) in self.library.curated_workouts().iter().enumerate() {
            println!(
                "  {}. {} - {}, {}",
                n + 1,
                workout.name,
                workout.workout_type.display_name(),
                workout.estimated_duration()
            );
        }
        let custom: Vec<_> = self.library.custom_breaths().collect();
        if !custom.is_empty() {
            let selected = self.library.selected_breath();
            println!("{}", "Custom breath sessions:".bold());
            for (n, (id, breath)) in custom.iter().enumerate() {
                let marker = if Some(*id) == selected { " (default)" } else { "" };
                println!(
                    "  {}. {}{} - {} rounds",
                    n + 1,
                    breath.name,
                    marker.dimmed(),
                    breath.rounds
                );
            }
        }
        let custom: Vec<_> = self.library.custom_workouts().collect();
        if !custom.is_empty() {
            println!("{}", "Custom workouts:".bold());
            for (n, (_, workout)) in custom.iter().enumerate() {
                println!(
                    "  {}. {} - {}",
                    n + 1,
                    workout.name,
                    workout.workout_type.display_name()
                );
            }
        }
        println!("{}", "Timer presets:".bold());
        for (n, TimerPreset { title, subtitle, .. }) in
            self.library.timer_presets().iter().enumerate()
        {
            println!("  {}. {} - {}", n + 1, title, subtitle.dimmed());
        }
    }

    fn today(&self) -> Result<()> {
        let day = self.day();
        let breath = self.library.resolve_default_breath()?;
        let workout = self.library.resolve_workout(None, day)?;
        let record = self.log.record(self.log.today()).unwrap_or_default();
        println!("Day {} of your journey.", day.0 + 1);
        if let Some(verse) = self.library.verse_for_day(day) {
            println!("  Verse:   {}", verse.reference.italic());
        }
        println!(
            "  Breath:  {} {}",
            breath.name,
            check_mark(record.breath_completed)
        );
        println!(
            "  Workout: {} {}",
            workout.name,
            check_mark(record.workout_completed)
        );
        Ok(())
    }

    fn status(&self) -> Result<()> {
        let engine = self.engine()?;
        let definition = engine.definition();
        let line = match engine.snapshot() {
            EngineState::Idle => "idle".dimmed().to_string(),
            EngineState::LeadIn { seconds_remaining } => {
                format!("get ready... {}", seconds_remaining.to_string().yellow())
            }
            EngineState::Completed(summary) => {
                format!("{} {}", "completed".green(), summary.display_string())
            }
            state @ (EngineState::Active(_) | EngineState::Paused(_)) => {
                let paused = matches!(state, EngineState::Paused(_));
                match state.active() {
                    Some(active) => render_active(definition, active, paused),
                    None => String::new(),
                }
            }
        };
        println!("--> {}", line);
        Ok(())
    }

    /// Shows today's verse and marks it read.
    fn verse(&self) -> Result<()> {
        let verse = self
            .library
            .verse_for_day(self.day())
            .context("no verses are available")?;
        println!("{} ({})", verse.reference.cyan().bold(), verse.theme.dimmed());
        println!("  {}", verse.text.italic());
        self.log.record_verse(self.log.today(), verse.id);
        Ok(())
    }

    fn print_log(&self) {
        let today = self.log.today();
        match self.log.record(today) {
            Some(record) => {
                println!(
                    "Today ({}): {:.0}% complete",
                    today,
                    record.completion_percentage() * 100.0
                );
                if let Some(name) = &record.breath_session {
                    println!("  Breath:  {} {}", name, check_mark(record.breath_completed));
                }
                if let Some(name) = &record.workout {
                    let summary = record
                        .workout_summary
                        .as_ref()
                        .map(CompletionSummary::display_string)
                        .unwrap_or_default();
                    println!("  Workout: {} {}", name, summary);
                }
                if let Some(verse) = record.verse.as_deref().and_then(|id| self.library.verse(id)) {
                    println!("  Verse:   {}", verse.reference);
                }
                if let Some(note) = &record.verse_note {
                    println!("  Note:    {}", note.italic());
                }
                for extra in &record.extra_workouts {
                    println!("  Extra:   {}", extra.description);
                }
            }
            None => println!("Nothing recorded today yet."),
        }
        println!("Current streak: {} days", self.log.streak(today));
    }
}

fn check_mark(done: bool) -> colored::ColoredString {
    if done {
        "[done]".green()
    } else {
        "[open]".dimmed()
    }
}

fn render_active(definition: &SessionDefinition, active: &ActiveState, paused: bool) -> String {
    let segment = definition
        .segments()
        .get(active.segment_index)
        .map(Segment::display_string)
        .unwrap_or_default();
    let mut parts = vec![format!("round {}", active.round), segment.bold().to_string()];
    if let Some(interval) = active.interval {
        parts.push(format!(
            "{:?} {}/{}",
            interval.phase, interval.number, interval.of
        ));
    }
    if let Some(remaining) = active.time_remaining_in_segment {
        parts.push(format!("{}s left", remaining));
    }
    if let Some(cap) = active.cap_remaining {
        parts.push(format!("cap {}", format_clock(cap)));
    }
    parts.push(format!(
        "elapsed {}",
        format_clock(active.total_elapsed_seconds)
    ));
    let line = parts.join(" | ");
    if paused {
        format!("{} {}", "[paused]".yellow(), line)
    } else {
        line
    }
}

/// Prints the events of one engine until its run completes.
fn spawn_event_listener(engine: &SessionEngine) {
    let mut events = engine.subscribe_events();
    let definition = engine.definition().clone();
    tokio::spawn(async move {
        while let Some(event) = next_event(&mut events).await {
            match event {
                SessionEvent::LeadInStarted { seconds } => {
                    println!("<-- [LEAD-IN] Starting in {} seconds.", seconds);
                }
                SessionEvent::LeadInTick { .. } | SessionEvent::Reset => {}
                SessionEvent::SegmentStarted {
                    segment_index,
                    round,
                    interval,
                } => {
                    let Some(segment) = definition.segments().get(segment_index) else {
                        continue;
                    };
                    let cue = match interval {
                        Some(interval) => format!("{:?}", interval.phase).to_uppercase(),
                        None => segment.kind.instruction().to_string(),
                    };
                    println!(
                        "<-- [ROUND {}] {} {}",
                        round,
                        cue.cyan().bold(),
                        segment.display_string()
                    );
                }
                SessionEvent::RoundCompleted { rounds_completed } => {
                    println!("<-- [ROUND] {} complete.", rounds_completed);
                }
                SessionEvent::Paused { .. } => println!("<-- [PAUSED]"),
                SessionEvent::Resumed { .. } => println!("<-- [RESUMED]"),
                SessionEvent::Cancelled => println!("<-- [CANCELLED]"),
                SessionEvent::Completed(summary) => {
                    println!(
                        "\n<-- {} {}\n>> ",
                        "[COMPLETE]".green().bold(),
                        summary.display_string()
                    );
                }
            }
        }
    });
}

fn parse_index(arg: Option<&&str>, usage: &str) -> Result<usize> {
    let arg = arg.with_context(|| format!("Usage: {}", usage))?;
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => bail!("'{}' is not a valid number. Usage: {}", arg, usage),
    }
}

fn custom_workout(shell: &Shell, n: usize) -> Result<ResolvedSession> {
    let id = shell
        .library
        .custom_workouts()
        .nth(n)
        .map(|(id, _)| id)
        .context("no custom workout with that number")?;
    Ok(shell.library.resolve_workout(Some(id), shell.day())?)
}

async fn execute(shell: &mut Shell, args: &[&str]) -> Result<()> {
    let Some(command) = args.first() else {
        return Ok(());
    };
    match *command {
        "list" => shell.list(),
        "today" => match args.get(1) {
            Some(&"breath") => {
                let resolved = shell.library.resolve_default_breath()?;
                shell.load(resolved.definition).await?;
            }
            Some(&"workout") => {
                let resolved = shell.library.resolve_workout(None, shell.day())?;
                shell.load(resolved.definition).await?;
            }
            Some(other) => bail!("Unknown 'today' target '{}'. Try 'breath' or 'workout'.", other),
            None => shell.today()?,
        },
        "breath" => {
            let n = parse_index(args.get(1), "breath <N>")?;
            let breath = shell
                .library
                .curated_breaths()
                .get(n)
                .context("no breath session with that number")?;
            let definition = breath.build()?;
            shell.load(definition).await?;
        }
        "workout" => {
            let n = parse_index(args.get(1), "workout <N>")?;
            let workout = shell
                .library
                .curated_workouts()
                .get(n)
                .context("no workout with that number")?;
            let definition = workout.build()?;
            shell.load(definition).await?;
        }
        "custom" => {
            const USAGE: &str = "custom [breath|workout] <N>";
            let resolved = match args.get(1) {
                Some(&"breath") => {
                    let n = parse_index(args.get(2), USAGE)?;
                    let id = shell
                        .library
                        .custom_breaths()
                        .nth(n)
                        .map(|(id, _)| id)
                        .context("no custom breath session with that number")?;
                    shell.library.resolve_breath(Some(id))?
                }
                Some(&"workout") => {
                    let n = parse_index(args.get(2), USAGE)?;
                    custom_workout(shell, n)?
                }
                other => {
                    let n = parse_index(other, USAGE)?;
                    custom_workout(shell, n)?
                }
            };
            shell.load(resolved.definition).await?;
        }
        "verse" => match args.get(1) {
            Some(&"note") => {
                let text = args[2..].join(" ");
                if text.is_empty() {
                    bail!("Usage: verse note <TEXT>");
                }
                shell.log.set_verse_note(shell.log.today(), text);
                println!("--> Verse note saved.");
            }
            Some(other) => bail!("Unknown 'verse' option '{}'. Try 'verse note <TEXT>'.", other),
            None => shell.verse()?,
        },
        "timer" => {
            let seconds_str = args.get(1).context("Usage: timer <SECONDS>")?;
            let seconds = seconds_str
                .parse::<u32>()
                .with_context(|| format!("'{}' is not a valid number of seconds", seconds_str))?;
            let definition = TimerConfig {
                duration_seconds: seconds,
            }
            .build()?;
            shell.load(definition).await?;
        }
        "preset" => {
            let n = parse_index(args.get(1), "preset <N>")?;
            let preset = shell
                .library
                .timer_presets()
                .get(n)
                .context("no preset with that number")?;
            let definition = preset.timer.build()?;
            shell.load(definition).await?;
        }
        "start" => shell.engine()?.start().await?,
        "pause" => shell.engine()?.pause().await?,
        "resume" => shell.engine()?.resume().await?,
        "next" => shell.engine()?.advance_manually().await?,
        "round" => shell.engine()?.complete_round().await?,
        "finish" => shell.engine()?.finish().await?,
        "cancel" => shell.engine()?.cancel().await?,
        "reset" => shell.engine()?.reset().await?,
        "reps" => {
            let reps_str = args.get(1).context("Usage: reps <N>")?;
            let reps = reps_str
                .parse::<u32>()
                .with_context(|| format!("'{}' is not a valid rep count", reps_str))?;
            shell.engine()?.record_reps(reps).await?;
            println!("--> Recorded {} reps.", reps);
        }
        "note" => {
            let text = args[1..].join(" ");
            if text.is_empty() {
                bail!("Usage: note <TEXT>");
            }
            shell.engine()?.set_note(text).await?;
            println!("--> Note saved.");
        }
        "status" => shell.status()?,
        "log" => shell.print_log(),
        "help" => print_help(),
        other => bail!("Unknown command: '{}'. Type 'help'.", other),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config_path = env::var_os("WARRIOR_CONFIG").map(PathBuf::from);
    let config = WarriorConfig::load(config_path.as_deref())?;
    info!("Loaded configuration, clock {:?}.", config.resolution);

    let mut shell = Shell::new(config)?;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ShellHighlighter));

    println!(
        "{} is ready. Type 'help' for commands or 'exit' to quit.",
        ENGINE_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.split_whitespace().collect::<Vec<_>>();
                if args.first() == Some(&"exit") {
                    break;
                }
                if let Err(err) = execute(&mut shell, &args).await {
                    println!("{} {}", "Error:".red().bold(), err);
                }
            }
            Err(_) => break,
        }
    }

    if let Some(engine) = shell.engine.take() {
        engine.cancel().await.ok();
    }
    println!("Exiting warriorshell...");
    Ok(())
}
