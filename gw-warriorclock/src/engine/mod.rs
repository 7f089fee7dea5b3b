//! The engine that runs one session against a clock.
//!
//! A `SessionEngine` is a cheap, cloneable handle. Construction spawns a
//! dispatcher task that owns the `SessionMachine` and its `SessionClock`;
//! every action and every tick is applied by that one task, in order, so no
//! two transitions ever overlap. Actions travel over an `mpsc` channel with a
//! `oneshot` reply. The dispatcher prefers pending actions over pending ticks,
//! and it drops any tick from a clock generation that has since been stopped.
//!
//! Consumers observe the engine in two ways:
//! - `subscribe_state()` is a `watch` receiver holding the latest `EngineState`.
//! - `subscribe_events()` is a `broadcast` receiver of `SessionEvent`s.
//!
//! When every handle has been dropped the dispatcher stops the clock and exits.

pub mod machine;
pub mod state;

pub use machine::SessionMachine;
pub use state::{ActiveState, EngineState};

use crate::config::WarriorConfig;
use crate::error::{Action, DefinitionError, TransitionError};
use crate::events::SessionEvent;
use crate::session::{IntoDefinition, SessionDefinition};
use crate::summary::{CompletionSink, CompletionSummary};
use crate::time::{SessionClock, TickEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, trace};

const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 256;

/// A user action as sent to the dispatcher.
#[derive(Debug)]
enum Request {
    Start,
    Pause,
    Resume,
    AdvanceManually,
    CompleteRound,
    Cancel,
    Finish,
    RecordReps(u32),
    SetNote(String),
    Reset,
}

impl Request {
    fn action(&self) -> Action {
        match self {
            Request::Start => Action::Start,
            Request::Pause => Action::Pause,
            Request::Resume => Action::Resume,
            Request::AdvanceManually => Action::AdvanceManually,
            Request::CompleteRound => Action::CompleteRound,
            Request::Cancel => Action::Cancel,
            Request::Finish => Action::Finish,
            Request::RecordReps(_) => Action::RecordReps,
            Request::SetNote(_) => Action::SetNote,
            Request::Reset => Action::Reset,
        }
    }
}

struct Command {
    request: Request,
    reply: oneshot::Sender<Result<(), TransitionError>>,
}

/// A handle to one running session engine.
#[derive(Clone)]
pub struct SessionEngine {
    definition: Arc<SessionDefinition>,
    command_tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<EngineState>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionEngine {
    /// Creates an engine in `Idle` for the given session.
    ///
    /// Fails only if `definition` is a configuration that does not validate.
    /// Must be called from within a tokio runtime.
    pub fn new(
        definition: impl IntoDefinition,
        config: &WarriorConfig,
    ) -> Result<Self, DefinitionError> {
        Self::with_sink(definition, config, None)
    }

    /// Like `new`, and also hands each completed run to `sink`.
    pub fn with_sink(
        definition: impl IntoDefinition,
        config: &WarriorConfig,
        sink: Option<Arc<dyn CompletionSink>>,
    ) -> Result<Self, DefinitionError> {
        let definition = Arc::new(definition.into_definition()?);
        let lead_in = config.lead_in_for(definition.kind());

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (state_tx, state_rx) = watch::channel(EngineState::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher {
            machine: SessionMachine::new(Arc::clone(&definition), lead_in),
            clock: SessionClock::new(config.tick_period()),
            tick_tx,
            state_tx,
            event_tx: event_tx.clone(),
            sink,
        };
        debug!(
            "Spawning engine for '{}' ({}).",
            definition.name(),
            definition.kind()
        );
        tokio::spawn(dispatcher.run(command_rx, tick_rx));

        Ok(Self {
            definition,
            command_tx,
            state_rx,
            event_tx,
        })
    }

    pub fn definition(&self) -> &SessionDefinition {
        &self.definition
    }

    // --- Actions ---

    pub async fn start(&self) -> Result<(), TransitionError> {
        self.request(Request::Start).await
    }

    /// Stops the clock, then freezes the active state.
    pub async fn pause(&self) -> Result<(), TransitionError> {
        self.request(Request::Pause).await
    }

    /// Restarts the clock; the next tick arrives one full period later.
    pub async fn resume(&self) -> Result<(), TransitionError> {
        self.request(Request::Resume).await
    }

    pub async fn advance_manually(&self) -> Result<(), TransitionError> {
        self.request(Request::AdvanceManually).await
    }

    pub async fn complete_round(&self) -> Result<(), TransitionError> {
        self.request(Request::CompleteRound).await
    }

    /// Abandons the run without a summary. A no-op when idle.
    pub async fn cancel(&self) -> Result<(), TransitionError> {
        self.request(Request::Cancel).await
    }

    pub async fn finish(&self) -> Result<(), TransitionError> {
        self.request(Request::Finish).await
    }

    pub async fn record_reps(&self, reps: u32) -> Result<(), TransitionError> {
        self.request(Request::RecordReps(reps)).await
    }

    pub async fn set_note(&self, note: impl Into<String>) -> Result<(), TransitionError> {
        self.request(Request::SetNote(note.into())).await
    }

    pub async fn reset(&self) -> Result<(), TransitionError> {
        self.request(Request::Reset).await
    }

    async fn request(&self, request: Request) -> Result<(), TransitionError> {
        let action = request.action();
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command { request, reply })
            .await
            .map_err(|_| TransitionError::engine_stopped(action))?;
        reply_rx
            .await
            .map_err(|_| TransitionError::engine_stopped(action))?
    }

    // --- Observation ---

    /// The latest published state.
    pub fn snapshot(&self) -> EngineState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<EngineState> {
        self.state_rx.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Waits until the current run completes.
    ///
    /// Returns `None` if the engine shuts down first. A cancelled run keeps
    /// waiting for the next one.
    pub async fn wait_for_completion(&self) -> Option<CompletionSummary> {
        let mut state_rx = self.state_rx.clone();
        let summary = state_rx
            .wait_for(EngineState::is_terminal)
            .await
            .ok()?
            .summary()
            .cloned();
        summary
    }
}

/// Owns the machine and the clock. Runs on its own task.
struct Dispatcher {
    machine: SessionMachine,
    clock: SessionClock,
    tick_tx: mpsc::UnboundedSender<TickEvent>,
    state_tx: watch::Sender<EngineState>,
    event_tx: broadcast::Sender<SessionEvent>,
    sink: Option<Arc<dyn CompletionSink>>,
}

impl Dispatcher {
    async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<Command>,
        mut tick_rx: mpsc::UnboundedReceiver<TickEvent>,
    ) {
        loop {
            tokio::select! {
                biased;
                command = command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(tick) = tick_rx.recv() => self.handle_tick(tick),
            }
        }
        self.clock.stop();
        debug!(
            "Engine for '{}' shut down.",
            self.machine.definition().name()
        );
    }

    fn handle_command(&mut self, command: Command) {
        let Command { request, reply } = command;
        let result = self.apply(request);
        if reply.send(result).is_err() {
            trace!("Caller dropped before receiving the result.");
        }
    }

    fn apply(&mut self, request: Request) -> Result<(), TransitionError> {
        let action = request.action();
        if let Err(err) = self.machine.check(action) {
            debug!("Rejected: {}.", err);
            return Err(err);
        }

        // No tick may land once the state has left `Active`.
        if matches!(action, Action::Pause | Action::Cancel | Action::Finish) {
            self.clock.stop();
        }

        let events = match request {
            Request::Start => self.machine.start()?,
            Request::Pause => self.machine.pause()?,
            Request::Resume => self.machine.resume()?,
            Request::AdvanceManually => self.machine.advance_manually()?,
            Request::CompleteRound => self.machine.complete_round()?,
            Request::Cancel => self.machine.cancel()?,
            Request::Finish => self.machine.finish()?,
            Request::RecordReps(reps) => {
                self.machine.record_reps(reps)?;
                Vec::new()
            }
            Request::SetNote(note) => {
                self.machine.set_note(note)?;
                Vec::new()
            }
            Request::Reset => self.machine.reset()?,
        };
        self.sync_clock();
        self.publish(events);
        Ok(())
    }

    fn handle_tick(&mut self, tick: TickEvent) {
        if !self.clock.is_running() || tick.generation != self.clock.generation() {
            trace!(
                "Dropping tick #{} of stale generation {}.",
                tick.tick_count,
                tick.generation
            );
            return;
        }
        let events = self.machine.tick();
        self.sync_clock();
        self.publish(events);
    }

    /// Runs the clock exactly while the machine is in lead-in or active.
    fn sync_clock(&mut self) {
        match (self.machine.needs_clock(), self.clock.is_running()) {
            (true, false) => {
                let tick_tx = self.tick_tx.clone();
                self.clock.start(move |tick| {
                    tick_tx.send(tick).ok();
                });
            }
            (false, true) => {
                self.clock.stop();
            }
            _ => {}
        }
    }

    fn publish(&self, events: Vec<SessionEvent>) {
        let state = self.machine.state();
        self.state_tx.send_if_modified(|current| {
            if current == state {
                return false;
            }
            *current = state.clone();
            true
        });
        for event in events {
            if let (SessionEvent::Completed(summary), Some(sink)) = (&event, &self.sink) {
                let definition = self.machine.definition();
                sink.session_completed(definition.kind(), definition.name(), summary);
            }
            self.event_tx.send(event).ok();
        }
    }
}
