//! The session's tick source.
//!
//! A `SessionClock` runs one tokio task per start/stop span. Each span is a
//! *generation*; every `TickEvent` carries the generation it was produced in so
//! a consumer can discard ticks that were already queued when the clock was
//! stopped. Ticks are delivered through a gate that `stop()` closes before it
//! returns, so no callback runs after `stop()`.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// One clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    /// Ticks delivered so far in this generation, starting at 1.
    pub tick_count: u64,
    pub generation: u64,
    pub timestamp: Instant,
}

#[derive(Debug, Default)]
struct ClockGate {
    generation: u64,
    running: bool,
}

/// A cancellable periodic ticker.
///
/// The first tick of a generation arrives one full period after `start`.
/// Dropping the clock stops it.
#[derive(Debug)]
pub struct SessionClock {
    period: Duration,
    gate: Arc<Mutex<ClockGate>>,
    task: Option<JoinHandle<()>>,
}

/// The shortest period a clock runs at; `interval_at` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

impl SessionClock {
    /// Periods below one millisecond are raised to it.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            gate: Arc::new(Mutex::new(ClockGate::default())),
            task: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts a new generation, stopping any running one first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, mut on_tick: F) -> u64
    where
        F: FnMut(TickEvent) + Send + 'static,
    {
        self.stop();
        let generation = {
            let mut gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
            gate.generation += 1;
            gate.running = true;
            gate.generation
        };

        let gate = Arc::clone(&self.gate);
        let period = self.period;
        let first_tick = Instant::now() + period;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick_count = 0;
            loop {
                let timestamp = ticker.tick().await;
                tick_count += 1;
                let event = TickEvent {
                    tick_count,
                    generation,
                    timestamp,
                };
                if !deliver(&gate, event, &mut on_tick) {
                    break;
                }
            }
        }));
        trace!("Clock generation {} started.", generation);
        generation
    }

    /// Stops ticking. Returns `false` if the clock was already stopped.
    pub fn stop(&mut self) -> bool {
        let was_running = {
            let mut gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut gate.running, false)
        };
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if was_running {
            trace!("Clock stopped.");
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .running
    }

    /// The generation most recently started.
    pub fn generation(&self) -> u64 {
        self.gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs the callback under the gate. Returns `false` once the generation is over.
fn deliver<F>(gate: &Mutex<ClockGate>, event: TickEvent, on_tick: &mut F) -> bool
where
    F: FnMut(TickEvent),
{
    let gate = gate.lock().unwrap_or_else(PoisonError::into_inner);
    if !gate.running || gate.generation != event.generation {
        return false;
    }
    on_tick(event);
    true
}
