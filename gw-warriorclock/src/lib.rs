//! # Warrior Clock
//!
//! A session execution engine for timed breathing and workout sessions.
//!
//! One generic engine drives every activity format through
//! `Idle → LeadIn → Active ⇄ Paused → Completed`, one tick per second, with
//! race-free pause, resume and cancel, and a completion summary published
//! exactly once per run.
//!
//! ## Core Concepts
//!
//! - **SessionDefinition**: an immutable, validated list of segments under a
//!   `Format` (time cap, fixed rounds, user-paced rounds, or work/rest intervals).
//!   Build one from a `BreathConfig`, `WorkoutConfig` or `TimerConfig`.
//! - **SessionEngine**: a cloneable handle to a dispatcher task that owns the
//!   state machine and its `SessionClock`. Actions are async calls; state is
//!   pushed through a `watch` channel and events through a `broadcast` channel.
//! - **CompletionSink**: receives each completed run. `DailyLog` is one.
//! - **ContentLibrary**: curated and user-authored sessions, the resolver
//!   that picks today's session, and the verse of the day.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use warriorclock::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Load configuration; every field has a default.
//!     let config = WarriorConfig::load(None)?;
//!
//!     // 2. Resolve today's breath session.
//!     let library = ContentLibrary::from_config(&config)?;
//!     let session = library.resolve_default_breath()?;
//!
//!     // 3. Create the engine and subscribe before starting it.
//!     let engine = SessionEngine::new(session.definition, &config)?;
//!     let mut events = engine.subscribe_events();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{:?}", event);
//!         }
//!     });
//!
//!     // 4. Run it to completion.
//!     engine.start().await?;
//!     if let Some(summary) = engine.wait_for_completion().await {
//!         println!("Done: {}", summary.display_string());
//!     }
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Warrior Clock";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod events;
pub mod record;
pub mod session;
pub mod summary;
pub mod time;

/// A prelude module for easy importing of the most common Warrior Clock types.
pub mod prelude {
    pub use crate::common::{format_clock, BreathId, SessionKind, WorkoutId};
    pub use crate::config::{ClockResolution, WarriorConfig};
    pub use crate::content::{ContentLibrary, ContentSource, DayIndex, ResolvedSession, Verse};
    pub use crate::engine::{ActiveState, EngineState, SessionEngine};
    pub use crate::error::{
        Action, ContentError, DefinitionError, StateKind, TransitionError, TransitionReason,
    };
    pub use crate::events::SessionEvent;
    pub use crate::record::{DailyLog, DailyRecord};
    pub use crate::session::{
        BreathConfig, Format, IntoDefinition, RoundCount, Segment, SegmentKind,
        SessionDefinition, TimerConfig, WorkoutConfig, WorkoutType,
    };
    pub use crate::summary::{CompletionSink, CompletionSummary};
}
