//! # lemonStudys Core Library
//!
//! Core logic for the lemonStudys study tracker: named habit streaks that
//! persist to SQLite and a pomodoro timer. The `lemonstudys` CLI is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Streaks**: An in-memory collection mirrored write-through to a
//!   [`StreakStore`], with an hourly sweep that zeroes expired streaks
//! - **Timer**: A Work/Break/Idle state machine advanced one second at a time
//! - **Storage**: SQLite persistence and TOML-based configuration
//!
//! Nothing here spawns threads. Owners drive [`StreakManager::poll`] and
//! [`PomodoroTimer::poll`] from their own loop, and time comes from a
//! [`Clock`] so tests can move it by hand.
//!
//! ## Key Components
//!
//! - [`StreakManager`]: Streak collection, events and expiry sweep
//! - [`PomodoroTimer`]: Pomodoro state machine
//! - [`Database`]: SQLite-backed [`StreakStore`]
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod storage;
pub mod streaks;
pub mod ticker;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::{ListenerId, Listeners, StreakEvent, TimerEvent};
pub use storage::{Config, Database, StreakRecord, StreakStore};
pub use streaks::{
    FieldValue, Streak, StreakField, StreakManager, StreakRow, StreakSettings, StreakSummary,
};
pub use ticker::Ticker;
pub use timer::{PomodoroState, PomodoroTimer, TimerSnapshot};
