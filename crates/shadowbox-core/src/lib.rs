//! # Shadowbox Core Library
//!
//! This library provides the core logic for Shadowbox, a shadow-boxing
//! trainer that calls out combos as timed prompts across rounds and rests.
//! Everything is available through the standalone CLI binary; any graphical
//! host is a thin layer over the same events.
//!
//! ## Architecture
//!
//! - **Playback engine**: wall-clock-based state machines (session clock,
//!   move cursor, move cadence) that the caller ticks; a tokio driver hosts
//!   them for real-time use
//! - **Fight service**: HTTP client for the fight generator plus an offline
//!   file-backed source
//! - **Storage**: SQLite for preferences and fight history, TOML for
//!   configuration
//!
//! ## Key Components
//!
//! - [`FightSession`]: round/rest timing coupled to move playback
//! - [`SessionClock`]: pausable round/rest countdown
//! - [`Database`]: preferences blob and training history
//! - [`Config`]: application configuration management
//! - [`FightGenerator`]: trait for combo sources

pub mod error;
pub mod events;
pub mod moves;
pub mod observable;
pub mod service;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, FightError, ValidationError};
pub use events::Event;
pub use moves::{Combo, Direction, Move, MoveSequence, Stance};
pub use observable::{ComboBadge, Observable};
pub use service::{FightGenerator, FightRequest, FightResponse, FileFightGenerator, HttpFightGenerator};
pub use session::{FightSession, FightSummary, SessionCommand, SessionHandle, SessionOptions};
pub use storage::{Config, Database, Preferences, PreferencesStore};
pub use timer::{Clock, ManualClock, SessionClock, SystemClock, TokioClock};
