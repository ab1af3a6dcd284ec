use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::moves::{Move, Stance};
use crate::timer::{ClockSnapshot, CursorPosition};

/// Every state change of a fight session produces an Event.
/// Hosts render from them and hang sounds/haptics off them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        total_rounds: u32,
        round_duration_ms: u64,
        rest_duration_ms: u64,
        at: DateTime<Utc>,
    },
    /// A new move is on display.
    MoveChanged {
        index: usize,
        countdown: bool,
        /// Combo the move belongs to; `None` during the countdown.
        combo: Option<String>,
        current: Move,
        /// How long it will stay up at the current speed.
        display_ms: u64,
        at: DateTime<Utc>,
    },
    RoundEnded {
        completed_rounds: u32,
        total_rounds: u32,
        at: DateTime<Utc>,
    },
    RestEnded {
        /// Zero-based round that is starting.
        round: u32,
        at: DateTime<Utc>,
    },
    GameOver {
        completed_rounds: u32,
        at: DateTime<Utc>,
    },
    SessionPaused {
        time_left_ms: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        time_left_ms: u64,
        at: DateTime<Utc>,
    },
    SpeedChanged {
        speed_multiplier: f64,
        at: DateTime<Utc>,
    },
    StanceChanged {
        stance: Stance,
        at: DateTime<Utc>,
    },
    SessionStopped {
        completed_rounds: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        clock: ClockSnapshot,
        cursor: CursorPosition,
        current_move: Option<String>,
        speed_multiplier: f64,
        stance: Stance,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Events after which the session produces nothing more.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::GameOver { .. } | Event::SessionStopped { .. })
    }
}
