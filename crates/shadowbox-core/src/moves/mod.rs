//! Moves, combos and the flat sequences built from them.

mod sequence;
mod stance;

pub use sequence::{build, countdown, ComboSpan, MoveSequence, COUNTDOWN_LEN};
pub use stance::{transform, transform_all, Stance};

use serde::{Deserialize, Serialize};

/// Longest time a single move stays on display, whatever its pause time
/// and the speed multiplier say.
pub const MAX_DISPLAY_MS: u64 = 24 * 60 * 60 * 1_000;

/// Tilt direction used by the host's animation layer.
///
/// Playback never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    Forward,
    Backward,
    #[default]
    Pulse,
}

/// One displayable training instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    /// Prompt text. May contain a literal line break.
    pub text: String,
    /// How long the move stays on screen at speed 1.0.
    pub pause_time_ms: u64,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub tilt_value: f64,
}

impl Move {
    pub fn new(text: impl Into<String>, pause_time_ms: u64) -> Self {
        Self {
            text: text.into(),
            pause_time_ms,
            direction: Direction::Pulse,
            tilt_value: 0.0,
        }
    }

    pub fn with_tilt(mut self, direction: Direction, tilt_value: f64) -> Self {
        self.direction = direction;
        self.tilt_value = tilt_value;
        self
    }

    /// Display duration once the speed multiplier is applied.
    ///
    /// Never returns zero so a cadence timer always makes progress, and
    /// never more than [`MAX_DISPLAY_MS`].
    pub fn scaled_pause_ms(&self, speed_multiplier: f64) -> u64 {
        let speed = effective_speed(speed_multiplier);
        clamp_display_ms(self.pause_time_ms as f64 / speed)
    }
}

pub(crate) fn clamp_display_ms(ms: f64) -> u64 {
    (ms.round().min(MAX_DISPLAY_MS as f64) as u64).max(1)
}

/// Speed multiplier actually used for playback: anything not finite and
/// positive plays at normal speed.
pub fn effective_speed(speed_multiplier: f64) -> f64 {
    if speed_multiplier.is_finite() && speed_multiplier > 0.0 {
        speed_multiplier
    } else {
        1.0
    }
}

/// Named, ordered group of moves as returned by the fight service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub name: String,
    pub moves: Vec<Move>,
    #[serde(default)]
    pub level: u32,
}

impl Combo {
    pub fn new(name: impl Into<String>, moves: Vec<Move>) -> Self {
        Self {
            name: name.into(),
            moves,
            level: 0,
        }
    }
}
