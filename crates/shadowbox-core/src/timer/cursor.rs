use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::moves::COUNTDOWN_LEN;

/// Where the cursor sits in a move sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "index", rename_all = "lowercase")]
pub enum CursorPosition {
    /// Nothing shown yet.
    Idle,
    /// Inside the countdown preamble.
    Countdown(usize),
    /// Inside the combo body. Never goes back to the countdown.
    Looping(usize),
}

impl CursorPosition {
    pub fn index(&self) -> Option<usize> {
        match *self {
            CursorPosition::Idle => None,
            CursorPosition::Countdown(i) | CursorPosition::Looping(i) => Some(i),
        }
    }
}

/// Walks a sequence of `len` moves: the countdown once, then the body forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveCursor {
    len: usize,
    countdown_len: usize,
    position: CursorPosition,
}

impl MoveCursor {
    pub fn new(len: usize) -> Self {
        Self::with_countdown(len, COUNTDOWN_LEN)
    }

    pub fn with_countdown(len: usize, countdown_len: usize) -> Self {
        Self {
            len,
            countdown_len,
            position: CursorPosition::Idle,
        }
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    pub fn current_index(&self) -> Option<usize> {
        self.position.index()
    }

    pub fn is_countdown_complete(&self) -> bool {
        matches!(self.position, CursorPosition::Looping(_))
    }

    /// Loop period once past the countdown.
    pub fn body_len(&self) -> usize {
        self.len.saturating_sub(self.countdown_len)
    }

    fn is_playable(&self) -> bool {
        self.countdown_len > 0 && self.len > self.countdown_len
    }

    /// Jump to the first countdown move. Returns its index.
    pub fn reset(&mut self) -> Option<usize> {
        if !self.is_playable() {
            return None;
        }
        self.position = CursorPosition::Countdown(0);
        Some(0)
    }

    /// Step to the next move and return its index.
    ///
    /// `None` means the sequence is too short to play; nothing changes.
    pub fn advance(&mut self) -> Option<usize> {
        if !self.is_playable() {
            return None;
        }
        let c = self.countdown_len;
        self.position = match self.position {
            CursorPosition::Idle => CursorPosition::Countdown(0),
            CursorPosition::Countdown(i) if i + 1 < c => CursorPosition::Countdown(i + 1),
            CursorPosition::Countdown(i) | CursorPosition::Looping(i) => {
                let i = i.max(c - 1);
                let next = (i + 1 - c) % self.body_len() + c;
                if next == c && i != c - 1 {
                    debug!(period = self.body_len(), "move loop wrapped");
                }
                CursorPosition::Looping(next)
            }
        };
        self.position.index()
    }
}
