use serde::{Deserialize, Serialize};

use super::stance::{transform_all, Stance};
use super::{Combo, Direction, Move};
use crate::error::FightError;

/// Number of moves in the fixed countdown preamble.
pub const COUNTDOWN_LEN: usize = 5;

const COUNTDOWN_STEP_MS: u64 = 1000;

/// The fixed "Ready? 3 2 1 Fight!" preamble.
pub fn countdown() -> Vec<Move> {
    ["Ready?", "3", "2", "1", "Fight!"]
        .into_iter()
        .map(|text| Move::new(text, COUNTDOWN_STEP_MS).with_tilt(Direction::Pulse, 0.0))
        .collect()
}

/// Where a combo landed inside the flat sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboSpan {
    pub name: String,
    pub start: usize,
    pub len: usize,
    pub level: u32,
}

impl ComboSpan {
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.start + self.len
    }
}

/// Countdown followed by every combo's moves, in order.
///
/// Always holds at least one move after the countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveSequence {
    moves: Vec<Move>,
    spans: Vec<ComboSpan>,
}

/// Flatten combos behind the countdown.
///
/// Fails with [`FightError::EmptySequence`] when there is nothing to loop over.
pub fn build(combos: &[Combo]) -> Result<MoveSequence, FightError> {
    let mut moves = countdown();
    let mut spans = Vec::with_capacity(combos.len());
    for combo in combos {
        if combo.moves.is_empty() {
            continue;
        }
        spans.push(ComboSpan {
            name: combo.name.clone(),
            start: moves.len(),
            len: combo.moves.len(),
            level: combo.level,
        });
        moves.extend(combo.moves.iter().cloned());
    }
    if moves.len() == COUNTDOWN_LEN {
        return Err(FightError::EmptySequence);
    }
    Ok(MoveSequence { moves, spans })
}

impl MoveSequence {
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Length of the looping part after the countdown.
    pub fn body_len(&self) -> usize {
        self.moves.len().saturating_sub(COUNTDOWN_LEN)
    }

    pub fn get(&self, index: usize) -> Option<&Move> {
        self.moves.get(index)
    }

    pub fn combo_spans(&self) -> &[ComboSpan] {
        &self.spans
    }

    /// The combo the move at `index` belongs to, if it is past the countdown.
    pub fn combo_at(&self, index: usize) -> Option<&ComboSpan> {
        self.spans.iter().find(|span| span.contains(index))
    }

    /// Same sequence mirrored for `stance`. Combo boundaries are unchanged.
    pub fn with_stance(&self, stance: Stance) -> MoveSequence {
        MoveSequence {
            moves: transform_all(&self.moves, stance),
            spans: self.spans.clone(),
        }
    }
}
