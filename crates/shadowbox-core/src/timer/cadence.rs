use serde::{Deserialize, Serialize};

use crate::moves::{clamp_display_ms, effective_speed, Move};

/// Deadline timer for the move currently on display.
///
/// Runs independently of the session clock. While held (paused, or resting
/// when moves are configured to stop during rest) it remembers how much of
/// the current move was left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveCadence {
    speed_multiplier: f64,
    deadline_ms: Option<u64>,
    held_remaining_ms: Option<u64>,
}

impl MoveCadence {
    pub fn new(speed_multiplier: f64) -> Self {
        Self {
            speed_multiplier: effective_speed(speed_multiplier),
            deadline_ms: None,
            held_remaining_ms: None,
        }
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn is_held(&self) -> bool {
        self.held_remaining_ms.is_some()
    }

    /// Put `mv` on display starting at `now_ms`.
    pub fn schedule(&mut self, now_ms: u64, mv: &Move) {
        let scaled = mv.scaled_pause_ms(self.speed_multiplier);
        if self.is_held() {
            self.held_remaining_ms = Some(scaled);
        } else {
            self.deadline_ms = Some(now_ms.saturating_add(scaled));
        }
    }

    /// Time the current move still has on screen, held or not.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.deadline_ms
            .map(|deadline| deadline.saturating_sub(now_ms))
            .or(self.held_remaining_ms)
    }

    /// Whether the current move has been shown long enough.
    pub fn is_due(&self, now_ms: u64) -> bool {
        matches!(self.deadline_ms, Some(deadline) if now_ms >= deadline)
    }

    /// Stop the countdown to the next move, keeping what is left.
    pub fn hold(&mut self, now_ms: u64) {
        if let Some(deadline) = self.deadline_ms.take() {
            self.held_remaining_ms = Some(deadline.saturating_sub(now_ms));
        }
    }

    /// Continue after `hold`.
    pub fn release(&mut self, now_ms: u64) {
        if let Some(remaining) = self.held_remaining_ms.take() {
            self.deadline_ms = Some(now_ms.saturating_add(remaining));
        }
    }

    /// Change speed. The move on display keeps its progress: its remaining
    /// time is rescaled by `old / new`.
    pub fn set_speed(&mut self, now_ms: u64, speed_multiplier: f64) {
        let new = effective_speed(speed_multiplier);
        let ratio = self.speed_multiplier / new;
        if let Some(deadline) = self.deadline_ms {
            let remaining = deadline.saturating_sub(now_ms);
            self.deadline_ms = Some(now_ms.saturating_add(rescale(remaining, ratio)));
        }
        if let Some(remaining) = self.held_remaining_ms {
            self.held_remaining_ms = Some(rescale(remaining, ratio));
        }
        self.speed_multiplier = new;
    }

    /// Drop any pending move transition.
    pub fn cancel(&mut self) {
        self.deadline_ms = None;
        self.held_remaining_ms = None;
    }
}

fn rescale(remaining_ms: u64, ratio: f64) -> u64 {
    if remaining_ms == 0 {
        return 0;
    }
    clamp_display_ms(remaining_ms as f64 * ratio)
}
