//! Round/rest session clock.
//!
//! A wall-clock-based state machine. It owns no timer; the caller invokes
//! `tick()` periodically (every 100 ms in the session driver) and passes the
//! current time in.
//!
//! ## State Transitions
//!
//! ```text
//! Idle(paused) -> Round(0) -> Rest -> Round(1) -> ... -> Round(n-1) -> GameOver
//! ```
//!
//! Time left is always derived from the anchor set when the phase started
//! (or was last resumed), never by decrementing per tick, so late or missed
//! ticks cannot make the clock drift.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSettings {
    pub round_duration_ms: u64,
    pub rest_duration_ms: u64,
    pub total_rounds: u32,
}

impl ClockSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.total_rounds == 0 {
            return Err(ValidationError::ZeroRounds);
        }
        if self.round_duration_ms == 0 {
            return Err(ValidationError::InvalidValue {
                field: "round_duration_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            round_duration_ms: 180_000,
            rest_duration_ms: 60_000,
            total_rounds: 3,
        }
    }
}

/// Read-only view of the clock for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub current_round: u32,
    pub total_rounds: u32,
    pub is_rest_period: bool,
    pub time_left_ms: u64,
    pub is_paused: bool,
    pub is_game_over: bool,
}

/// Phase boundary crossed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// A round finished and rest began.
    RoundEnded { completed_rounds: u32 },
    /// Rest finished; `round` (zero-based) is starting.
    RestEnded { round: u32 },
    /// The last round finished. Terminal.
    GameOver { completed_rounds: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClock {
    settings: ClockSettings,
    current_round: u32,
    is_rest_period: bool,
    /// Time left as last computed.
    time_left_ms: u64,
    /// Time left at the moment `anchor_ms` was taken.
    time_left_at_anchor_ms: u64,
    /// Set while running; `None` while paused or over.
    anchor_ms: Option<u64>,
    is_game_over: bool,
}

impl SessionClock {
    /// Create a paused clock at the start of round 0.
    pub fn new(settings: ClockSettings) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self {
            settings,
            current_round: 0,
            is_rest_period: false,
            time_left_ms: settings.round_duration_ms,
            time_left_at_anchor_ms: settings.round_duration_ms,
            anchor_ms: None,
            is_game_over: false,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn is_rest_period(&self) -> bool {
        self.is_rest_period
    }

    pub fn time_left_ms(&self) -> u64 {
        self.time_left_ms
    }

    pub fn is_paused(&self) -> bool {
        self.anchor_ms.is_none()
    }

    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    /// Rounds fully fought so far.
    pub fn completed_rounds(&self) -> u32 {
        if self.is_game_over {
            self.settings.total_rounds
        } else {
            self.current_round
        }
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            current_round: self.current_round,
            total_rounds: self.settings.total_rounds,
            is_rest_period: self.is_rest_period,
            time_left_ms: self.time_left_ms,
            is_paused: self.is_paused(),
            is_game_over: self.is_game_over,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume. Returns false when nothing changed.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        if self.is_game_over || self.anchor_ms.is_some() {
            return false;
        }
        self.time_left_at_anchor_ms = self.time_left_ms;
        self.anchor_ms = Some(now_ms);
        true
    }

    /// Freeze the clock. Time spent paused is never counted.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        if self.is_game_over || self.anchor_ms.is_none() {
            return false;
        }
        self.flush_elapsed(now_ms);
        self.anchor_ms = None;
        true
    }

    /// Flip between paused and running. Returns the new paused state.
    pub fn toggle_pause(&mut self, now_ms: u64) -> bool {
        if self.is_paused() {
            self.resume(now_ms);
        } else {
            self.pause(now_ms);
        }
        self.is_paused()
    }

    /// Back to the initial paused state at round 0.
    pub fn reset(&mut self) {
        self.current_round = 0;
        self.is_rest_period = false;
        self.time_left_ms = self.settings.round_duration_ms;
        self.time_left_at_anchor_ms = self.settings.round_duration_ms;
        self.anchor_ms = None;
        self.is_game_over = false;
    }

    /// Recompute time left and cross every phase boundary that `now_ms`
    /// has passed. More than one event comes back only after a gap longer
    /// than a whole phase.
    pub fn tick(&mut self, now_ms: u64) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        let Some(mut anchor) = self.anchor_ms else {
            return events;
        };
        if self.is_game_over {
            return events;
        }

        let mut elapsed = now_ms.saturating_sub(anchor);
        while elapsed >= self.time_left_at_anchor_ms {
            // The phase ended at `anchor + time_left_at_anchor`; carry the rest over.
            anchor += self.time_left_at_anchor_ms;
            elapsed -= self.time_left_at_anchor_ms;

            let event = self.end_phase();
            events.push(event);
            if self.is_game_over {
                self.anchor_ms = None;
                self.time_left_ms = 0;
                return events;
            }
            self.time_left_at_anchor_ms = self.time_left_ms;
        }

        self.anchor_ms = Some(anchor);
        self.time_left_ms = self.time_left_at_anchor_ms - elapsed;
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self, now_ms: u64) {
        if let Some(anchor) = self.anchor_ms {
            let elapsed = now_ms.saturating_sub(anchor);
            self.time_left_ms = self.time_left_at_anchor_ms.saturating_sub(elapsed);
        }
    }

    fn end_phase(&mut self) -> ClockEvent {
        if self.is_rest_period {
            self.is_rest_period = false;
            self.time_left_ms = self.settings.round_duration_ms;
            debug!(round = self.current_round, "rest over");
            ClockEvent::RestEnded {
                round: self.current_round,
            }
        } else if self.current_round + 1 < self.settings.total_rounds {
            self.current_round += 1;
            self.is_rest_period = true;
            self.time_left_ms = self.settings.rest_duration_ms;
            debug!(completed = self.current_round, "round over, resting");
            ClockEvent::RoundEnded {
                completed_rounds: self.current_round,
            }
        } else {
            self.is_game_over = true;
            debug!(rounds = self.settings.total_rounds, "final round over");
            ClockEvent::GameOver {
                completed_rounds: self.settings.total_rounds,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(round: u64, rest: u64, rounds: u32) -> ClockSettings {
        ClockSettings {
            round_duration_ms: round,
            rest_duration_ms: rest,
            total_rounds: rounds,
        }
    }

    #[test]
    fn starts_paused_at_round_zero() {
        let clock = SessionClock::new(ClockSettings::default()).unwrap();
        let snap = clock.snapshot();
        assert_eq!(snap.current_round, 0);
        assert!(!snap.is_rest_period);
        assert_eq!(snap.time_left_ms, 180_000);
        assert!(snap.is_paused);
        assert!(!snap.is_game_over);
    }

    #[test]
    fn zero_rounds_is_rejected() {
        assert_eq!(
            SessionClock::new(settings(1000, 0, 0)).unwrap_err(),
            ValidationError::ZeroRounds
        );
    }

    #[test]
    fn zero_round_duration_is_rejected() {
        assert!(SessionClock::new(settings(0, 1000, 2)).is_err());
    }

    #[test]
    fn tick_while_paused_does_nothing() {
        let mut clock = SessionClock::new(settings(1000, 500, 2)).unwrap();
        assert!(clock.tick(5_000).is_empty());
        assert_eq!(clock.time_left_ms(), 1000);
    }

    #[test]
    fn time_left_follows_wall_clock_not_tick_count() {
        let mut clock = SessionClock::new(settings(10_000, 500, 2)).unwrap();
        clock.resume(0);
        clock.tick(100);
        clock.tick(250);
        // one late tick instead of many
        clock.tick(3_000);
        assert_eq!(clock.time_left_ms(), 7_000);
    }

    #[test]
    fn round_then_rest_then_next_round() {
        let mut clock = SessionClock::new(settings(1000, 500, 2)).unwrap();
        clock.resume(0);
        assert_eq!(
            clock.tick(1000),
            vec![ClockEvent::RoundEnded { completed_rounds: 1 }]
        );
        assert!(clock.is_rest_period());
        assert!(!clock.is_paused());
        assert_eq!(clock.current_round(), 1);
        assert_eq!(clock.time_left_ms(), 500);

        assert_eq!(clock.tick(1500), vec![ClockEvent::RestEnded { round: 1 }]);
        assert!(!clock.is_rest_period());
        assert_eq!(clock.time_left_ms(), 1000);

        assert_eq!(
            clock.tick(2500),
            vec![ClockEvent::GameOver { completed_rounds: 2 }]
        );
        assert!(clock.is_game_over());
        assert!(clock.is_paused());
    }

    #[test]
    fn single_round_ends_the_game_without_rest() {
        let mut clock = SessionClock::new(settings(180_000, 60_000, 1)).unwrap();
        clock.resume(0);
        assert!(clock.tick(179_900).is_empty());
        assert_eq!(
            clock.tick(180_000),
            vec![ClockEvent::GameOver { completed_rounds: 1 }]
        );
        let snap = clock.snapshot();
        assert!(snap.is_game_over);
        assert!(snap.is_paused);
        assert!(!snap.is_rest_period);
        assert_eq!(snap.time_left_ms, 0);
    }

    #[test]
    fn game_over_is_terminal() {
        let mut clock = SessionClock::new(settings(100, 100, 1)).unwrap();
        clock.resume(0);
        clock.tick(100);
        assert!(!clock.resume(200));
        assert!(clock.tick(10_000).is_empty());
        assert!(clock.is_game_over());
    }

    #[test]
    fn three_rounds_end_after_rounds_plus_two_rests() {
        let mut clock = SessionClock::new(settings(3_000, 1_000, 3)).unwrap();
        clock.resume(0);
        let end = 3 * 3_000 + 2 * 1_000;
        let mut now = 0;
        while now < end - 100 {
            now += 100;
            clock.tick(now);
            assert!(!clock.is_game_over(), "game over early at {now}");
        }
        clock.tick(end);
        assert!(clock.is_game_over());
    }

    #[test]
    fn paused_time_is_not_counted() {
        let mut clock = SessionClock::new(settings(10_000, 1_000, 1)).unwrap();
        clock.resume(0);
        clock.tick(2_000);
        clock.pause(2_500);
        assert_eq!(clock.time_left_ms(), 7_500);
        // a long background pause
        clock.resume(900_000);
        clock.tick(900_400);
        assert_eq!(clock.time_left_ms(), 7_100);
    }

    #[test]
    fn toggle_pause_flips_state() {
        let mut clock = SessionClock::new(settings(1000, 100, 1)).unwrap();
        assert!(!clock.toggle_pause(0));
        assert!(clock.toggle_pause(10));
        assert!(!clock.toggle_pause(20));
    }

    #[test]
    fn long_gap_catches_up_through_phases() {
        let mut clock = SessionClock::new(settings(1_000, 500, 3)).unwrap();
        clock.resume(0);
        // 1000 round + 500 rest + 300 into round 1
        let events = clock.tick(1_800);
        assert_eq!(
            events,
            vec![
                ClockEvent::RoundEnded { completed_rounds: 1 },
                ClockEvent::RestEnded { round: 1 },
            ]
        );
        assert_eq!(clock.time_left_ms(), 700);
        assert_eq!(clock.current_round(), 1);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut clock = SessionClock::new(settings(1_000, 500, 2)).unwrap();
        clock.resume(0);
        clock.tick(1_200);
        clock.reset();
        let snap = clock.snapshot();
        assert_eq!(snap.current_round, 0);
        assert!(snap.is_paused);
        assert!(!snap.is_rest_period);
        assert_eq!(snap.time_left_ms, 1_000);
    }
}
