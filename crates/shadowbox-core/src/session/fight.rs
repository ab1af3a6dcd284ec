//! Fight session: the move cursor and its cadence coupled to the session clock.
//!
//! Like the clock it wraps, a session owns no timer. The host calls `tick()`
//! every 100 ms and whenever the current move's deadline passes (see
//! [`next_deadline_ms`](FightSession::next_deadline_ms)); the session driver
//! does exactly that.
//!
//! ## State Transitions
//!
//! ```text
//! Ready -> Running <-> Paused
//!             |           |
//!             v           v
//!          GameOver    Stopped
//! ```
//!
//! Moves cycle on their own cadence and do not care about round boundaries:
//! the cursor is never reset by a rest period. Game over and stop are
//! terminal; every command afterwards is a no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FightError, Result};
use crate::events::Event;
use crate::moves::{build, effective_speed, Combo, ComboSpan, Move, MoveSequence, Stance};
use crate::observable::Observable;
use crate::service::{FightGenerator, FightRequest};
use crate::storage::{NewFight, Preferences};
use crate::timer::{
    Clock, ClockEvent, ClockSettings, ClockSnapshot, CursorPosition, MoveCadence, MoveCursor,
    SessionClock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Built but not started.
    Ready,
    Running,
    Paused,
    GameOver,
    Stopped,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::GameOver | SessionState::Stopped)
    }
}

/// How a session plays, independent of what it plays.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub clock: ClockSettings,
    pub speed_multiplier: f64,
    pub stance: Stance,
    /// Hold the move cadence while resting. Off: moves keep cycling.
    pub pause_moves_during_rest: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            clock: ClockSettings::default(),
            speed_multiplier: 1.0,
            stance: Stance::Orthodox,
            pause_moves_during_rest: false,
        }
    }
}

impl SessionOptions {
    /// Timing from `clock`, stance and speed from the user's preferences.
    pub fn from_preferences(clock: ClockSettings, prefs: &Preferences) -> Self {
        Self {
            clock,
            speed_multiplier: prefs.effective_speed(),
            stance: prefs.stance,
            pause_moves_during_rest: false,
        }
    }

    pub fn pause_moves_during_rest(mut self, enabled: bool) -> Self {
        self.pause_moves_during_rest = enabled;
        self
    }
}

/// What a finished (or abandoned) session amounted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightSummary {
    pub session_id: Uuid,
    pub total_rounds: u32,
    pub rounds_completed: u32,
    /// Reached game over rather than being stopped.
    pub completed: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub combos: Vec<String>,
}

impl FightSummary {
    /// History row for this fight. `None` if it never started or is still
    /// running.
    pub fn to_new_fight<'a>(&self, category: &'a str, difficulty: &'a str) -> Option<NewFight<'a>> {
        Some(NewFight {
            category,
            difficulty,
            total_rounds: self.total_rounds,
            rounds_completed: self.rounds_completed,
            completed: self.completed,
            started_at: self.started_at?,
            ended_at: self.ended_at?,
        })
    }
}

pub struct FightSession<C: Clock> {
    id: Uuid,
    clock: C,
    /// Sequence as delivered, before any stance transform.
    base: MoveSequence,
    /// Sequence actually played.
    sequence: MoveSequence,
    stance: Stance,
    cursor: MoveCursor,
    cadence: MoveCadence,
    session_clock: SessionClock,
    pause_moves_during_rest: bool,
    current_move: Observable<Option<Move>>,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    fights_left: Option<u32>,
}

impl<C: Clock> FightSession<C> {
    pub fn new(sequence: MoveSequence, options: SessionOptions, clock: C) -> Result<Self> {
        let session_clock = SessionClock::new(options.clock)?;
        let played = sequence.with_stance(options.stance);
        Ok(Self {
            id: Uuid::new_v4(),
            clock,
            cursor: MoveCursor::new(played.len()),
            sequence: played,
            base: sequence,
            stance: options.stance,
            cadence: MoveCadence::new(options.speed_multiplier),
            session_clock,
            pause_moves_during_rest: options.pause_moves_during_rest,
            current_move: Observable::new(None),
            state: SessionState::Ready,
            started_at: None,
            ended_at: None,
            fights_left: None,
        })
    }

    /// Build the sequence from `combos` first. Fails with
    /// [`FightError::EmptySequence`] when they hold no moves.
    pub fn from_combos(combos: &[Combo], options: SessionOptions, clock: C) -> Result<Self> {
        let sequence = build(combos)?;
        Self::new(sequence, options, clock)
    }

    /// Fetch combos from `generator` and build a session around them.
    ///
    /// Nothing is started: on error there is no session, and on success the
    /// caller still has to call [`start`](Self::start).
    pub async fn prepare<G: FightGenerator>(
        generator: &G,
        request: &FightRequest,
        options: SessionOptions,
        clock: C,
    ) -> Result<Self> {
        let response = generator.generate(request).await.map_err(|e| {
            warn!(generator = generator.name(), error = %e, "fight generation failed");
            e
        })?;
        if response.is_quota_exhausted() {
            warn!(generator = generator.name(), "no fights left");
            return Err(FightError::NoFightsLeft.into());
        }
        let mut session = Self::from_combos(&response.combos, options, clock)?;
        session.fights_left = response.fights_left;
        debug!(
            generator = generator.name(),
            moves = session.sequence.body_len(),
            "fight prepared"
        );
        Ok(session)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Sequence being played, with the current stance applied.
    pub fn sequence(&self) -> &MoveSequence {
        &self.sequence
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.cadence.speed_multiplier()
    }

    pub fn cursor_position(&self) -> CursorPosition {
        self.cursor.position()
    }

    pub fn clock_snapshot(&self) -> ClockSnapshot {
        self.session_clock.snapshot()
    }

    /// Remaining quota reported by the generator, if any.
    pub fn fights_left(&self) -> Option<u32> {
        self.fights_left
    }

    pub fn current_move(&self) -> Option<Move> {
        self.current_move.get()
    }

    /// The move on display as an observable, for hosts that prefer callbacks.
    pub fn current_move_observable(&self) -> &Observable<Option<Move>> {
        &self.current_move
    }

    /// Combo the move on display belongs to.
    pub fn current_combo(&self) -> Option<&ComboSpan> {
        self.cursor
            .current_index()
            .and_then(|index| self.sequence.combo_at(index))
    }

    pub fn combo_names(&self) -> impl Iterator<Item = &str> {
        self.sequence.combo_spans().iter().map(|span| span.name.as_str())
    }

    /// When `tick()` next has a move to advance, in clock milliseconds.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        match self.state {
            SessionState::Running => self.cadence.deadline_ms(),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            clock: self.session_clock.snapshot(),
            cursor: self.cursor.position(),
            current_move: self.current_move().map(|mv| mv.text),
            speed_multiplier: self.cadence.speed_multiplier(),
            stance: self.stance,
            at: Utc::now(),
        }
    }

    pub fn summary(&self) -> FightSummary {
        FightSummary {
            session_id: self.id,
            total_rounds: self.session_clock.settings().total_rounds,
            rounds_completed: self.session_clock.completed_rounds(),
            completed: self.state == SessionState::GameOver,
            started_at: self.started_at,
            ended_at: self.ended_at,
            combos: self.combo_names().map(str::to_string).collect(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the clock and show the first countdown move.
    pub fn start(&mut self) -> Vec<Event> {
        if self.state != SessionState::Ready {
            return Vec::new();
        }
        let now = self.now_ms();
        self.session_clock.resume(now);
        self.state = SessionState::Running;
        self.started_at = Some(Utc::now());

        let settings = *self.session_clock.settings();
        info!(
            session = %self.id,
            rounds = settings.total_rounds,
            moves = self.sequence.body_len(),
            "fight started"
        );
        let mut events = vec![Event::SessionStarted {
            session_id: self.id,
            total_rounds: settings.total_rounds,
            round_duration_ms: settings.round_duration_ms,
            rest_duration_ms: settings.rest_duration_ms,
            at: Utc::now(),
        }];
        if let Some(index) = self.cursor.reset() {
            events.extend(self.show(index, now));
        }
        events
    }

    /// Advance the clock, then the move on display.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.state != SessionState::Running {
            return Vec::new();
        }
        let now = self.now_ms();
        let mut events = Vec::new();

        for clock_event in self.session_clock.tick(now) {
            match clock_event {
                ClockEvent::RoundEnded { completed_rounds } => {
                    if self.pause_moves_during_rest {
                        self.cadence.hold(now);
                    }
                    events.push(Event::RoundEnded {
                        completed_rounds,
                        total_rounds: self.session_clock.settings().total_rounds,
                        at: Utc::now(),
                    });
                }
                ClockEvent::RestEnded { round } => {
                    if self.pause_moves_during_rest {
                        self.cadence.release(now);
                    }
                    events.push(Event::RestEnded {
                        round,
                        at: Utc::now(),
                    });
                }
                ClockEvent::GameOver { completed_rounds } => {
                    self.cadence.cancel();
                    self.state = SessionState::GameOver;
                    self.ended_at = Some(Utc::now());
                    info!(session = %self.id, completed_rounds, "game over");
                    events.push(Event::GameOver {
                        completed_rounds,
                        at: Utc::now(),
                    });
                    return events;
                }
            }
        }

        if self.cadence.is_due(now) {
            if let Some(index) = self.cursor.advance() {
                events.extend(self.show(index, now));
            }
        }
        events
    }

    /// Freeze both the clock and the move on display.
    pub fn pause(&mut self) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        let now = self.now_ms();
        self.session_clock.pause(now);
        self.cadence.hold(now);
        self.state = SessionState::Paused;
        debug!(session = %self.id, "paused");
        Some(Event::SessionPaused {
            time_left_ms: self.session_clock.time_left_ms(),
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != SessionState::Paused {
            return None;
        }
        let now = self.now_ms();
        self.session_clock.resume(now);
        if !self.moves_held_for_rest() {
            self.cadence.release(now);
        }
        self.state = SessionState::Running;
        debug!(session = %self.id, "resumed");
        Some(Event::SessionResumed {
            time_left_ms: self.session_clock.time_left_ms(),
            at: Utc::now(),
        })
    }

    pub fn toggle_pause(&mut self) -> Option<Event> {
        match self.state {
            SessionState::Running => self.pause(),
            SessionState::Paused => self.resume(),
            _ => None,
        }
    }

    /// Change playback speed. The move on display keeps its progress.
    pub fn set_speed(&mut self, speed_multiplier: f64) -> Option<Event> {
        if self.state.is_terminal() {
            return None;
        }
        self.cadence.set_speed(self.now_ms(), speed_multiplier);
        let applied = effective_speed(speed_multiplier);
        debug!(session = %self.id, speed = applied, "speed changed");
        Some(Event::SpeedChanged {
            speed_multiplier: applied,
            at: Utc::now(),
        })
    }

    /// Re-mirror the sequence. The move on display is re-emitted in the new
    /// stance without restarting its timer.
    pub fn set_stance(&mut self, stance: Stance) -> Vec<Event> {
        if self.state.is_terminal() || stance == self.stance {
            return Vec::new();
        }
        self.stance = stance;
        self.sequence = self.base.with_stance(stance);

        let mut events = vec![Event::StanceChanged {
            stance,
            at: Utc::now(),
        }];
        if let Some(index) = self.cursor.current_index() {
            let now = self.now_ms();
            if let Some(mv) = self.sequence.get(index).cloned() {
                let display_ms = self
                    .cadence
                    .remaining_ms(now)
                    .unwrap_or_else(|| mv.scaled_pause_ms(self.cadence.speed_multiplier()));
                events.push(self.publish(index, mv, display_ms));
            }
        }
        events
    }

    /// Tear down. Both timers are cancelled; nothing is produced afterwards.
    pub fn stop(&mut self) -> Option<Event> {
        if self.state.is_terminal() {
            return None;
        }
        let now = self.now_ms();
        self.session_clock.pause(now);
        self.cadence.cancel();
        self.state = SessionState::Stopped;
        self.ended_at = Some(Utc::now());
        let completed_rounds = self.session_clock.completed_rounds();
        info!(session = %self.id, completed_rounds, "fight stopped");
        Some(Event::SessionStopped {
            completed_rounds,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn moves_held_for_rest(&self) -> bool {
        self.pause_moves_during_rest && self.session_clock.is_rest_period()
    }

    /// Put the move at `index` on display and schedule the next one.
    fn show(&mut self, index: usize, now: u64) -> Option<Event> {
        let mv = self.sequence.get(index)?.clone();
        self.cadence.schedule(now, &mv);
        let display_ms = mv.scaled_pause_ms(self.cadence.speed_multiplier());
        Some(self.publish(index, mv, display_ms))
    }

    fn publish(&self, index: usize, mv: Move, display_ms: u64) -> Event {
        self.current_move.set(Some(mv.clone()));
        Event::MoveChanged {
            index,
            countdown: matches!(self.cursor.position(), CursorPosition::Countdown(_)),
            combo: self.sequence.combo_at(index).map(|span| span.name.clone()),
            current: mv,
            display_ms,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MAX_DISPLAY_MS;
    use crate::service::FightResponse;
    use crate::timer::ManualClock;
    use crate::CoreError;
    use std::future::Future;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn combo(name: &str, moves: &[(&str, u64)]) -> Combo {
        Combo::new(
            name,
            moves.iter().map(|(text, ms)| Move::new(*text, *ms)).collect(),
        )
    }

    fn options(round_ms: u64, rest_ms: u64, rounds: u32) -> SessionOptions {
        SessionOptions {
            clock: ClockSettings {
                round_duration_ms: round_ms,
                rest_duration_ms: rest_ms,
                total_rounds: rounds,
            },
            ..SessionOptions::default()
        }
    }

    fn session_with(combos: &[Combo], opts: SessionOptions) -> (FightSession<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let session = FightSession::from_combos(combos, opts, clock.clone()).unwrap();
        (session, clock)
    }

    /// Tick every 100 ms until the clock reads `until_ms`.
    fn run_until(
        session: &mut FightSession<ManualClock>,
        clock: &ManualClock,
        until_ms: u64,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        while clock.now_ms() < until_ms {
            clock.advance(100);
            events.extend(session.tick());
        }
        events
    }

    fn moved_to(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::MoveChanged { current, .. } => Some(current.text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_shows_first_countdown_move() {
        let (mut session, _clock) = session_with(&[combo("A", &[("JAB", 500)])], options(180_000, 60_000, 3));
        let events = session.start();
        assert!(matches!(events[0], Event::SessionStarted { total_rounds: 3, .. }));
        assert_eq!(moved_to(&events), vec!["Ready?"]);
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.next_deadline_ms(), Some(1_000));
        assert!(session.start().is_empty());
    }

    #[test]
    fn countdown_then_body_loops() {
        let (mut session, clock) = session_with(
            &[combo("A", &[("m1", 500), ("m2", 600)])],
            options(180_000, 60_000, 3),
        );
        session.start();
        let mut shown = Vec::new();
        for _ in 0..4 {
            clock.advance(1_000);
            shown.extend(moved_to(&session.tick()));
        }
        assert_eq!(shown, vec!["3", "2", "1", "Fight!"]);

        clock.advance(1_000);
        assert_eq!(moved_to(&session.tick()), vec!["m1"]);
        assert_eq!(session.cursor_position(), CursorPosition::Looping(5));
        assert_eq!(session.current_combo().map(|c| c.name.as_str()), Some("A"));

        clock.advance(500);
        assert_eq!(moved_to(&session.tick()), vec!["m2"]);
        clock.advance(600);
        assert_eq!(moved_to(&session.tick()), vec!["m1"]);
        assert_eq!(session.cursor_position(), CursorPosition::Looping(5));
    }

    #[test]
    fn no_move_before_its_deadline() {
        let (mut session, clock) = session_with(&[combo("A", &[("m1", 500)])], options(180_000, 60_000, 3));
        session.start();
        clock.advance(999);
        assert!(session.tick().is_empty());
        clock.advance(1);
        assert_eq!(moved_to(&session.tick()), vec!["3"]);
    }

    #[test]
    fn single_round_ends_in_game_over_without_rest() {
        let (mut session, clock) = session_with(&[combo("A", &[("m1", 500)])], options(180_000, 60_000, 1));
        session.start();
        clock.set(179_999);
        let events = session.tick();
        assert!(!events.iter().any(|e| e.is_terminal()));

        clock.set(180_000);
        let events = session.tick();
        assert!(matches!(events.last(), Some(Event::GameOver { completed_rounds: 1, .. })));
        assert!(!events.iter().any(|e| matches!(e, Event::RoundEnded { .. })));

        let snap = session.clock_snapshot();
        assert!(snap.is_game_over);
        assert!(snap.is_paused);
        assert_eq!(session.next_deadline_ms(), None);

        clock.advance(10_000);
        assert!(session.tick().is_empty());
        assert!(session.pause().is_none());
        assert!(session.stop().is_none());
    }

    #[test]
    fn three_rounds_take_three_rounds_and_two_rests() {
        let (mut session, clock) = session_with(&[combo("A", &[("m1", 700)])], options(3_000, 1_000, 3));
        session.start();
        let mut phases = Vec::new();
        for _ in 0..110 {
            clock.advance(100);
            for event in session.tick() {
                match event {
                    Event::RoundEnded { completed_rounds, .. } => {
                        phases.push(format!("round {completed_rounds} @{}", clock.now_ms()))
                    }
                    Event::RestEnded { round, .. } => {
                        phases.push(format!("rest->{round} @{}", clock.now_ms()))
                    }
                    Event::GameOver { .. } => phases.push(format!("over @{}", clock.now_ms())),
                    _ => {}
                }
            }
        }
        assert_eq!(
            phases,
            vec![
                "round 1 @3000",
                "rest->1 @4000",
                "round 2 @7000",
                "rest->2 @8000",
                "over @11000",
            ]
        );
        assert!(session.summary().completed);
        assert_eq!(session.summary().rounds_completed, 3);
    }

    #[test]
    fn moves_keep_cycling_through_rest_by_default() {
        let (mut session, clock) = session_with(&[combo("A", &[("m1", 500)])], options(6_000, 2_000, 2));
        session.start();
        run_until(&mut session, &clock, 5_900);
        let events = run_until(&mut session, &clock, 6_000);
        assert!(events.iter().any(|e| matches!(e, Event::RoundEnded { .. })));
        assert!(session.clock_snapshot().is_rest_period);

        let during_rest = run_until(&mut session, &clock, 7_900);
        assert_eq!(moved_to(&during_rest).len(), 3);
        assert_eq!(session.cursor_position(), CursorPosition::Looping(5));
    }

    #[test]
    fn moves_can_hold_during_rest() {
        let opts = options(6_000, 2_000, 2).pause_moves_during_rest(true);
        let (mut session, clock) = session_with(&[combo("A", &[("m1", 500)])], opts);
        session.start();
        run_until(&mut session, &clock, 5_900);

        let events = run_until(&mut session, &clock, 6_000);
        assert!(events.iter().any(|e| matches!(e, Event::RoundEnded { .. })));
        assert!(moved_to(&events).is_empty());
        assert_eq!(session.next_deadline_ms(), None);

        assert!(moved_to(&run_until(&mut session, &clock, 7_900)).is_empty());

        let events = run_until(&mut session, &clock, 8_000);
        assert!(events.iter().any(|e| matches!(e, Event::RestEnded { round: 1, .. })));
        assert_eq!(moved_to(&events), vec!["m1"]);
        assert_eq!(session.next_deadline_ms(), Some(8_500));
    }

    #[test]
    fn pausing_during_held_rest_keeps_moves_held() {
        let opts = options(6_000, 2_000, 2).pause_moves_during_rest(true);
        let (mut session, clock) = session_with(&[combo("A", &[("m1", 500)])], opts);
        session.start();
        run_until(&mut session, &clock, 6_500);
        session.pause();
        clock.advance(30_000);
        session.resume();
        assert_eq!(session.next_deadline_ms(), None);
    }

    #[test]
    fn paused_time_never_counts() {
        let (mut session, clock) = session_with(&[combo("A", &[("m1", 500)])], options(10_000, 1_000, 1));
        session.start();
        run_until(&mut session, &clock, 2_500);
        let paused = session.pause();
        assert!(matches!(paused, Some(Event::SessionPaused { time_left_ms: 7_500, .. })));
        assert_eq!(session.next_deadline_ms(), None);

        clock.set(500_000);
        assert!(session.tick().is_empty());
        let resumed = session.resume();
        assert!(matches!(resumed, Some(Event::SessionResumed { time_left_ms: 7_500, .. })));
        // "2" went up at 2000 and still had 500 ms left when paused
        assert_eq!(session.next_deadline_ms(), Some(500_500));

        clock.set(507_499);
        assert!(!session.tick().iter().any(|e| e.is_terminal()));
        clock.set(507_500);
        assert!(session.tick().iter().any(|e| e.is_terminal()));
    }

    #[test]
    fn toggle_pause_flips() {
        let (mut session, _clock) = session_with(&[combo("A", &[("m1", 500)])], options(10_000, 1_000, 1));
        assert!(session.toggle_pause().is_none());
        session.start();
        assert!(matches!(session.toggle_pause(), Some(Event::SessionPaused { .. })));
        assert!(matches!(session.toggle_pause(), Some(Event::SessionResumed { .. })));
    }

    #[test]
    fn speed_change_rescales_move_on_display() {
        let (mut session, clock) = session_with(
            &[combo("A", &[("m1", 500), ("m2", 600)])],
            options(180_000, 60_000, 1),
        );
        session.start();
        run_until(&mut session, &clock, 5_000);
        assert_eq!(session.current_move().map(|m| m.text), Some("m1".into()));

        clock.set(5_250);
        let event = session.set_speed(2.0);
        assert!(matches!(event, Some(Event::SpeedChanged { speed_multiplier, .. }) if speed_multiplier == 2.0));
        assert_eq!(session.next_deadline_ms(), Some(5_375));

        clock.set(5_374);
        assert!(session.tick().is_empty());
        clock.set(5_375);
        let events = session.tick();
        assert!(matches!(
            &events[..],
            [Event::MoveChanged { display_ms: 300, .. }]
        ));
    }

    #[test]
    fn extreme_timings_on_wall_clock_do_not_overflow() {
        let now = 1_700_000_000_000;
        let huge: Move = serde_json::from_str(r#"{"text":"SLIP","pauseTimeMs":18446744073709551615}"#).unwrap();
        let combos = vec![Combo::new("A", vec![huge])];

        let clock = ManualClock::new(now);
        let opts = SessionOptions {
            speed_multiplier: 1e-300,
            ..options(180_000, 60_000, 1)
        };
        let mut session = FightSession::from_combos(&combos, opts, clock.clone()).unwrap();
        session.start();
        assert_eq!(session.next_deadline_ms(), Some(now + MAX_DISPLAY_MS));

        session.set_speed(1.0);
        for _ in 0..5 {
            clock.set(session.next_deadline_ms().unwrap());
            session.tick();
        }
        assert_eq!(session.current_move().map(|m| m.text), Some("SLIP".into()));
        assert_eq!(session.next_deadline_ms(), Some(clock.now_ms() + MAX_DISPLAY_MS));

        session.set_speed(1e-300);
        clock.advance(100);
        assert!(session.tick().is_empty());
        assert!(session.next_deadline_ms().is_some_and(|d| d > clock.now_ms()));
    }

    #[test]
    fn invalid_speed_plays_at_normal_speed() {
        let (mut session, _clock) = session_with(&[combo("A", &[("m1", 500)])], options(10_000, 1_000, 1));
        let event = session.set_speed(0.0);
        assert!(matches!(event, Some(Event::SpeedChanged { speed_multiplier, .. }) if speed_multiplier == 1.0));
    }

    #[test]
    fn stance_change_remirrors_current_move() {
        let (mut session, clock) = session_with(
            &[combo("A", &[("LEFT HOOK", 800)])],
            options(180_000, 60_000, 1),
        );
        session.start();
        run_until(&mut session, &clock, 5_000);
        clock.set(5_300);
        let events = session.set_stance(Stance::Southpaw);
        assert!(matches!(events[0], Event::StanceChanged { stance: Stance::Southpaw, .. }));
        assert!(matches!(
            &events[1],
            Event::MoveChanged { current, display_ms: 500, .. } if current.text == "RIGHT HOOK"
        ));
        assert_eq!(session.next_deadline_ms(), Some(5_800));
        assert!(session.set_stance(Stance::Southpaw).is_empty());
    }

    #[test]
    fn stance_from_options_applies_before_start() {
        let opts = SessionOptions {
            stance: Stance::Southpaw,
            ..options(180_000, 60_000, 1)
        };
        let (session, _clock) = session_with(&[combo("A", &[("RIGHT UPPERCUT", 800)])], opts);
        assert_eq!(session.sequence().moves()[5].text, "LEFT UPPERCUT");
    }

    #[test]
    fn stop_is_terminal_and_silent_afterwards() {
        let (mut session, clock) = session_with(&[combo("A", &[("m1", 500)])], options(3_000, 1_000, 3));
        session.start();
        run_until(&mut session, &clock, 3_500);
        let stopped = session.stop();
        assert!(matches!(stopped, Some(Event::SessionStopped { completed_rounds: 1, .. })));

        clock.set(100_000);
        assert!(session.tick().is_empty());
        assert!(session.resume().is_none());
        assert!(session.set_speed(2.0).is_none());
        assert!(session.set_stance(Stance::Southpaw).is_empty());
        assert!(session.stop().is_none());
        assert_eq!(session.next_deadline_ms(), None);

        let summary = session.summary();
        assert!(!summary.completed);
        assert_eq!(summary.rounds_completed, 1);
        assert!(summary.to_new_fight("boxing", "beginner").is_some());
    }

    #[test]
    fn summary_of_unstarted_session_has_no_record() {
        let (session, _clock) = session_with(&[combo("A", &[("m1", 500)])], options(3_000, 1_000, 3));
        assert!(session.summary().to_new_fight("boxing", "beginner").is_none());
    }

    #[test]
    fn current_move_observable_follows_playback() {
        let (mut session, clock) = session_with(&[combo("A", &[("m1", 500)])], options(10_000, 1_000, 1));
        let changes = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&changes);
        session.current_move_observable().subscribe(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        session.start();
        clock.set(1_000);
        session.tick();
        assert_eq!(changes.load(Ordering::SeqCst), 2);
        assert_eq!(session.current_move().map(|m| m.text), Some("3".into()));
    }

    #[test]
    fn empty_combos_fail_to_build() {
        let err = FightSession::from_combos(&[], SessionOptions::default(), ManualClock::new(0))
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::Fight(FightError::EmptySequence)));

        let err = FightSession::from_combos(
            &[combo("empty", &[])],
            SessionOptions::default(),
            ManualClock::new(0),
        )
        .err()
        .unwrap();
        assert!(matches!(err, CoreError::Fight(FightError::EmptySequence)));
    }

    #[test]
    fn zero_rounds_fail_validation() {
        let result = FightSession::from_combos(
            &[combo("A", &[("m1", 500)])],
            options(1_000, 1_000, 0),
            ManualClock::new(0),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    struct Canned(FightResponse);

    impl FightGenerator for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn generate(
            &self,
            _request: &FightRequest,
        ) -> impl Future<Output = std::result::Result<FightResponse, FightError>> + Send {
            std::future::ready(Ok(self.0.clone()))
        }
    }

    struct Refusing;

    impl FightGenerator for Refusing {
        fn name(&self) -> &str {
            "refusing"
        }

        fn generate(
            &self,
            _request: &FightRequest,
        ) -> impl Future<Output = std::result::Result<FightResponse, FightError>> + Send {
            std::future::ready(Err(FightError::NoFightsLeft))
        }
    }

    fn request() -> FightRequest {
        FightRequest::new("boxing", "beginner")
    }

    #[tokio::test]
    async fn prepare_builds_unstarted_session() {
        let generator = Canned(FightResponse {
            combos: vec![combo("1-2", &[("JAB", 500), ("CROSS", 500)])],
            fights_left: Some(4),
        });
        let session = FightSession::prepare(&generator, &request(), SessionOptions::default(), ManualClock::new(0))
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.fights_left(), Some(4));
        assert_eq!(session.sequence().len(), 7);
        assert!(session.clock_snapshot().is_paused);
        assert_eq!(session.cursor_position(), CursorPosition::Idle);
    }

    #[tokio::test]
    async fn prepare_with_no_moves_is_empty_sequence() {
        let generator = Canned(FightResponse {
            combos: vec![],
            fights_left: None,
        });
        let err = FightSession::prepare(&generator, &request(), SessionOptions::default(), ManualClock::new(0))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::Fight(FightError::EmptySequence)));
    }

    #[tokio::test]
    async fn prepare_with_exhausted_quota_is_no_fights_left() {
        let generator = Canned(FightResponse {
            combos: vec![],
            fights_left: Some(0),
        });
        let err = FightSession::prepare(&generator, &request(), SessionOptions::default(), ManualClock::new(0))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::Fight(FightError::NoFightsLeft)));
    }

    #[tokio::test]
    async fn prepare_passes_generator_errors_through() {
        let err = FightSession::prepare(&Refusing, &request(), SessionOptions::default(), ManualClock::new(0))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::Fight(FightError::NoFightsLeft)));
    }
}
