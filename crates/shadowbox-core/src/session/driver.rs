//! Tokio host for a [`FightSession`].
//!
//! One task per session multiplexes the clock tick interval, the current
//! move's deadline and the host's commands. All mutation happens on that
//! task, so a move advance and a round boundary landing in the same instant
//! are applied one after the other.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::fight::{FightSession, FightSummary};
use crate::events::Event;
use crate::moves::Stance;
use crate::timer::Clock;

/// Period of the session clock tick.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// What a host can ask of a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Pause,
    Resume,
    TogglePause,
    SetSpeed(f64),
    SetStance(Stance),
    /// Publish a [`Event::StateSnapshot`].
    Snapshot,
    Stop,
}

/// Host side of a spawned session.
///
/// The session stops once every command sender is gone: the handle and any
/// clone taken from [`commander`](Self::commander). A commander still alive
/// elsewhere keeps it running after the handle is dropped; send
/// [`SessionCommand::Stop`] to end it regardless.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    events: mpsc::UnboundedReceiver<Event>,
    task: JoinHandle<FightSummary>,
}

/// Start `session` on the current tokio runtime.
pub fn spawn<C: Clock>(session: FightSession<C>, tick: Duration) -> SessionHandle {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (event_tx, events) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(session, tick, command_rx, event_tx));
    SessionHandle {
        commands,
        events,
        task,
    }
}

impl SessionHandle {
    /// Queue a command. Returns false once the session has ended.
    pub fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// A sender usable from other tasks or threads. It keeps the session
    /// alive until it is dropped too.
    pub fn commander(&self) -> mpsc::UnboundedSender<SessionCommand> {
        self.commands.clone()
    }

    pub fn pause(&self) -> bool {
        self.send(SessionCommand::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(SessionCommand::Resume)
    }

    pub fn set_speed(&self, speed_multiplier: f64) -> bool {
        self.send(SessionCommand::SetSpeed(speed_multiplier))
    }

    /// Next event, or `None` once the session has ended and every event
    /// has been read.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Stop the session and wait for its summary. Events still queued are
    /// discarded.
    pub async fn stop(self) -> Result<FightSummary, JoinError> {
        let _ = self.commands.send(SessionCommand::Stop);
        self.task.await
    }

    /// Wait for the session to end on its own (game over, or a `Stop`
    /// already sent).
    pub async fn join(self) -> Result<FightSummary, JoinError> {
        let SessionHandle { commands, task, .. } = self;
        // Keep the channel open so the session is not stopped by the drop.
        let _commands = commands;
        task.await
    }
}

async fn run<C: Clock>(
    mut session: FightSession<C>,
    tick: Duration,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedSender<Event>,
) -> FightSummary {
    let publish = |batch: Vec<Event>| {
        for event in batch {
            // The host may have stopped listening; the session still runs to its end.
            let _ = events.send(event);
        }
    };

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    publish(session.start());

    while !session.is_finished() {
        let move_wait = session
            .next_deadline_ms()
            .map(|deadline| Duration::from_millis(deadline.saturating_sub(session.now_ms())));

        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => publish(apply(&mut session, command)),
                None => {
                    debug!(session = %session.id(), "handle dropped, stopping");
                    publish(session.stop().into_iter().collect());
                }
            },
            _ = interval.tick() => publish(session.tick()),
            _ = sleep_for(move_wait) => publish(session.tick()),
        }
    }

    session.summary()
}

fn apply<C: Clock>(session: &mut FightSession<C>, command: SessionCommand) -> Vec<Event> {
    match command {
        SessionCommand::Pause => session.pause().into_iter().collect(),
        SessionCommand::Resume => session.resume().into_iter().collect(),
        SessionCommand::TogglePause => session.toggle_pause().into_iter().collect(),
        SessionCommand::SetSpeed(speed) => session.set_speed(speed).into_iter().collect(),
        SessionCommand::SetStance(stance) => session.set_stance(stance),
        SessionCommand::Snapshot => vec![session.snapshot()],
        SessionCommand::Stop => session.stop().into_iter().collect(),
    }
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending().await,
    }
}
