//! Fight sessions and the async driver that hosts them.

mod driver;
mod fight;

pub use driver::{spawn, SessionCommand, SessionHandle, DEFAULT_TICK};
pub use fight::{FightSession, FightSummary, SessionOptions, SessionState};
