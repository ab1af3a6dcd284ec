mod cadence;
mod clock;
mod cursor;
mod session_clock;

pub use cadence::MoveCadence;
pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use cursor::{CursorPosition, MoveCursor};
pub use session_clock::{ClockEvent, ClockSettings, ClockSnapshot, SessionClock};
