mod driver;
mod duration;
mod engine;

pub use driver::{Command, TimeSource, TimerDriver, TICK_PERIOD};
pub use duration::TimerDuration;
pub use engine::{CountdownClock, TimerPhase};
