#![doc = "Virtual wall clock that subtracts time spent paused in a debugger."]

pub mod clock;
pub mod clock_source;
pub mod debugger;
pub mod detector;
pub mod gate;
pub mod global;
pub mod monitor;
pub mod watcher;

pub use clock::*;
pub use clock_source::*;
pub use debugger::*;
pub use detector::*;
pub use gate::BreakTrigger;
pub use watcher::WatcherHandle;
