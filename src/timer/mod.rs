pub mod commands;
pub mod controller;
pub mod edge;
pub mod state;

pub use commands::TimerCommand;
pub use controller::{TimerController, TimerSnapshot};
pub use edge::{AttentionEdge, EdgeDetector};
pub use state::{format_clock, PomodoroDurations, PomodoroPhase, TimerEvent, TimerMode, TimerState};
