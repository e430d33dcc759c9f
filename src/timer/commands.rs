use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{PomodoroDurations, TimerController, TimerMode, TimerState};

/// User actions accepted by the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum TimerCommand {
    Start,
    /// Stopwatch "stop"; suspends counting.
    Stop,
    /// Pomodoro "pause"; same transition as `Stop`.
    Pause,
    /// Pomodoro play/pause button.
    Toggle,
    Reset,
    SwitchMode { mode: TimerMode },
    SetDurations { durations: PomodoroDurations },
}

impl TimerController {
    pub async fn apply(&self, command: TimerCommand) -> Result<TimerState> {
        match command {
            TimerCommand::Start => self.start().await,
            TimerCommand::Stop | TimerCommand::Pause => self.pause().await,
            TimerCommand::Toggle => {
                if self.get_state().await.running {
                    self.pause().await
                } else {
                    self.start().await
                }
            }
            TimerCommand::Reset => Ok(self.reset().await),
            TimerCommand::SwitchMode { mode } => Ok(self.switch_mode(mode).await),
            TimerCommand::SetDurations { durations } => self.set_pomodoro_durations(durations).await,
        }
    }
}
