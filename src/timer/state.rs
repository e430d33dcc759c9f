use serde::{Deserialize, Serialize};

use super::edge::{AttentionEdge, EdgeDetector};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    #[default]
    Stopwatch,
    Pomodoro,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PomodoroPhase {
    #[default]
    Focus,
    Break,
}

/// Notifications produced by a tick. Consumers decide what to do with them
/// (sounds, UI badges); the state machine itself has no side effects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerEvent {
    Distracted,
    FocusRegained,
    FocusComplete,
    BreakComplete,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroDurations {
    pub focus_secs: u32,
    pub break_secs: u32,
}

impl Default for PomodoroDurations {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            break_secs: 5 * 60,
        }
    }
}

impl PomodoroDurations {
    pub fn of(self, phase: PomodoroPhase) -> u32 {
        match phase {
            PomodoroPhase::Focus => self.focus_secs,
            PomodoroPhase::Break => self.break_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub mode: TimerMode,
    pub running: bool,
    pub elapsed_focus_secs: u64,
    pub distraction_count: u32,
    pub pomodoro_phase: PomodoroPhase,
    pub pomodoro_remaining_secs: u32,
    pub completed_pomodoros: u32,
    pub durations: PomodoroDurations,
    #[serde(skip)]
    edges: EdgeDetector,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(TimerMode::default(), PomodoroDurations::default())
    }
}

impl TimerState {
    pub fn new(mode: TimerMode, durations: PomodoroDurations) -> Self {
        Self {
            mode,
            running: false,
            elapsed_focus_secs: 0,
            distraction_count: 0,
            pomodoro_phase: PomodoroPhase::Focus,
            pomodoro_remaining_secs: durations.focus_secs,
            completed_pomodoros: 0,
            durations,
            edges: EdgeDetector::default(),
        }
    }

    /// Returns false when already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Suspends counting and keeps the counters. Stopwatch "stop" and
    /// Pomodoro "pause" are the same transition.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.edges.clear();
        true
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.mode, self.durations);
    }

    pub fn switch_mode(&mut self, mode: TimerMode) {
        *self = Self::new(mode, self.durations);
    }

    /// New durations restart the cycle from a fresh focus phase.
    pub fn set_durations(&mut self, durations: PomodoroDurations) {
        *self = Self::new(self.mode, durations);
    }

    /// True while no counter has moved and nothing is running.
    pub fn is_pristine(&self) -> bool {
        *self == Self::new(self.mode, self.durations)
    }

    /// Advances one second given the smoothed attention level.
    pub fn tick(&mut self, focused: bool) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        if !self.running {
            return events;
        }

        match self.mode {
            TimerMode::Stopwatch => {
                self.observe_attention(focused, &mut events);
                if focused {
                    self.elapsed_focus_secs += 1;
                }
            }
            TimerMode::Pomodoro => {
                let advance = match self.pomodoro_phase {
                    PomodoroPhase::Focus => {
                        self.observe_attention(focused, &mut events);
                        focused
                    }
                    PomodoroPhase::Break => {
                        self.edges.clear();
                        true
                    }
                };
                if advance {
                    self.advance_pomodoro(&mut events);
                }
            }
        }

        events
    }

    fn observe_attention(&mut self, focused: bool, events: &mut Vec<TimerEvent>) {
        match self.edges.observe(focused) {
            Some(AttentionEdge::Lost) => {
                self.distraction_count += 1;
                events.push(TimerEvent::Distracted);
            }
            Some(AttentionEdge::Regained) => events.push(TimerEvent::FocusRegained),
            None => {}
        }
    }

    fn advance_pomodoro(&mut self, events: &mut Vec<TimerEvent>) {
        if self.pomodoro_phase == PomodoroPhase::Focus {
            self.elapsed_focus_secs += 1;
        }
        self.pomodoro_remaining_secs = self.pomodoro_remaining_secs.saturating_sub(1);
        if self.pomodoro_remaining_secs > 0 {
            return;
        }

        match self.pomodoro_phase {
            PomodoroPhase::Focus => {
                self.completed_pomodoros += 1;
                self.pomodoro_phase = PomodoroPhase::Break;
                events.push(TimerEvent::FocusComplete);
            }
            PomodoroPhase::Break => {
                self.pomodoro_phase = PomodoroPhase::Focus;
                events.push(TimerEvent::BreakComplete);
            }
        }
        self.pomodoro_remaining_secs = self.durations.of(self.pomodoro_phase);
        self.edges.clear();
    }

    /// Seconds shown on the main clock: elapsed focus for the stopwatch,
    /// countdown for Pomodoro.
    pub fn display_secs(&self) -> u64 {
        match self.mode {
            TimerMode::Stopwatch => self.elapsed_focus_secs,
            TimerMode::Pomodoro => u64::from(self.pomodoro_remaining_secs),
        }
    }

    /// Share of the current Pomodoro phase already spent, 0..=100.
    pub fn phase_progress_percent(&self) -> f64 {
        let total = self.durations.of(self.pomodoro_phase);
        if total == 0 {
            return 0.0;
        }
        let spent = total.saturating_sub(self.pomodoro_remaining_secs);
        f64::from(spent) * 100.0 / f64::from(total)
    }
}

/// `mm:ss`, or `hh:mm:ss` from one hour up.
pub fn format_clock(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    if hours > 0 {
        format!("{hours:02}:{mins:02}:{secs:02}")
    } else {
        format!("{mins:02}:{secs:02}")
    }
}
