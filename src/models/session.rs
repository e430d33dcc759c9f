use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::{TimerMode, TimerState};

/// Sessions considered by `productivity_score`.
const SCORE_WINDOW: usize = 10;

/// Identity of the session currently being timed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
}

impl ActiveSession {
    pub fn begin(started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub mode: TimerMode,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub focus_secs: u64,
    pub distractions: u32,
    pub completed_pomodoros: u32,
}

impl SessionSummary {
    pub fn new(session: ActiveSession, state: &TimerState, ended_at: DateTime<Utc>) -> Self {
        Self {
            id: session.id,
            mode: state.mode,
            started_at: session.started_at,
            ended_at,
            focus_secs: state.elapsed_focus_secs,
            distractions: state.distraction_count,
            completed_pomodoros: state.completed_pomodoros,
        }
    }
}

/// 0-100 score from focus minutes per distraction over the most recent
/// sessions. Ten uninterrupted minutes per distraction scores 100.
pub fn productivity_score(sessions: &[SessionSummary]) -> u8 {
    let recent = &sessions[sessions.len().saturating_sub(SCORE_WINDOW)..];
    let total_focus: u64 = recent.iter().map(|s| s.focus_secs).sum();
    if total_focus == 0 {
        return 0;
    }
    let total_distractions: u64 = recent.iter().map(|s| u64::from(s.distractions)).sum();

    let minutes_per_distraction = total_focus as f64 / total_distractions.max(1) as f64 / 60.0;
    (minutes_per_distraction * 10.0).round().min(100.0) as u8
}

/// Percentage of the daily goal reached, capped at 100.
pub fn goal_progress(focus_secs: u64, goal_secs: u64) -> f64 {
    if goal_secs == 0 {
        return 100.0;
    }
    (focus_secs as f64 / goal_secs as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn summary(focus_secs: u64, distractions: u32) -> SessionSummary {
        let started_at = Utc::now();
        SessionSummary {
            id: Uuid::new_v4().to_string(),
            mode: TimerMode::Stopwatch,
            started_at,
            ended_at: started_at + Duration::seconds(focus_secs as i64),
            focus_secs,
            distractions,
            completed_pomodoros: 0,
        }
    }

    #[test]
    fn empty_history_scores_zero() {
        assert_eq!(productivity_score(&[]), 0);
        assert_eq!(productivity_score(&[summary(0, 3)]), 0);
    }

    #[test]
    fn score_is_focus_minutes_per_distraction() {
        // 30 min over 6 distractions -> 5 min each -> 50
        assert_eq!(productivity_score(&[summary(1200, 4), summary(600, 2)]), 50);
        // no distractions divides by one and caps at 100
        assert_eq!(productivity_score(&[summary(3600, 0)]), 100);
    }

    #[test]
    fn score_uses_last_ten_sessions() {
        let mut sessions = vec![summary(60, 100)];
        sessions.extend((0..10).map(|_| summary(600, 1)));
        assert_eq!(productivity_score(&sessions), 100);
    }

    #[test]
    fn goal_progress_caps_at_full() {
        assert_eq!(goal_progress(3600, 7200), 50.0);
        assert_eq!(goal_progress(9000, 7200), 100.0);
        assert_eq!(goal_progress(10, 0), 100.0);
    }

    #[test]
    fn summary_copies_timer_counters() {
        let mut state = TimerState::default();
        state.start();
        for focused in [true, true, false, true] {
            state.tick(focused);
        }
        let session = ActiveSession::begin(Utc::now());
        let id = session.id.clone();
        let summary = SessionSummary::new(session, &state, Utc::now());
        assert_eq!(summary.id, id);
        assert_eq!(summary.focus_secs, 3);
        assert_eq!(summary.distractions, 1);
        assert_eq!(summary.mode, TimerMode::Stopwatch);
    }
}
