use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
    time::{self, Duration},
};

use crate::attention::AttentionState;
use crate::models::{ActiveSession, SessionSummary};
use crate::settings::TimerSettings;

use super::state::{format_clock, PomodoroDurations, TimerEvent, TimerMode, TimerState};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub display: String,
    pub phase_progress: f64,
    pub session_id: Option<String>,
}

struct TimerCore {
    state: TimerState,
    session: Option<ActiveSession>,
    /// Bumped whenever the ticker is cancelled; a ticker whose generation no
    /// longer matches must not touch the state.
    generation: u64,
}

impl TimerCore {
    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            display: format_clock(self.state.display_secs()),
            phase_progress: self.state.phase_progress_percent(),
            session_id: self.session.as_ref().map(|s| s.id.clone()),
            state: self.state.clone(),
        }
    }
}

/// Drives `TimerState` from a one-second clock and the published attention
/// state. At most one ticker task exists at any time.
#[derive(Clone)]
pub struct TimerController {
    core: Arc<Mutex<TimerCore>>,
    attention: watch::Receiver<AttentionState>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    heartbeat_every_ticks: u32,
    snapshot_tx: Arc<watch::Sender<TimerSnapshot>>,
    events_tx: broadcast::Sender<TimerEvent>,
}

impl TimerController {
    pub fn new(attention: watch::Receiver<AttentionState>, settings: &TimerSettings) -> Self {
        let durations = PomodoroDurations {
            focus_secs: settings.pomodoro_focus_secs,
            break_secs: settings.pomodoro_break_secs,
        };
        let core = TimerCore {
            state: TimerState::new(settings.default_mode, durations),
            session: None,
            generation: 0,
        };
        let (snapshot_tx, _) = watch::channel(core.snapshot());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            core: Arc::new(Mutex::new(core)),
            attention,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            heartbeat_every_ticks: if crate::debug_mode() { 1 } else { 10 },
            snapshot_tx: Arc::new(snapshot_tx),
            events_tx,
        }
    }

    pub async fn get_state(&self) -> TimerState {
        self.core.lock().await.state.clone()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        self.core.lock().await.snapshot()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.events_tx.subscribe()
    }

    /// Stopwatch "start" and Pomodoro "start/resume".
    pub async fn start(&self) -> Result<TimerState> {
        let generation = {
            let mut core = self.core.lock().await;
            if !core.state.start() {
                bail!("timer already running");
            }
            if core.session.is_none() {
                core.session = Some(ActiveSession::begin(Utc::now()));
            }
            core.generation += 1;
            info!(
                "{:?} timer started ({} focused so far)",
                core.state.mode,
                format_clock(core.state.elapsed_focus_secs)
            );
            core.generation
        };

        self.spawn_ticker(generation).await;
        self.publish_snapshot().await;
        Ok(self.get_state().await)
    }

    /// Stopwatch "stop" and Pomodoro "pause": counting halts, counters stay.
    pub async fn pause(&self) -> Result<TimerState> {
        self.cancel_ticker().await;
        {
            let mut core = self.core.lock().await;
            if !core.state.pause() {
                bail!("timer is not running");
            }
            info!(
                "{:?} timer paused at {}",
                core.state.mode,
                format_clock(core.state.display_secs())
            );
        }
        self.publish_snapshot().await;
        Ok(self.get_state().await)
    }

    /// Zeroes the counters and drops the current session. Safe to repeat.
    pub async fn reset(&self) -> TimerState {
        self.cancel_ticker().await;
        {
            let mut core = self.core.lock().await;
            core.state.reset();
            core.session = None;
        }
        info!("timer reset");
        self.publish_snapshot().await;
        self.get_state().await
    }

    pub async fn switch_mode(&self, mode: TimerMode) -> TimerState {
        self.cancel_ticker().await;
        {
            let mut core = self.core.lock().await;
            core.state.switch_mode(mode);
            core.session = None;
        }
        info!("timer mode switched to {:?}", mode);
        self.publish_snapshot().await;
        self.get_state().await
    }

    pub async fn set_pomodoro_durations(&self, durations: PomodoroDurations) -> Result<TimerState> {
        if durations.focus_secs == 0 || durations.break_secs == 0 {
            bail!("pomodoro durations must be greater than zero");
        }
        self.cancel_ticker().await;
        {
            let mut core = self.core.lock().await;
            core.state.set_durations(durations);
            core.session = None;
        }
        info!(
            "pomodoro durations set to {}s focus / {}s break",
            durations.focus_secs, durations.break_secs
        );
        self.publish_snapshot().await;
        Ok(self.get_state().await)
    }

    /// Stops counting, summarises the session and resets the timer.
    pub async fn end_session(&self) -> Result<SessionSummary> {
        self.cancel_ticker().await;
        let summary = {
            let mut core = self.core.lock().await;
            let session = core
                .session
                .take()
                .ok_or_else(|| anyhow!("no active session to end"))?;
            let summary = SessionSummary::new(session, &core.state, Utc::now());
            core.state.reset();
            summary
        };

        info!(
            "session {} ended: {} focused, {} distractions",
            summary.id,
            format_clock(summary.focus_secs),
            summary.distractions
        );
        self.publish_snapshot().await;
        Ok(summary)
    }

    async fn spawn_ticker(&self, generation: u64) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let core = self.core.clone();
        let attention = self.attention.clone();
        let snapshot_tx = self.snapshot_tx.clone();
        let events_tx = self.events_tx.clone();
        let tick_interval = self.tick_interval;
        let heartbeat_every = self.heartbeat_every_ticks;
        let first_tick = time::Instant::now() + tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(first_tick, tick_interval);
            let mut ticks: u32 = 0;
            loop {
                interval.tick().await;
                let focused = attention.borrow().focused;

                let (events, snapshot) = {
                    let mut guard = core.lock().await;
                    if guard.generation != generation || !guard.state.running {
                        break;
                    }
                    let events = guard.state.tick(focused);
                    (events, guard.snapshot())
                };

                ticks = ticks.wrapping_add(1);
                if ticks % heartbeat_every == 0 {
                    debug!(
                        "timer heartbeat: {} (focused={}, distractions={})",
                        snapshot.display, focused, snapshot.state.distraction_count
                    );
                }

                snapshot_tx.send_replace(snapshot);
                for event in events {
                    log_event(event);
                    // No subscribers is fine.
                    let _ = events_tx.send(event);
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        self.core.lock().await.generation += 1;
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    async fn publish_snapshot(&self) {
        let snapshot = self.core.lock().await.snapshot();
        self.snapshot_tx.send_replace(snapshot);
    }
}

fn log_event(event: TimerEvent) {
    match event {
        TimerEvent::Distracted => info!("distraction detected"),
        TimerEvent::FocusRegained => debug!("focus regained"),
        TimerEvent::FocusComplete => info!("pomodoro focus phase complete, break started"),
        TimerEvent::BreakComplete => info!("pomodoro break complete, focus phase started"),
    }
}
