use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

use crate::attention::smoothing::{validate_smoothing, DEFAULT_THRESHOLD, DEFAULT_WINDOW};
use crate::timer::TimerMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensingSettings {
    pub frame_interval_ms: u64,
    pub sample_interval_ms: u64,
    pub detection_timeout_ms: u64,
    pub smoothing_window: usize,
    pub smoothing_threshold: usize,
}

impl Default for SensingSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            sample_interval_ms: 100,
            detection_timeout_ms: 2_000,
            smoothing_window: DEFAULT_WINDOW,
            smoothing_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SensingSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_millis(self.detection_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    pub default_mode: TimerMode,
    pub pomodoro_focus_secs: u32,
    pub pomodoro_break_secs: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            default_mode: TimerMode::Stopwatch,
            pomodoro_focus_secs: 25 * 60,
            pomodoro_break_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub sensing: SensingSettings,
    pub timer: TimerSettings,
    pub sound_enabled: bool,
    pub daily_goal_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensing: SensingSettings::default(),
            timer: TimerSettings::default(),
            sound_enabled: true,
            daily_goal_secs: 2 * 60 * 60,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let sensing = &self.sensing;
        if sensing.frame_interval_ms == 0 || sensing.sample_interval_ms == 0 {
            bail!("sensing intervals must be greater than zero");
        }
        if sensing.detection_timeout_ms == 0 {
            bail!("detectionTimeoutMs must be greater than zero");
        }
        validate_smoothing(sensing.smoothing_window, sensing.smoothing_threshold)?;
        if self.timer.pomodoro_focus_secs == 0 || self.timer.pomodoro_break_secs == 0 {
            bail!("pomodoro durations must be greater than zero");
        }
        Ok(())
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    /// Loads settings from `path`, falling back to defaults when the file does
    /// not exist yet.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            read_settings(&path)?
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> Result<Settings> {
        self.data
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    pub fn update(&self, settings: Settings) -> Result<()> {
        settings.validate()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        *guard = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let data = read_settings(&self.path)?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.sensing.sample_interval(), Duration::from_millis(100));
        assert_eq!(settings.sensing.smoothing_window, 5);
        assert_eq!(settings.sensing.smoothing_threshold, 3);
        assert_eq!(settings.timer.pomodoro_focus_secs, 1500);
        assert_eq!(settings.timer.pomodoro_break_secs, 300);
        assert_eq!(settings.daily_goal_secs, 7200);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.get().unwrap(), Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"timer": {"defaultMode": "pomodoro", "pomodoroFocusSecs": 600}, "soundEnabled": false}"#,
        )
        .unwrap();

        let settings = SettingsStore::new(path).unwrap().get().unwrap();
        assert_eq!(settings.timer.default_mode, TimerMode::Pomodoro);
        assert_eq!(settings.timer.pomodoro_focus_secs, 600);
        assert_eq!(settings.timer.pomodoro_break_secs, 300);
        assert!(!settings.sound_enabled);
        assert_eq!(settings.sensing, SensingSettings::default());
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = Settings::default();
        settings.timer.pomodoro_break_secs = 120;
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.get().unwrap(), settings);
        reopened.reload().unwrap();
        assert_eq!(reopened.get().unwrap().timer.pomodoro_break_secs, 120);
    }

    #[test]
    fn rejects_ambiguous_smoothing() {
        let mut settings = Settings::default();
        settings.sensing.smoothing_window = 6;
        settings.sensing.smoothing_threshold = 3;
        assert!(settings.validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert!(store.update(settings).is_err());
        assert_eq!(store.get().unwrap(), Settings::default());
    }

    #[test]
    fn rejects_zero_durations() {
        let mut settings = Settings::default();
        settings.timer.pomodoro_focus_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.sensing.sample_interval_ms = 0;
        assert!(settings.validate().is_err());
    }
}
