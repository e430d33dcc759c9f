use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use tokio::sync::broadcast;

use focusguard_lib::replay::{ReplayDetector, ReplayVideo};
use focusguard_lib::{
    init_logging, FocusGuard, Settings, SettingsStore, TimerCommand, TimerEvent, TimerMode,
};

#[derive(Parser)]
#[command(name = "focusguard")]
#[command(about = "Webcam attention tracking with a focus-gated timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a recorded landmark trace through the sensing loop and timer
    Replay(ReplayArgs),
    /// Write the default settings file
    Settings {
        #[arg(long)]
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// JSON lines, one detector result per line
    #[arg(long)]
    trace: PathBuf,
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    #[arg(long)]
    focus_secs: Option<u32>,
    #[arg(long)]
    break_secs: Option<u32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Stopwatch,
    Pomodoro,
}

impl From<ModeArg> for TimerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Stopwatch => TimerMode::Stopwatch,
            ModeArg::Pomodoro => TimerMode::Pomodoro,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => replay(args).await,
        Commands::Settings { path } => {
            let store = SettingsStore::new(path.clone())?;
            store.update(Settings::default())?;
            println!("Wrote default settings to {}", path.display());
            Ok(())
        }
    }
}

async fn replay(args: ReplayArgs) -> Result<()> {
    let mut settings = match &args.settings {
        Some(path) => SettingsStore::new(path.clone())?.get()?,
        None => Settings::default(),
    };
    if let Some(mode) = args.mode {
        settings.timer.default_mode = mode.into();
    }
    if let Some(secs) = args.focus_secs {
        settings.timer.pomodoro_focus_secs = secs;
    }
    if let Some(secs) = args.break_secs {
        settings.timer.pomodoro_break_secs = secs;
    }

    let detector = Arc::new(ReplayDetector::load(&args.trace)?);
    let video = Arc::new(ReplayVideo::default());

    let mut app = FocusGuard::new(settings)?;
    let mut events = app.timer().subscribe_events();
    let notifications = tokio::spawn(async move {
        while let Some(event) = next_event(&mut events).await {
            info!("timer event: {:?}", event);
        }
    });
    let cues = app.sound_cues().map(|mut cues| {
        tokio::spawn(async move {
            while let Some(event) = next_event(&mut cues).await {
                info!("sound cue: {:?}", event);
            }
        })
    });

    app.start_detection(detector.clone(), video).await?;
    app.timer().apply(TimerCommand::Start).await?;
    info!("replaying {}", args.trace.display());

    tokio::select! {
        _ = detector.finished() => info!("trace finished"),
        _ = tokio::signal::ctrl_c() => info!("replay interrupted"),
    }

    let summary = app.shutdown().await?;
    notifications.abort();
    if let Some(cues) = cues {
        cues.abort();
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!(
        "daily goal progress: {:.1}%",
        app.daily_goal_progress(summary.focus_secs)
    );
    Ok(())
}

async fn next_event(events: &mut broadcast::Receiver<TimerEvent>) -> Option<TimerEvent> {
    loop {
        match events.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("missed {} timer events", skipped)
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
