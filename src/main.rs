use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use repcoach::{
    app_dirs::AppDirs,
    config::{CoachConfig, ConfigStore, FileConfigStore},
    exercise::ExerciseMode,
    report::{write_events_csv, WorkoutLog},
    runtime::{read_jsonl, spawn_replay, FixedTicker, FrameSample, Runner},
    session::WorkoutSession,
    synth,
};

const TICK_RATE_MS: u64 = 100;

/// count reps and check form from a stream of body landmarks
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Replays a recorded landmark stream (JSON lines) or a synthetic workout through the rep counter and posture classifier, then prints a summary."
)]
pub struct Cli {
    /// exercise to track
    #[clap(short = 'm', long, value_enum, default_value_t = ExerciseMode::PushUps)]
    mode: ExerciseMode,

    /// recorded frames, one JSON object per line; omit for a synthetic workout
    #[clap(short = 'i', long)]
    input: Option<PathBuf>,

    /// synthetic reps to generate (seconds of holding for plank)
    #[clap(short = 'r', long, default_value_t = 5)]
    reps: u32,

    /// spacing between synthetic frames
    #[clap(long, default_value_t = 100)]
    interval_ms: u64,

    /// maximum random offset added to synthetic landmark coordinates
    #[clap(long, default_value_t = 0.0, value_parser = parse_jitter)]
    jitter: f64,

    /// seed for synthetic jitter
    #[clap(long)]
    seed: Option<u64>,

    /// config file to use instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// write the effective config back to disk before running
    #[clap(long)]
    save_config: bool,

    /// export every emitted event to this CSV file
    #[clap(long)]
    events_csv: Option<PathBuf>,

    /// export the events to a timestamped CSV in the app state directory
    #[clap(long, conflicts_with = "events_csv")]
    save_events: bool,

    /// print the final report as JSON instead of text
    #[clap(long)]
    json: bool,
}

fn parse_jitter(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("jitter must be a finite, non-negative number, got {s}"))
    }
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// An explicit config file must parse; the default location falls back to defaults
    fn load_config(&self, store: &FileConfigStore) -> Result<CoachConfig> {
        match &self.config {
            Some(path) if path.exists() => store
                .try_load()
                .with_context(|| format!("loading config from {}", path.display())),
            _ => Ok(store.load()),
        }
    }

    fn events_path(&self) -> Option<PathBuf> {
        if self.save_events {
            let name = format!(
                "{}-{}.csv",
                self.mode,
                chrono::Local::now().format("%Y%m%d-%H%M%S")
            );
            AppDirs::export_dir().map(|dir| dir.join(name))
        } else {
            self.events_csv.clone()
        }
    }

    fn samples(&self) -> Result<Vec<FrameSample>> {
        match &self.input {
            Some(path) => {
                read_jsonl(path).with_context(|| format!("reading frames from {}", path.display()))
            }
            None => {
                let seed = self.seed.unwrap_or_else(rand::random);
                log::info!("synthetic {} workout, seed {seed}", self.mode);
                Ok(synth::workout(
                    self.mode,
                    self.reps,
                    self.interval_ms,
                    self.jitter,
                    seed,
                ))
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let store = cli.config_store();
    let config = cli.load_config(&store)?;
    if cli.save_config {
        store
            .save(&config)
            .with_context(|| format!("saving config to {}", store.path().display()))?;
        log::info!("config saved to {}", store.path().display());
    }

    let samples = cli.samples()?;
    let runner = Runner::new(
        spawn_replay(samples),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    let mut session = WorkoutSession::with_config(cli.mode, config);
    let mut workout_log = WorkoutLog::new();
    let mut last_timestamp_ms = 0;
    runner.drive_with(&mut session, |sample, events| {
        last_timestamp_ms = last_timestamp_ms.max(sample.timestamp_ms);
        workout_log.record(sample, events);
    });

    if let Some(path) = cli.events_path() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        write_events_csv(&path, workout_log.timeline())
            .with_context(|| format!("writing events to {}", path.display()))?;
    }

    let report = workout_log.report(&session.stats(last_timestamp_ms));
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for event in workout_log.timeline() {
            println!(
                "{:>7.1}s  {:<17} {}",
                event.timestamp_ms as f64 / 1000.0,
                event.kind,
                event.detail
            );
        }
        println!();
        println!("{report}");
    }

    Ok(())
}
