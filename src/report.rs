//! Post-workout summary: a timeline of everything a session emitted, rep
//! tempo, and a CSV export.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::CoachError;
use crate::events::{CoachEvent, Severity};
use crate::exercise::ExerciseMode;
use crate::runtime::FrameSample;
use crate::session::SessionStats;

/// One emitted event, flattened for export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub timestamp_ms: u64,
    pub kind: String,
    pub detail: String,
}

impl TimedEvent {
    fn from_event(timestamp_ms: u64, event: &CoachEvent) -> Self {
        let detail = match event {
            CoachEvent::RepCounted { total } => total.to_string(),
            CoachEvent::PostureChanged { status, .. } => status.to_string(),
            CoachEvent::FormFeedback(fb) => format!("{}: {}", fb.severity, fb.message),
            CoachEvent::HoldTimeUpdated { elapsed_seconds } => elapsed_seconds.to_string(),
        };
        Self {
            timestamp_ms,
            kind: event.kind().to_string(),
            detail,
        }
    }
}

/// Accumulates frames and events as a session runs
#[derive(Debug, Clone, Default)]
pub struct WorkoutLog {
    timeline: Vec<TimedEvent>,
    frames: usize,
    frames_without_tracking: usize,
    rep_timestamps_ms: Vec<u64>,
    warnings: usize,
}

impl WorkoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one processed frame together with the events it produced
    pub fn record(&mut self, sample: &FrameSample, events: &[CoachEvent]) {
        self.frames += 1;
        if sample.landmarks.is_none() {
            self.frames_without_tracking += 1;
        }

        for event in events {
            match event {
                CoachEvent::RepCounted { .. } => self.rep_timestamps_ms.push(sample.timestamp_ms),
                CoachEvent::FormFeedback(fb) if fb.severity == Severity::Warning => {
                    self.warnings += 1
                }
                _ => {}
            }
            self.timeline
                .push(TimedEvent::from_event(sample.timestamp_ms, event));
        }
    }

    pub fn timeline(&self) -> &[TimedEvent] {
        &self.timeline
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Final summary; counts and hold time come from the session itself
    pub fn report(&self, stats: &SessionStats) -> WorkoutReport {
        let tempo = Tempo::from_timestamps(&self.rep_timestamps_ms);
        WorkoutReport {
            mode: stats.mode,
            reps: stats.count,
            held_seconds: stats.elapsed_seconds,
            frames: self.frames,
            frames_without_tracking: self.frames_without_tracking,
            warnings: self.warnings,
            rep_timestamps_ms: self.rep_timestamps_ms.clone(),
            tempo_mean_ms: tempo.map(|t| t.mean_ms),
            tempo_std_dev_ms: tempo.map(|t| t.std_dev_ms),
            finished_at: Local::now(),
        }
    }
}

/// Spacing between consecutive reps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    pub mean_ms: f64,
    pub std_dev_ms: f64,
}

impl Tempo {
    /// Needs at least two reps
    pub fn from_timestamps(timestamps_ms: &[u64]) -> Option<Self> {
        let gaps: Vec<f64> = timestamps_ms
            .iter()
            .tuple_windows()
            .map(|(a, b)| b.saturating_sub(*a) as f64)
            .collect();
        if gaps.is_empty() {
            return None;
        }

        let n = gaps.len() as f64;
        let mean_ms = gaps.iter().sum::<f64>() / n;
        let variance = gaps.iter().map(|g| (g - mean_ms).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean_ms,
            std_dev_ms: variance.sqrt(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutReport {
    pub mode: ExerciseMode,
    pub reps: u32,
    pub held_seconds: u64,
    pub frames: usize,
    pub frames_without_tracking: usize,
    pub warnings: usize,
    pub rep_timestamps_ms: Vec<u64>,
    pub tempo_mean_ms: Option<f64>,
    pub tempo_std_dev_ms: Option<f64>,
    pub finished_at: DateTime<Local>,
}

impl fmt::Display for WorkoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mode.is_timed() {
            writeln!(f, "{}: held {}s", self.mode, self.held_seconds)?;
        } else {
            writeln!(f, "{}: {} reps", self.mode, self.reps)?;
        }
        if let (Some(mean), Some(sd)) = (self.tempo_mean_ms, self.tempo_std_dev_ms) {
            writeln!(f, "tempo: {:.2}s per rep (sd {:.2}s)", mean / 1000.0, sd / 1000.0)?;
        }
        if !self.rep_timestamps_ms.is_empty() {
            writeln!(
                f,
                "reps at: {}",
                self.rep_timestamps_ms
                    .iter()
                    .map(|t| format!("{:.1}s", *t as f64 / 1000.0))
                    .join(", ")
            )?;
        }
        write!(
            f,
            "frames: {} ({} without tracking), warnings: {}, finished {}",
            self.frames,
            self.frames_without_tracking,
            self.warnings,
            self.finished_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Writes the event timeline as CSV with a header row
pub fn write_events_csv(path: &Path, timeline: &[TimedEvent]) -> Result<(), CoachError> {
    let mut writer = csv::Writer::from_path(path)?;
    for event in timeline {
        writer.serialize(event)?;
    }
    writer.flush()?;
    log::info!("wrote {} events to {}", timeline.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FormFeedback;
    use crate::posture::PostureStatus;
    use crate::reps::Phase;

    fn stats(mode: ExerciseMode, count: u32, elapsed_seconds: u64) -> SessionStats {
        SessionStats {
            mode,
            count,
            phase: Phase::Up,
            posture: PostureStatus::Correct,
            elapsed_seconds,
        }
    }

    #[test]
    fn test_tempo_needs_two_reps() {
        assert_eq!(Tempo::from_timestamps(&[]), None);
        assert_eq!(Tempo::from_timestamps(&[1_000]), None);
    }

    #[test]
    fn test_tempo_even_spacing() {
        let t = Tempo::from_timestamps(&[1_000, 3_000, 5_000, 7_000]).unwrap();
        assert_eq!(t.mean_ms, 2_000.0);
        assert_eq!(t.std_dev_ms, 0.0);
    }

    #[test]
    fn test_tempo_uneven_spacing() {
        // gaps of 1000 and 3000
        let t = Tempo::from_timestamps(&[0, 1_000, 4_000]).unwrap();
        assert_eq!(t.mean_ms, 2_000.0);
        assert_eq!(t.std_dev_ms, 1_000.0);
    }

    #[test]
    fn test_log_records_frames_and_events() {
        let mut log = WorkoutLog::new();
        log.record(
            &FrameSample::lost(0),
            &[CoachEvent::PostureChanged {
                status: PostureStatus::Unknown,
                frame: None,
            }],
        );
        log.record(
            &FrameSample::lost(100),
            &[CoachEvent::FormFeedback(FormFeedback::new(
                "careful",
                Severity::Warning,
                100,
            ))],
        );

        assert_eq!(log.frames(), 2);
        assert_eq!(
            log.timeline(),
            &[
                TimedEvent {
                    timestamp_ms: 0,
                    kind: "posture_changed".into(),
                    detail: "unknown".into(),
                },
                TimedEvent {
                    timestamp_ms: 100,
                    kind: "form_feedback".into(),
                    detail: "warning: careful".into(),
                },
            ]
        );

        let report = log.report(&stats(ExerciseMode::PushUps, 0, 0));
        assert_eq!(report.frames_without_tracking, 2);
        assert_eq!(report.warnings, 1);
        assert_eq!(report.tempo_mean_ms, None);
    }

    #[test]
    fn test_report_collects_rep_times() {
        let mut log = WorkoutLog::new();
        for (t, total) in [(800, 1), (2_400, 2), (4_000, 3)] {
            log.record(&FrameSample::lost(t), &[CoachEvent::RepCounted { total }]);
        }
        let report = log.report(&stats(ExerciseMode::Squats, 3, 0));
        assert_eq!(report.reps, 3);
        assert_eq!(report.rep_timestamps_ms, vec![800, 2_400, 4_000]);
        assert_eq!(report.tempo_mean_ms, Some(1_600.0));

        let text = report.to_string();
        assert!(text.starts_with("squats: 3 reps"));
        assert!(text.contains("reps at: 0.8s, 2.4s, 4.0s"));
    }

    #[test]
    fn test_plank_report_shows_hold() {
        let report = WorkoutLog::new().report(&stats(ExerciseMode::Plank, 0, 12));
        assert!(report.to_string().starts_with("plank: held 12s"));
    }

    #[test]
    fn test_report_json_roundtrip_keeps_mode() {
        let report = WorkoutLog::new().report(&stats(ExerciseMode::Lunges, 2, 0));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "lunges");
        assert_eq!(json["reps"], 2);
        assert!(json["finished_at"].is_string());
    }

    #[test]
    fn test_write_events_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let timeline = vec![
            TimedEvent {
                timestamp_ms: 0,
                kind: "posture_changed".into(),
                detail: "correct".into(),
            },
            TimedEvent {
                timestamp_ms: 500,
                kind: "rep_counted".into(),
                detail: "1".into(),
            },
        ];

        write_events_csv(&path, &timeline).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "timestamp_ms,kind,detail",
                "0,posture_changed,correct",
                "500,rep_counted,1"
            ]
        );
    }

    #[test]
    fn test_write_events_csv_bad_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("events.csv");
        assert!(write_events_csv(&path, &[]).is_err());
    }
}
