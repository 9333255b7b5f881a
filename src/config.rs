use crate::app_dirs::AppDirs;
use crate::error::CoachError;
use crate::exercise::ExerciseMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PushUpConfig {
    pub elbow_angle_down: f64,
    pub elbow_angle_up: f64,
    pub warning_cooldown_ms: u64,
}

impl Default for PushUpConfig {
    fn default() -> Self {
        Self {
            elbow_angle_down: 90.0,
            elbow_angle_up: 160.0,
            warning_cooldown_ms: 2000,
        }
    }
}

/// Squat counting follows the hip/knee line; the knee angles only drive depth logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SquatConfig {
    pub knee_angle_down: f64,
    pub knee_angle_up: f64,
}

impl Default for SquatConfig {
    fn default() -> Self {
        Self {
            knee_angle_down: 80.0,
            knee_angle_up: 165.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LungeConfig {
    pub front_knee_angle_down: f64,
    pub front_knee_angle_up: f64,
    pub back_knee_angle_down: f64,
    pub back_knee_angle_up: f64,
}

impl Default for LungeConfig {
    fn default() -> Self {
        Self {
            front_knee_angle_down: 85.0,
            front_knee_angle_up: 160.0,
            back_knee_angle_down: 90.0,
            back_knee_angle_up: 150.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlankConfig {
    /// Minimum |cos| between hip->shoulder and hip->ankle (or knee)
    pub straight_abs_cos_min: f64,
    /// Maximum torso deviation from horizontal, in degrees
    pub horiz_max_deg: f64,
    pub knee_min_deg: f64,
    pub warning_cooldown_ms: u64,
}

impl Default for PlankConfig {
    fn default() -> Self {
        Self {
            straight_abs_cos_min: 0.90,
            horiz_max_deg: 35.0,
            knee_min_deg: 150.0,
            warning_cooldown_ms: 2000,
        }
    }
}

/// Tunable thresholds for every exercise mode. Missing fields in a config
/// file take their defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CoachConfig {
    pub pushups: PushUpConfig,
    pub squats: SquatConfig,
    pub lunges: LungeConfig,
    pub plank: PlankConfig,
}

impl CoachConfig {
    /// Cooldown between repeated form warnings for a mode, if it warns at all
    pub fn warning_cooldown_ms(&self, mode: ExerciseMode) -> Option<u64> {
        match mode {
            ExerciseMode::PushUps => Some(self.pushups.warning_cooldown_ms),
            ExerciseMode::Plank => Some(self.plank.warning_cooldown_ms),
            ExerciseMode::Squats | ExerciseMode::Lunges => None,
        }
    }

    pub fn validate(&self) -> Result<(), CoachError> {
        check_band(
            "pushups.elbow_angle",
            self.pushups.elbow_angle_down,
            self.pushups.elbow_angle_up,
        )?;
        check_band(
            "squats.knee_angle",
            self.squats.knee_angle_down,
            self.squats.knee_angle_up,
        )?;
        check_band(
            "lunges.front_knee_angle",
            self.lunges.front_knee_angle_down,
            self.lunges.front_knee_angle_up,
        )?;
        check_band(
            "lunges.back_knee_angle",
            self.lunges.back_knee_angle_down,
            self.lunges.back_knee_angle_up,
        )?;

        let straight = self.plank.straight_abs_cos_min;
        if !(straight > 0.0 && straight <= 1.0) {
            return Err(CoachError::InvalidConfig(format!(
                "plank.straight_abs_cos_min must be in (0, 1], got {straight}"
            )));
        }
        let horiz = self.plank.horiz_max_deg;
        if !(0.0..=90.0).contains(&horiz) {
            return Err(CoachError::InvalidConfig(format!(
                "plank.horiz_max_deg must be in [0, 90], got {horiz}"
            )));
        }
        if !(0.0..=180.0).contains(&self.plank.knee_min_deg) {
            return Err(CoachError::InvalidConfig(format!(
                "plank.knee_min_deg must be in [0, 180], got {}",
                self.plank.knee_min_deg
            )));
        }

        Ok(())
    }
}

fn check_band(name: &str, down: f64, up: f64) -> Result<(), CoachError> {
    let in_range = |a: f64| (0.0..=180.0).contains(&a);
    if !in_range(down) || !in_range(up) || down >= up {
        return Err(CoachError::InvalidConfig(format!(
            "{name}: down ({down}) must be below up ({up}), both within [0, 180]"
        )));
    }
    Ok(())
}

pub trait ConfigStore {
    fn load(&self) -> CoachConfig;
    fn save(&self, cfg: &CoachConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("repcoach_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict variant of `load` that surfaces parse and validation errors
    pub fn try_load(&self) -> Result<CoachConfig, CoachError> {
        let bytes = fs::read(&self.path)?;
        let cfg = serde_json::from_slice::<CoachConfig>(&bytes)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> CoachConfig {
        if !self.path.exists() {
            return CoachConfig::default();
        }
        match self.try_load() {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!(
                    "ignoring config at {}: {e}; using defaults",
                    self.path.display()
                );
                CoachConfig::default()
            }
        }
    }

    fn save(&self, cfg: &CoachConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
