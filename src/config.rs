//! Configuration loading and management

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the IPC socket path
pub const SOCKET_ENV: &str = "SQUAT_COUNTER_SOCKET";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Detection thresholds
    pub tuning: Tuning,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` to read variables
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = lookup("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("squat-counter");

        let socket_path = lookup(SOCKET_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        let tuning = Tuning::from_lookup(&lookup)?;

        Ok(Self {
            socket_path,
            data_dir,
            tuning,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

/// Thresholds for visibility, stability, posture and feedback timing
///
/// Posture and stability thresholds are fractions of the subject's leg
/// length, so they hold at any camera distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Confidence a required joint must exceed to count as visible
    pub min_confidence: f32,
    /// Confidence both ends of a skeleton segment must exceed to be drawn
    pub render_confidence: f32,
    /// Largest per-frame hip movement still considered stable
    pub stability_threshold: f32,
    /// Consecutive stable frames before a posture is trusted
    pub stable_frames: u32,
    /// How far below the knees the hips must drop to count as a squat
    pub squat_depth_threshold: f32,
    /// How far above the knees the hips must rise to count as standing
    pub standing_threshold: f32,
    /// Minimum gap between two displayed messages
    pub debounce_ms: u64,
    /// How long the celebration overlay stays up
    pub overlay_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_confidence: 0.2,
            render_confidence: 0.3,
            stability_threshold: 0.03,
            stable_frames: 3,
            squat_depth_threshold: 0.05,
            standing_threshold: 0.05,
            debounce_ms: 500,
            overlay_ms: 1000,
        }
    }
}

impl Tuning {
    /// Defaults, overridden by any `SQUAT_*` variables `lookup` returns
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let tuning = Self {
            min_confidence: parse_or(&lookup, "SQUAT_MIN_CONFIDENCE", d.min_confidence)?,
            render_confidence: parse_or(&lookup, "SQUAT_RENDER_CONFIDENCE", d.render_confidence)?,
            stability_threshold: parse_or(&lookup, "SQUAT_STABILITY_THRESHOLD", d.stability_threshold)?,
            stable_frames: parse_or(&lookup, "SQUAT_STABLE_FRAMES", d.stable_frames)?,
            squat_depth_threshold: parse_or(&lookup, "SQUAT_DEPTH_THRESHOLD", d.squat_depth_threshold)?,
            standing_threshold: parse_or(&lookup, "SQUAT_STANDING_THRESHOLD", d.standing_threshold)?,
            debounce_ms: parse_or(&lookup, "SQUAT_DEBOUNCE_MS", d.debounce_ms)?,
            overlay_ms: parse_or(&lookup, "SQUAT_OVERLAY_MS", d.overlay_ms)?,
        };
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the pipeline can't work with
    ///
    /// Non-negative posture thresholds keep "in squat" and "fully standing"
    /// mutually exclusive.
    pub fn validate(&self) -> Result<()> {
        ensure_confidence("SQUAT_MIN_CONFIDENCE", self.min_confidence)?;
        ensure_confidence("SQUAT_RENDER_CONFIDENCE", self.render_confidence)?;
        ensure_non_negative("SQUAT_STABILITY_THRESHOLD", self.stability_threshold)?;
        ensure_non_negative("SQUAT_DEPTH_THRESHOLD", self.squat_depth_threshold)?;
        ensure_non_negative("SQUAT_STANDING_THRESHOLD", self.standing_threshold)?;
        ensure!(
            self.stable_frames >= 1,
            "invalid value for SQUAT_STABLE_FRAMES: must be at least 1"
        );
        ensure!(
            self.overlay_ms <= MAX_DURATION_MS,
            "invalid value for SQUAT_OVERLAY_MS: must be at most {MAX_DURATION_MS}"
        );
        ensure!(
            self.debounce_ms <= MAX_DURATION_MS,
            "invalid value for SQUAT_DEBOUNCE_MS: must be at most {MAX_DURATION_MS}"
        );
        Ok(())
    }
}

/// One hour; longer feedback timings are treated as misconfiguration
const MAX_DURATION_MS: u64 = 60 * 60 * 1000;

fn ensure_confidence(key: &str, value: f32) -> Result<()> {
    ensure!(
        value.is_finite() && (0.0..=1.0).contains(&value),
        "invalid value for {key}: {value} is not within [0, 1]"
    );
    Ok(())
}

fn ensure_non_negative(key: &str, value: f32) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "invalid value for {key}: {value} must be finite and non-negative"
    );
    Ok(())
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
