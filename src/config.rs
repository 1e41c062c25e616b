//! Gate configuration parameters
//!
//! All tunable parameters for the gate controller.
//! Values can be overridden by an optional JSON config file and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    // --- Storage ---
    /// SQLite ledger file
    pub db_path: PathBuf,

    // --- Output ---
    /// BCM pin number of the unlock output
    pub output_gpio: u8,
    /// How long the unlock output is held active (milliseconds)
    pub pulse_duration_ms: u64,

    // --- Policy ---
    /// Repeat reads of the same card inside this window are ignored (milliseconds)
    pub antispam_window_ms: u64,
    /// Scans per card per local day that still open the gate
    pub max_daily_scans: u32,

    // --- Timing ---
    /// Pause after a handled scan, to let the card be removed (milliseconds)
    pub loop_pause_ms: u64,
    /// Pause after a suppressed repeat read (milliseconds)
    pub suppressed_pause_ms: u64,
    /// Pause after a failed iteration (milliseconds)
    pub read_error_pause_ms: u64,

    // --- Clock ---
    /// Fixed UTC offset for day boundaries; `None` follows the host zone
    pub utc_offset_minutes: Option<i32>,

    // --- Logging ---
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("rfid_gate.sqlite3"),

            output_gpio: 17,
            pulse_duration_ms: 2000,

            antispam_window_ms: 2000,
            max_daily_scans: 3,

            loop_pause_ms: 500,
            suppressed_pause_ms: 200,
            read_error_pause_ms: 500,

            utc_offset_minutes: None,

            log_level: "info".into(),
            log_file: None,
        }
    }
}

const MAX_PAUSE_MS: u64 = 10_000;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

impl GateConfig {
    /// Range-check every field.  Out-of-range values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed("db_path must not be empty"));
        }
        if self.output_gpio > 53 {
            return Err(ConfigError::ValidationFailed("output_gpio must be 0–53"));
        }
        if !(100..=60_000).contains(&self.pulse_duration_ms) {
            return Err(ConfigError::ValidationFailed(
                "pulse_duration_ms must be 100–60000",
            ));
        }
        if self.antispam_window_ms > 60_000 {
            return Err(ConfigError::ValidationFailed(
                "antispam_window_ms must be 0–60000",
            ));
        }
        if !(1..=10_000).contains(&self.max_daily_scans) {
            return Err(ConfigError::ValidationFailed(
                "max_daily_scans must be 1–10000",
            ));
        }
        if self.loop_pause_ms > MAX_PAUSE_MS
            || self.suppressed_pause_ms > MAX_PAUSE_MS
            || self.read_error_pause_ms > MAX_PAUSE_MS
        {
            return Err(ConfigError::ValidationFailed("pauses must be 0–10000 ms"));
        }
        if let Some(offset) = self.utc_offset_minutes {
            if offset.abs() > MAX_OFFSET_MINUTES {
                return Err(ConfigError::ValidationFailed(
                    "utc_offset_minutes must be within ±840",
                ));
            }
        }
        Ok(())
    }

    pub fn pulse_duration(&self) -> Duration {
        Duration::from_millis(self.pulse_duration_ms)
    }

    pub fn antispam_window(&self) -> Duration {
        Duration::from_millis(self.antispam_window_ms)
    }

    pub fn loop_pause(&self) -> Duration {
        Duration::from_millis(self.loop_pause_ms)
    }

    pub fn suppressed_pause(&self) -> Duration {
        Duration::from_millis(self.suppressed_pause_ms)
    }

    pub fn read_error_pause(&self) -> Duration {
        Duration::from_millis(self.read_error_pause_ms)
    }

    /// The configured fixed offset, if any.  Validated values always convert.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|m| FixedOffset::east_opt(m * 60))
    }
}
