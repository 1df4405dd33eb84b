use droidrec_common::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DroidrecConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl DroidrecConfig {
    /// Reject values the engine cannot run with. Called once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gesture.validate()?;
        if self.pipeline.line_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "pipeline.line_buffer",
                reason: "must be at least 1".into(),
            });
        }
        if let Some(0) = self.device.touch_max_x {
            return Err(ConfigError::ZeroDeviceRange { axis: "x" });
        }
        if let Some(0) = self.device.touch_max_y {
            return Err(ConfigError::ZeroDeviceRange { axis: "y" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Passed to adb as `-s <serial>` when set.
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default = "default_adb_path")]
    pub adb_path: String,
    #[serde(default)]
    pub screen_width: Option<u32>,
    #[serde(default)]
    pub screen_height: Option<u32>,
    #[serde(default)]
    pub touch_max_x: Option<u32>,
    #[serde(default)]
    pub touch_max_y: Option<u32>,
    /// Used when the device does not report an axis range.
    #[serde(default = "default_touch_max")]
    pub default_touch_max: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial: None,
            adb_path: default_adb_path(),
            screen_width: None,
            screen_height: None,
            touch_max_x: None,
            touch_max_y: None,
            default_touch_max: default_touch_max(),
        }
    }
}

fn default_adb_path() -> String {
    "adb".to_string()
}

fn default_touch_max() -> u32 {
    32767
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default = "default_continuity_threshold")]
    pub continuity_threshold_secs: f64,
    #[serde(default = "default_long_press_threshold")]
    pub long_press_threshold_secs: f64,
    #[serde(default = "default_tap_distance")]
    pub tap_distance_px: f64,
    #[serde(default = "default_special_keys")]
    pub special_keys: Vec<String>,
    #[serde(default = "default_release_tracking_id")]
    pub release_tracking_id: String,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            continuity_threshold_secs: default_continuity_threshold(),
            long_press_threshold_secs: default_long_press_threshold(),
            tap_distance_px: default_tap_distance(),
            special_keys: default_special_keys(),
            release_tracking_id: default_release_tracking_id(),
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("gesture.continuity_threshold_secs", self.continuity_threshold_secs),
            ("gesture.long_press_threshold_secs", self.long_press_threshold_secs),
            ("gesture.tap_distance_px", self.tap_distance_px),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {}", value),
                });
            }
        }
        if self.release_tracking_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "gesture.release_tracking_id",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn default_continuity_threshold() -> f64 {
    0.1
}

fn default_long_press_threshold() -> f64 {
    0.6
}

fn default_tap_distance() -> f64 {
    10.0
}

fn default_special_keys() -> Vec<String> {
    vec![
        "KEY_BACK".to_string(),
        "KEY_HOME".to_string(),
        "KEY_APPSELECT".to_string(),
        "KEY_ENTER".to_string(),
    ]
}

fn default_release_tracking_id() -> String {
    "ffffffff".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default = "default_records_dir")]
    pub records_dir: PathBuf,
    /// Wait before collecting metadata so the UI can settle after an action.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Upper bound for each external collaborator call.
    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            records_dir: default_records_dir(),
            settle_delay_ms: default_settle_delay_ms(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
        }
    }
}

impl RecordingConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

fn default_records_dir() -> PathBuf {
    PathBuf::from("records")
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_collaborator_timeout_ms() -> u64 {
    10000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Capacity of the channel between the line reader and the worker.
    #[serde(default = "default_line_buffer")]
    pub line_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            line_buffer: default_line_buffer(),
        }
    }
}

fn default_line_buffer() -> usize {
    1024
}
