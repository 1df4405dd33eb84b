use crate::parse::{parse_axis_max, parse_foreground_activity, parse_screen_size};
use async_trait::async_trait;
use droidrec_engine::backend::{CollaboratorError, DeviceBackend};
use droidrec_engine::config::DeviceConfig;
use droidrec_engine::error::ConfigError;
use droidrec_engine::normalizer::DeviceGeometry;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, warn};

/// Where `uiautomator dump` writes on the device before it is read back.
const UI_DUMP_PATH: &str = "/sdcard/droidrec_window_dump.xml";

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Could not parse `{command}` output: {output}")]
    UnparseableOutput { command: String, output: String },
}

/// The raw event producer: a running `getevent -lt` and its stdout.
pub struct EventStream {
    pub child: Child,
    pub stdout: BufReader<ChildStdout>,
}

/// A device reached through the adb command line.
#[derive(Debug, Clone)]
pub struct AdbDevice {
    adb_path: String,
    serial: Option<String>,
}

impl AdbDevice {
    pub fn new(adb_path: impl Into<String>, serial: Option<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial,
        }
    }

    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::new(config.adb_path.clone(), config.serial.clone())
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    /// Run an adb command to completion and return its stdout.
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, CollaboratorError> {
        let rendered = format!("adb {}", args.join(" "));
        debug!("running {}", rendered);
        let output = self.command(args).output().await?;
        if !output.status.success() {
            return Err(CollaboratorError::CommandFailed {
                command: rendered,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    async fn run_text(&self, args: &[&str]) -> Result<String, CollaboratorError> {
        let stdout = self.run(args).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Screen size and touch ranges. Values set in `config` are used as is;
    /// the rest is probed.
    pub async fn geometry(&self, config: &DeviceConfig) -> Result<DeviceGeometry, DeviceError> {
        let (screen_width, screen_height) = match (config.screen_width, config.screen_height) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                let output = self.run_text(&["shell", "wm", "size"]).await?;
                parse_screen_size(&output).ok_or_else(|| DeviceError::UnparseableOutput {
                    command: "wm size".into(),
                    output: output.trim().to_string(),
                })?
            }
        };

        let (touch_max_x, touch_max_y) = match (config.touch_max_x, config.touch_max_y) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                let output = self.run_text(&["shell", "getevent", "-lp"]).await?;
                let x = parse_axis_max(&output, "ABS_MT_POSITION_X").unwrap_or_else(|| {
                    warn!("no x range reported, using {}", config.default_touch_max);
                    config.default_touch_max
                });
                let y = parse_axis_max(&output, "ABS_MT_POSITION_Y").unwrap_or_else(|| {
                    warn!("no y range reported, using {}", config.default_touch_max);
                    config.default_touch_max
                });
                (config.touch_max_x.unwrap_or(x), config.touch_max_y.unwrap_or(y))
            }
        };

        if touch_max_x == 0 {
            return Err(ConfigError::ZeroDeviceRange { axis: "x" }.into());
        }
        if touch_max_y == 0 {
            return Err(ConfigError::ZeroDeviceRange { axis: "y" }.into());
        }

        let geometry = DeviceGeometry {
            screen_width,
            screen_height,
            touch_max_x,
            touch_max_y,
        };
        info!(
            "screen {}x{}, touch range {}x{}",
            screen_width, screen_height, touch_max_x, touch_max_y
        );
        Ok(geometry)
    }

    /// Start streaming labelled, timestamped input events.
    pub fn spawn_event_stream(&self) -> Result<EventStream, CollaboratorError> {
        let mut child = self
            .command(&["shell", "getevent", "-lt"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CollaboratorError::Unavailable("getevent stdout".into()))?;
        info!("event producer started (pid {:?})", child.id());
        Ok(EventStream {
            child,
            stdout: BufReader::new(stdout),
        })
    }
}

#[async_trait]
impl DeviceBackend for AdbDevice {
    async fn foreground_screen(&self) -> Result<String, CollaboratorError> {
        let output = self
            .run_text(&["shell", "dumpsys", "activity", "activities"])
            .await?;
        parse_foreground_activity(&output)
            .ok_or_else(|| CollaboratorError::Unavailable("no resumed activity".into()))
    }

    async fn dump_ui_tree(&self) -> Result<String, CollaboratorError> {
        // uiautomator exits 0 even when it could not dump, leaving the
        // previous file in place.
        let report = self
            .run_text(&["shell", "uiautomator", "dump", UI_DUMP_PATH])
            .await?;
        if !report.contains("dumped to") {
            return Err(CollaboratorError::Unavailable(format!(
                "uiautomator dump failed: {}",
                report.trim()
            )));
        }
        let markup = self.run_text(&["exec-out", "cat", UI_DUMP_PATH]).await?;
        if !markup.contains("<hierarchy") {
            return Err(CollaboratorError::Unavailable(
                "uiautomator returned no hierarchy".into(),
            ));
        }
        Ok(markup)
    }

    async fn capture_screenshot(&self, dest: &Path) -> Result<(), CollaboratorError> {
        let png = self.run(&["exec-out", "screencap", "-p"]).await?;
        if png.is_empty() {
            return Err(CollaboratorError::CommandFailed {
                command: "adb exec-out screencap -p".into(),
                message: "empty image".into(),
            });
        }
        tokio::fs::write(dest, png).await?;
        Ok(())
    }
}
