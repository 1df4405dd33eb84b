#![allow(dead_code)]

use droidrec_engine::config::GestureConfig;
use droidrec_engine::dispatcher::GestureDispatcher;
use droidrec_engine::normalizer::{CoordinateNormalizer, DeviceGeometry};

/// Geometry where one raw unit is one pixel.
pub fn identity_geometry() -> DeviceGeometry {
    DeviceGeometry {
        screen_width: 1000,
        screen_height: 1000,
        touch_max_x: 1000,
        touch_max_y: 1000,
    }
}

pub fn dispatcher() -> GestureDispatcher {
    let normalizer = CoordinateNormalizer::new(identity_geometry()).unwrap();
    GestureDispatcher::new(&GestureConfig::default(), normalizer)
}

pub fn key(t: f64, code: &str, edge: &str) -> String {
    format!(
        "[{:>14.6}] /dev/input/event0: EV_KEY       {:<20} {}",
        t, code, edge
    )
}

pub fn pos_x(t: f64, raw: u32) -> String {
    format!(
        "[{:>14.6}] /dev/input/event2: EV_ABS       ABS_MT_POSITION_X    {:08x}",
        t, raw
    )
}

pub fn pos_y(t: f64, raw: u32) -> String {
    format!(
        "[{:>14.6}] /dev/input/event2: EV_ABS       ABS_MT_POSITION_Y    {:08x}",
        t, raw
    )
}

pub fn tracking(t: f64, id: &str) -> String {
    format!(
        "[{:>14.6}] /dev/input/event2: EV_ABS       ABS_MT_TRACKING_ID   {}",
        t, id
    )
}

pub fn release(t: f64) -> String {
    tracking(t, "ffffffff")
}

pub fn syn(t: f64) -> String {
    format!(
        "[{:>14.6}] /dev/input/event2: EV_SYN       SYN_REPORT           00000000",
        t
    )
}

/// X, Y and SYN lines for one paired sample.
pub fn sample(t: f64, x: u32, y: u32) -> Vec<String> {
    vec![pos_x(t, x), pos_y(t, y), syn(t)]
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

use async_trait::async_trait;
use droidrec_engine::backend::{CollaboratorError, DeviceBackend};
use droidrec_engine::config::RecordingConfig;
use droidrec_engine::protocol::{Bounds, ClassifiedAction};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const SETTINGS_DUMP: &str = r#"<hierarchy rotation="0">
<node class="android.widget.FrameLayout" bounds="[0,0][1000,1000]">
<node class="android.widget.Button" text="OK" bounds="[50,50][250,150]" />
</node>
</hierarchy>"#;

/// Device double recording which collaborators were called.
#[derive(Default)]
pub struct MockDevice {
    pub activity: Option<String>,
    pub tree: Option<String>,
    pub screenshot_ok: bool,
    pub annotate: bool,
    pub hang: bool,
    pub calls: Mutex<Vec<&'static str>>,
}

impl MockDevice {
    pub fn healthy() -> Self {
        Self {
            activity: Some("com.android.settings/.Settings".into()),
            tree: Some(SETTINGS_DUMP.into()),
            screenshot_ok: true,
            ..Default::default()
        }
    }

    pub fn broken() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
        if self.hang {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl DeviceBackend for MockDevice {
    async fn foreground_screen(&self) -> Result<String, CollaboratorError> {
        self.enter("foreground_screen").await;
        self.activity
            .clone()
            .ok_or_else(|| CollaboratorError::Unavailable("no activity".into()))
    }

    async fn dump_ui_tree(&self) -> Result<String, CollaboratorError> {
        self.enter("dump_ui_tree").await;
        self.tree
            .clone()
            .ok_or_else(|| CollaboratorError::Unavailable("no tree".into()))
    }

    async fn capture_screenshot(&self, dest: &Path) -> Result<(), CollaboratorError> {
        self.enter("capture_screenshot").await;
        if !self.screenshot_ok {
            return Err(CollaboratorError::CommandFailed {
                command: "screencap".into(),
                message: "device offline".into(),
            });
        }
        tokio::fs::write(dest, b"\x89PNG\r\n\x1a\n").await?;
        Ok(())
    }

    async fn annotate_screenshot(
        &self,
        src: &Path,
        dest: &Path,
        _action: &ClassifiedAction,
        _bounds: Option<&Bounds>,
    ) -> Result<(), CollaboratorError> {
        if !self.annotate {
            return Err(CollaboratorError::NotSupported("annotate_screenshot".into()));
        }
        self.enter("annotate_screenshot").await;
        tokio::fs::copy(src, dest).await?;
        Ok(())
    }
}

pub fn recording_config(records_dir: PathBuf) -> RecordingConfig {
    RecordingConfig {
        records_dir,
        settle_delay_ms: 0,
        collaborator_timeout_ms: 200,
    }
}
