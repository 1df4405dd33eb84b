//! On-disk layout of one recording:
//!
//! ```text
//! <records_dir>/record_<YYYYmmdd_HHMMSS>/
//!     record.json
//!     screenshots/step_<id>.png
//!     screenshots/step_<id>_processed.png
//!     ui/step_<id>.xml
//! ```

use droidrec_common::error::StoreError;
use droidrec_common::protocol::ActionLog;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const LOG_FILE: &str = "record.json";
const SCREENSHOTS_DIR: &str = "screenshots";
const UI_DIR: &str = "ui";

#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    /// Create a fresh, timestamped recording directory under `records_dir`.
    pub async fn create(records_dir: &Path) -> Result<Self, StoreError> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut root = records_dir.join(format!("record_{}", stamp));
        let mut suffix = 1;
        while fs::try_exists(&root).await? {
            root = records_dir.join(format!("record_{}_{}", stamp, suffix));
            suffix += 1;
        }
        Self::open(root).await
    }

    /// Use `root` as the recording directory, creating it if needed.
    pub async fn open(root: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(root.join(SCREENSHOTS_DIR)).await?;
        fs::create_dir_all(root.join(UI_DIR)).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    pub fn screenshot_name(step_id: u32) -> String {
        format!("step_{}.png", step_id)
    }

    pub fn processed_screenshot_name(step_id: u32) -> String {
        format!("step_{}_processed.png", step_id)
    }

    pub fn ui_tree_name(step_id: u32) -> String {
        format!("step_{}.xml", step_id)
    }

    pub fn screenshot_path(&self, step_id: u32) -> PathBuf {
        self.root
            .join(SCREENSHOTS_DIR)
            .join(Self::screenshot_name(step_id))
    }

    pub fn processed_screenshot_path(&self, step_id: u32) -> PathBuf {
        self.root
            .join(SCREENSHOTS_DIR)
            .join(Self::processed_screenshot_name(step_id))
    }

    pub fn ui_tree_path(&self, step_id: u32) -> PathBuf {
        self.root.join(UI_DIR).join(Self::ui_tree_name(step_id))
    }

    /// Rewrite the whole log. The document is written next to the target and
    /// renamed over it, so readers never see a partial file.
    pub async fn persist(&self, log: &ActionLog) -> Result<(), StoreError> {
        let json = log.to_json_pretty()?;
        let target = self.log_path();
        let tmp = self.root.join(format!("{}.tmp", LOG_FILE));
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &target).await?;
        debug!("persisted {} steps to {}", log.steps.len(), target.display());
        Ok(())
    }

    pub async fn write_ui_tree(&self, step_id: u32, markup: &str) -> Result<String, StoreError> {
        fs::write(self.ui_tree_path(step_id), markup).await?;
        Ok(Self::ui_tree_name(step_id))
    }

    /// Remove every artifact of a step. Missing files are fine.
    pub async fn discard_step_artifacts(&self, step_id: u32) -> Result<(), StoreError> {
        for path in [
            self.screenshot_path(step_id),
            self.processed_screenshot_path(step_id),
            self.ui_tree_path(step_id),
        ] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<ActionLog, StoreError> {
        let content = fs::read_to_string(path).await?;
        Ok(ActionLog::from_json(&content)?)
    }
}
