use async_trait::async_trait;
pub use droidrec_common::error::CollaboratorError;
use droidrec_common::protocol::{Bounds, ClassifiedAction};
use std::path::Path;

/// The external collaborators a recording session talks to. Implemented by
/// the adb device backend; tests and offline parsing use their own.
#[async_trait]
pub trait DeviceBackend: Send + Sync {
    /// Short identifier of the foreground screen (e.g. `package/.Activity`).
    async fn foreground_screen(&self) -> Result<String, CollaboratorError>;

    /// The current on-screen element tree as a markup document.
    async fn dump_ui_tree(&self) -> Result<String, CollaboratorError>;

    /// Capture the screen into `dest`. Must leave a non-empty file on success.
    async fn capture_screenshot(&self, dest: &Path) -> Result<(), CollaboratorError>;

    /// Draw an overlay of the action onto a copy of the screenshot.
    async fn annotate_screenshot(
        &self,
        _src: &Path,
        _dest: &Path,
        _action: &ClassifiedAction,
        _bounds: Option<&Bounds>,
    ) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::NotSupported("annotate_screenshot".into()))
    }
}

/// A backend with no device behind it; every query is unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

#[async_trait]
impl DeviceBackend for NullBackend {
    async fn foreground_screen(&self) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable("no device".into()))
    }

    async fn dump_ui_tree(&self) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable("no device".into()))
    }

    async fn capture_screenshot(&self, _dest: &Path) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unavailable("no device".into()))
    }
}
