//! Step enrichment and the recording session lifecycle.
//!
//! Each classified action becomes a [`Step`]: it gets the next dense id, the
//! foreground screen, a UI tree snapshot, the smallest element under the
//! touch point and a screenshot, and the whole log is persisted before the
//! call returns. Collaborator failures only leave fields empty.

use crate::backend::{CollaboratorError, DeviceBackend};
use crate::config::RecordingConfig;
use crate::formatter::describe_step;
use crate::store::RecordStore;
use crate::uitree::smallest_containing;
use droidrec_common::error::StoreError;
use droidrec_common::protocol::{ActionLog, ClassifiedAction, Step};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// An open recording: the log plus where it is persisted.
#[derive(Debug)]
pub struct RecordingSession {
    log: ActionLog,
    store: RecordStore,
}

impl RecordingSession {
    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn next_step_id(&self) -> u32 {
        self.log.next_step_id()
    }

    /// Append `step` and persist. The in-memory log only changes once the
    /// document is on disk.
    async fn append(&mut self, step: Step) -> Result<(), StoreError> {
        self.log.steps.push(step);
        if let Err(e) = self.store.persist(&self.log).await {
            self.log.steps.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Pop the newest step and persist, restoring it if the write fails.
    async fn remove_last(&mut self) -> Result<Option<Step>, StoreError> {
        let Some(step) = self.log.steps.pop() else {
            return Ok(None);
        };
        if let Err(e) = self.store.persist(&self.log).await {
            self.log.steps.push(step);
            return Err(e);
        }
        Ok(Some(step))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecorderStatus {
    pub recording: bool,
    pub target: Option<String>,
    /// Number of action steps, step 0 excluded.
    pub step_count: usize,
    pub last_step: Option<Step>,
    pub record_dir: Option<PathBuf>,
}

pub struct StepRecorder {
    backend: Arc<dyn DeviceBackend>,
    config: RecordingConfig,
    session: Option<RecordingSession>,
}

impl StepRecorder {
    pub fn new(backend: Arc<dyn DeviceBackend>, config: RecordingConfig) -> Self {
        Self {
            backend,
            config,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn status(&self) -> RecorderStatus {
        match &self.session {
            Some(session) => RecorderStatus {
                recording: true,
                target: session.log.target.clone(),
                step_count: session.log.action_count(),
                last_step: session.log.last().cloned(),
                record_dir: Some(session.store.root().to_path_buf()),
            },
            None => RecorderStatus {
                recording: false,
                target: None,
                step_count: 0,
                last_step: None,
                record_dir: None,
            },
        }
    }

    /// Begin a new recording with `target` as its goal. An open session is
    /// sealed first. Step 0, the initial screen, is captured immediately.
    pub async fn start_session(&mut self, target: &str) -> Result<Step, StoreError> {
        if self.session.is_some() {
            warn!("starting a new session while one is open, sealing the old one");
            self.finish_session().await?;
        }

        let store = RecordStore::create(&self.config.records_dir).await?;
        let mut session = RecordingSession {
            log: ActionLog::new(Some(target.to_string())),
            store,
        };
        session.store.persist(&session.log).await?;
        info!("recording '{}' into {}", target, session.store.root().display());

        let initial = enrich(
            self.backend.as_ref(),
            self.config.collaborator_timeout(),
            &session,
            None,
        )
        .await;
        session.append(initial.clone()).await?;
        self.session = Some(session);
        Ok(initial)
    }

    /// Enrich and append `action`. Outside a session the action is only
    /// logged and no id is consumed.
    pub async fn record(&mut self, action: ClassifiedAction) -> Result<Option<Step>, StoreError> {
        let Some(session) = self.session.as_mut() else {
            debug!("not recording, skipping {}", action.action_type());
            return Ok(None);
        };

        let delay = self.config.settle_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let step = enrich(
            self.backend.as_ref(),
            self.config.collaborator_timeout(),
            session,
            Some(action),
        )
        .await;
        if let Err(e) = session.append(step.clone()).await {
            if let Err(cleanup) = session.store.discard_step_artifacts(step.step_id).await {
                warn!("failed to remove artifacts of step {}: {}", step.step_id, cleanup);
            }
            return Err(e);
        }
        info!("recorded {}", describe_step(&step));
        Ok(Some(step))
    }

    /// Drop the newest action step and its artifacts. The initial step is
    /// never removed; with nothing to delete this is a no-op.
    pub async fn delete_last(&mut self) -> Result<Option<Step>, StoreError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        if session.log.last().is_none_or(|step| step.is_initial()) {
            return Ok(None);
        }
        let Some(step) = session.remove_last().await? else {
            return Ok(None);
        };
        if let Err(e) = session.store.discard_step_artifacts(step.step_id).await {
            warn!("failed to remove artifacts of step {}: {}", step.step_id, e);
        }
        info!("deleted step {}", step.step_id);
        Ok(Some(step))
    }

    /// Seal the current session and hand back its final log.
    pub async fn finish_session(&mut self) -> Result<Option<ActionLog>, StoreError> {
        let Some(session) = self.session.take() else {
            return Ok(None);
        };
        session.store.persist(&session.log).await?;
        info!(
            "finished '{}' with {} steps",
            session.log.target.as_deref().unwrap_or_default(),
            session.log.action_count()
        );
        Ok(Some(session.log))
    }
}

async fn bounded<T>(
    operation: &'static str,
    timeout: Duration,
    call: impl Future<Output = Result<T, CollaboratorError>>,
) -> Option<T> {
    let result = match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::Timeout {
            operation,
            millis: timeout.as_millis() as u64,
        }),
    };
    match result {
        Ok(value) => Some(value),
        Err(CollaboratorError::NotSupported(_)) => {
            debug!("{} not supported by backend", operation);
            None
        }
        Err(e) => {
            warn!("{} unavailable: {}", operation, e);
            None
        }
    }
}

async fn enrich(
    backend: &dyn DeviceBackend,
    timeout: Duration,
    session: &RecordingSession,
    action: Option<ClassifiedAction>,
) -> Step {
    let step_id = session.next_step_id();
    let store = &session.store;
    let mut step = Step::new(step_id, action, RecordStore::screenshot_name(step_id));

    step.activity_info = bounded("foreground_screen", timeout, backend.foreground_screen()).await;

    let tree = bounded("dump_ui_tree", timeout, backend.dump_ui_tree()).await;
    if let Some(markup) = &tree {
        match store.write_ui_tree(step_id, markup).await {
            Ok(name) => step.ui_tree = Some(name),
            Err(e) => warn!("failed to save ui tree of step {}: {}", step_id, e),
        }
        if let Some(point) = step.action.as_ref().and_then(ClassifiedAction::point) {
            step.operated_bounds = smallest_containing(markup, point);
        }
    }

    let screenshot = store.screenshot_path(step_id);
    let captured = bounded(
        "capture_screenshot",
        timeout,
        backend.capture_screenshot(&screenshot),
    )
    .await
    .is_some();
    let captured = captured && screenshot_written(&screenshot).await;

    if captured && let Some(action) = &step.action {
        let processed = store.processed_screenshot_path(step_id);
        if bounded(
            "annotate_screenshot",
            timeout,
            backend.annotate_screenshot(
                &screenshot,
                &processed,
                action,
                step.operated_bounds.as_ref(),
            ),
        )
        .await
        .is_some()
        {
            step.processed_screen_shot = Some(RecordStore::processed_screenshot_name(step_id));
        }
    }

    step
}

async fn screenshot_written(path: &std::path::Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => true,
        _ => {
            warn!("screenshot {} is missing or empty", path.display());
            false
        }
    }
}
