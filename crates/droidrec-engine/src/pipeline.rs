//! Reader and worker tasks.
//!
//! One task reads producer lines and forwards them over a bounded channel.
//! A single worker consumes that channel: it tokenizes, dispatches and
//! records each emitted action to completion before taking the next input.
//! Operator commands travel on the same channel so they are ordered with
//! respect to the event stream.

use crate::dispatcher::GestureDispatcher;
use crate::recorder::{RecorderStatus, StepRecorder};
use droidrec_common::protocol::{ActionLog, ClassifiedAction, Step};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Start { target: String },
    Finish,
    DeleteLast,
    /// Emit the pending key batch now.
    FinishInput,
    Status,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Started { record_dir: PathBuf, initial: Step },
    Finished(Option<ActionLog>),
    Deleted(Option<Step>),
    Flushed(Vec<Step>),
    Status(RecorderStatus),
    Failed(String),
}

pub enum PipelineInput {
    Line(String),
    EndOfStream,
    Control {
        command: OperatorCommand,
        reply: oneshot::Sender<CommandReply>,
    },
}

/// Notifications for a display collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    Recorded(Step),
    Deleted(Step),
    SessionStarted { target: String, record_dir: PathBuf },
    SessionFinished { target: Option<String>, steps: usize },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline worker has stopped")]
    WorkerGone,
}

/// Cloneable handle for operator intents and step notifications.
#[derive(Clone)]
pub struct PipelineHandle {
    input: mpsc::Sender<PipelineInput>,
    events: broadcast::Sender<StepEvent>,
    stop: Arc<AtomicBool>,
}

impl PipelineHandle {
    pub async fn send(&self, command: OperatorCommand) -> Result<CommandReply, PipelineError> {
        let (reply, rx) = oneshot::channel();
        self.input
            .send(PipelineInput::Control { command, reply })
            .await
            .map_err(|_| PipelineError::WorkerGone)?;
        rx.await.map_err(|_| PipelineError::WorkerGone)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StepEvent> {
        self.events.subscribe()
    }

    /// Ask the reader to stop once its current read returns.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

pub struct RunningPipeline {
    pub handle: PipelineHandle,
    /// Resolves to the number of lines read.
    pub reader: JoinHandle<std::io::Result<u64>>,
    /// Resolves to the recorder once every handle is dropped.
    pub worker: JoinHandle<StepRecorder>,
}

/// Start the reader and worker tasks over `source`.
pub fn launch<R>(
    source: R,
    dispatcher: GestureDispatcher,
    recorder: StepRecorder,
    line_buffer: usize,
) -> RunningPipeline
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (input_tx, input_rx) = mpsc::channel(line_buffer.max(1));
    let (events, _) = broadcast::channel(64);
    let stop = Arc::new(AtomicBool::new(false));

    let handle = PipelineHandle {
        input: input_tx.clone(),
        events: events.clone(),
        stop: stop.clone(),
    };

    let reader = tokio::spawn(read_lines(source, input_tx, stop));
    let worker = tokio::spawn(Worker::new(dispatcher, recorder, events).run(input_rx));

    RunningPipeline {
        handle,
        reader,
        worker,
    }
}

/// Forward producer lines until EOF, stop, or the worker going away.
pub async fn read_lines<R>(
    source: R,
    tx: mpsc::Sender<PipelineInput>,
    stop: Arc<AtomicBool>,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = source.lines();
    let mut count = 0u64;

    while !stop.load(Ordering::SeqCst) {
        let Some(line) = lines.next_line().await? else {
            info!("event producer closed its stream after {} lines", count);
            break;
        };
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        count += 1;
        if tx.send(PipelineInput::Line(line)).await.is_err() {
            debug!("worker gone, reader exiting");
            return Ok(count);
        }
    }

    let _ = tx.send(PipelineInput::EndOfStream).await;
    Ok(count)
}

pub struct Worker {
    dispatcher: GestureDispatcher,
    recorder: StepRecorder,
    events: broadcast::Sender<StepEvent>,
}

impl Worker {
    pub fn new(
        dispatcher: GestureDispatcher,
        recorder: StepRecorder,
        events: broadcast::Sender<StepEvent>,
    ) -> Self {
        Self {
            dispatcher,
            recorder,
            events,
        }
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<PipelineInput>) -> StepRecorder {
        while let Some(input) = rx.recv().await {
            match input {
                PipelineInput::Line(line) => {
                    let actions = self.dispatcher.process_line(&line);
                    self.record_all(actions).await;
                }
                PipelineInput::EndOfStream => {
                    let actions = self.dispatcher.finish_stream();
                    self.record_all(actions).await;
                }
                PipelineInput::Control { command, reply } => {
                    let outcome = self.handle(command).await;
                    let _ = reply.send(outcome);
                }
            }
        }
        self.recorder
    }

    async fn record_all(&mut self, actions: Vec<ClassifiedAction>) -> Vec<Step> {
        let mut recorded = Vec::new();
        for action in actions {
            match self.recorder.record(action).await {
                Ok(Some(step)) => {
                    let _ = self.events.send(StepEvent::Recorded(step.clone()));
                    recorded.push(step);
                }
                Ok(None) => {}
                Err(e) => error!("failed to record step: {}", e),
            }
        }
        recorded
    }

    async fn handle(&mut self, command: OperatorCommand) -> CommandReply {
        match command {
            OperatorCommand::Start { target } => {
                if self.recorder.is_recording() {
                    // The open session is sealed next; its typed keys go with it.
                    let actions = self.dispatcher.finish_input();
                    self.record_all(actions).await;
                } else {
                    self.discard_pending_input();
                }
                self.start(target).await
            }
            OperatorCommand::Finish => {
                // Keys typed right before finishing still belong to the session.
                let actions = self.dispatcher.finish_input();
                self.record_all(actions).await;
                match self.recorder.finish_session().await {
                    Ok(log) => {
                        if let Some(log) = &log {
                            let _ = self.events.send(StepEvent::SessionFinished {
                                target: log.target.clone(),
                                steps: log.action_count(),
                            });
                        }
                        CommandReply::Finished(log)
                    }
                    Err(e) => CommandReply::Failed(e.to_string()),
                }
            }
            OperatorCommand::DeleteLast => match self.recorder.delete_last().await {
                Ok(deleted) => {
                    if let Some(step) = &deleted {
                        let _ = self.events.send(StepEvent::Deleted(step.clone()));
                    }
                    CommandReply::Deleted(deleted)
                }
                Err(e) => CommandReply::Failed(e.to_string()),
            },
            OperatorCommand::FinishInput => {
                let actions = self.dispatcher.finish_input();
                CommandReply::Flushed(self.record_all(actions).await)
            }
            OperatorCommand::Status => CommandReply::Status(self.recorder.status()),
        }
    }

    async fn start(&mut self, target: String) -> CommandReply {
        match self.recorder.start_session(&target).await {
            Ok(initial) => {
                let record_dir = self
                    .recorder
                    .session()
                    .map(|s| s.store().root().to_path_buf())
                    .unwrap_or_default();
                let _ = self.events.send(StepEvent::SessionStarted {
                    target,
                    record_dir: record_dir.clone(),
                });
                CommandReply::Started {
                    record_dir,
                    initial,
                }
            }
            Err(e) => CommandReply::Failed(e.to_string()),
        }
    }

    /// Keys typed before a session starts are not part of it.
    fn discard_pending_input(&mut self) {
        let dropped = self.dispatcher.finish_input();
        if !dropped.is_empty() {
            debug!("discarding {} actions typed before the session", dropped.len());
        }
    }
}
