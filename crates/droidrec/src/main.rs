mod console;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use droidrec_adb::AdbDevice;
use droidrec_engine::config::{ConfigLoader, DroidrecConfig};
use droidrec_engine::dispatcher::GestureDispatcher;
use droidrec_engine::formatter::format_log;
use droidrec_engine::normalizer::{CoordinateNormalizer, DeviceGeometry};
use droidrec_engine::pipeline::{self, CommandReply, OperatorCommand};
use droidrec_engine::recorder::StepRecorder;
use droidrec_engine::store::RecordStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "droidrec", version, about = "Record Android touch and key input as an action log")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Configuration file (defaults to ./droidrec.yaml, then ~/.droidrec/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Record a live device with the operator console on stdin
    Record {
        /// Device serial passed to adb
        #[arg(long)]
        serial: Option<String>,
        /// Start a session with this target right away
        #[arg(long)]
        target: Option<String>,
    },
    /// Classify a captured `getevent -lt` dump and print actions as JSON lines
    Parse {
        file: PathBuf,
        /// Screen size in pixels, e.g. 1080x2400
        #[arg(long, value_parser = parse_dimensions)]
        screen: Option<(u32, u32)>,
        /// Touch range of the digitizer, e.g. 4095x4095
        #[arg(long, value_parser = parse_dimensions)]
        touch_max: Option<(u32, u32)>,
    },
    /// Print a recorded action log
    Show { log: PathBuf },
}

fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    Ok((w, h))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await,
        None => ConfigLoader::load_default().await,
    }
    .context("failed to load configuration")?;

    match args.mode {
        Mode::Record { serial, target } => record(config, serial, target).await,
        Mode::Parse {
            file,
            screen,
            touch_max,
        } => parse(config, file, screen, touch_max).await,
        Mode::Show { log } => {
            let log = RecordStore::load(&log)
                .await
                .with_context(|| format!("failed to read {}", log.display()))?;
            println!("{}", format_log(&log));
            Ok(())
        }
    }
}

async fn record(
    mut config: DroidrecConfig,
    serial: Option<String>,
    target: Option<String>,
) -> anyhow::Result<()> {
    if serial.is_some() {
        config.device.serial = serial;
    }

    let device = AdbDevice::from_config(&config.device);
    let geometry = device
        .geometry(&config.device)
        .await
        .context("failed to probe device geometry")?;
    let dispatcher = GestureDispatcher::new(&config.gesture, CoordinateNormalizer::new(geometry)?);
    let recorder = StepRecorder::new(Arc::new(device.clone()), config.recording.clone());

    let mut stream = device
        .spawn_event_stream()
        .context("failed to start getevent")?;
    let running = pipeline::launch(
        stream.stdout,
        dispatcher,
        recorder,
        config.pipeline.line_buffer,
    );
    let handle = running.handle;
    let printer = console::spawn_step_printer(handle.subscribe());

    if let Some(target) = target {
        let reply = handle.send(OperatorCommand::Start { target }).await?;
        println!("{}", console::render_reply(&reply));
    }

    let outcome = console::run_console(&handle).await;

    match handle.send(OperatorCommand::Finish).await {
        Ok(reply @ CommandReply::Finished(Some(_))) => println!("{}", console::render_reply(&reply)),
        Ok(CommandReply::Failed(message)) => warn!("failed to finish session: {}", message),
        Ok(_) => {}
        Err(e) => warn!("{}", e),
    }

    handle.stop();
    if let Err(e) = stream.child.kill().await {
        warn!("failed to stop getevent: {}", e);
    }
    drop(handle);

    match running.reader.await {
        Ok(Ok(lines)) => info!("read {} event lines", lines),
        Ok(Err(e)) => warn!("event stream error: {}", e),
        Err(e) => warn!("reader task failed: {}", e),
    }
    running.worker.await.context("pipeline worker failed")?;
    printer.abort();

    outcome
}

async fn parse(
    config: DroidrecConfig,
    file: PathBuf,
    screen: Option<(u32, u32)>,
    touch_max: Option<(u32, u32)>,
) -> anyhow::Result<()> {
    let device = &config.device;
    let Some((screen_width, screen_height)) =
        screen.or(device.screen_width.zip(device.screen_height))
    else {
        bail!("screen size unknown, pass --screen WxH or set device.screen_width/height");
    };
    let (touch_max_x, touch_max_y) = touch_max.unwrap_or((
        device.touch_max_x.unwrap_or(device.default_touch_max),
        device.touch_max_y.unwrap_or(device.default_touch_max),
    ));

    let normalizer = CoordinateNormalizer::new(DeviceGeometry {
        screen_width,
        screen_height,
        touch_max_x,
        touch_max_y,
    })?;
    let mut dispatcher = GestureDispatcher::new(&config.gesture, normalizer);

    let source = tokio::fs::File::open(&file)
        .await
        .with_context(|| format!("failed to open {}", file.display()))?;
    let mut lines = BufReader::new(source).lines();
    let mut actions = Vec::new();
    while let Some(line) = lines.next_line().await? {
        actions.extend(dispatcher.process_line(&line));
    }
    actions.extend(dispatcher.finish_stream());

    for action in &actions {
        println!("{}", serde_json::to_string(action)?);
    }
    info!("{} actions classified", actions.len());
    Ok(())
}
