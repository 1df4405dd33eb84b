use droidrec_engine::formatter::{describe_step, format_log};
use droidrec_engine::pipeline::{CommandReply, OperatorCommand, PipelineHandle, StepEvent};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const BANNER: &[&str] = &[
    "Recording console. Commands:",
    "  start <target>   begin a session with the given goal",
    "  finish           seal the current session",
    "  undo             delete the last recorded step",
    "  flush            emit typed keys now",
    "  status           show the current session",
    "  quit             finish and exit",
];

const PROMPT: &str = "> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Operator(OperatorCommand),
    Help,
    Quit,
}

/// Map an input line onto a console command.
pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word {
        "start" => {
            if rest.is_empty() {
                return Err("usage: start <target>".to_string());
            }
            Ok(ConsoleCommand::Operator(OperatorCommand::Start {
                target: rest.to_string(),
            }))
        }
        "finish" | "end" => Ok(ConsoleCommand::Operator(OperatorCommand::Finish)),
        "undo" | "delete" => Ok(ConsoleCommand::Operator(OperatorCommand::DeleteLast)),
        "flush" => Ok(ConsoleCommand::Operator(OperatorCommand::FinishInput)),
        "status" => Ok(ConsoleCommand::Operator(OperatorCommand::Status)),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        other => Err(format!("unknown command '{}', try 'help'", other)),
    }
}

pub fn render_reply(reply: &CommandReply) -> String {
    match reply {
        CommandReply::Started {
            record_dir,
            initial,
        } => format!(
            "Recording into {}\n{}",
            record_dir.display(),
            describe_step(initial)
        ),
        CommandReply::Finished(Some(log)) => format!("Session finished\n{}", format_log(log)),
        CommandReply::Finished(None) => "No session to finish".to_string(),
        CommandReply::Deleted(Some(step)) => format!("Deleted step {}", step.step_id),
        CommandReply::Deleted(None) => "Nothing to delete".to_string(),
        CommandReply::Flushed(steps) if steps.is_empty() => "No pending input".to_string(),
        CommandReply::Flushed(steps) => steps
            .iter()
            .map(describe_step)
            .collect::<Vec<_>>()
            .join("\n"),
        CommandReply::Status(status) if !status.recording => "Not recording".to_string(),
        CommandReply::Status(status) => {
            let mut output = format!(
                "Recording '{}' ({} steps)",
                status.target.as_deref().unwrap_or_default(),
                status.step_count
            );
            if let Some(dir) = &status.record_dir {
                output.push_str(&format!("\nDirectory: {}", dir.display()));
            }
            if let Some(step) = &status.last_step {
                output.push_str(&format!("\nLast: {}", describe_step(step)));
            }
            output
        }
        CommandReply::Failed(message) => format!("Error: {}", message),
    }
}

/// Print steps as the worker records them.
pub fn spawn_step_printer(mut events: broadcast::Receiver<StepEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StepEvent::Recorded(step)) => println!("{}", describe_step(&step)),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    eprintln!("({} step notifications dropped)", missed)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

enum ReadLineResult {
    Input(String),
    Skip,
    Exit,
    Error(io::Error),
}

fn classify_line(result: Result<Option<String>, io::Error>) -> ReadLineResult {
    match result {
        Ok(Some(input)) => {
            let trimmed = input.trim().to_string();
            if trimmed.is_empty() {
                ReadLineResult::Skip
            } else {
                ReadLineResult::Input(trimmed)
            }
        }
        Ok(None) => ReadLineResult::Exit,
        Err(e) => ReadLineResult::Error(e),
    }
}

/// Run the operator console on stdin until `quit`, EOF or ctrl-c.
pub async fn run_console(handle: &PipelineHandle) -> anyhow::Result<()> {
    for line in BANNER {
        println!("{}", line);
    }

    let mut reader = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        print!("{}", PROMPT);
        stdout.flush()?;

        let read = tokio::select! {
            line = reader.next_line() => classify_line(line),
            _ = tokio::signal::ctrl_c() => {
                println!();
                ReadLineResult::Exit
            }
        };

        match read {
            ReadLineResult::Input(line) => match parse_command(&line) {
                Ok(ConsoleCommand::Operator(command)) => {
                    let reply = handle.send(command).await?;
                    println!("{}", render_reply(&reply));
                }
                Ok(ConsoleCommand::Help) => {
                    for line in BANNER {
                        println!("{}", line);
                    }
                }
                Ok(ConsoleCommand::Quit) => break,
                Err(message) => eprintln!("{}", message),
            },
            ReadLineResult::Skip => continue,
            ReadLineResult::Exit => break,
            ReadLineResult::Error(e) => return Err(e.into()),
        }
    }
    Ok(())
}
