//! Interactive command protocol.
//!
//! One command per line:
//!
//! ```text
//! start | stop | status | help | exit
//! convert-json on|off
//! archive on|off
//! backup on|off
//! process <path>
//! export <format>
//! ```
//!
//! Anything else prints `unknown command` and changes nothing.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

use crate::control::FileProcessor;
use crate::lifecycle::{ProcessOutcome, WatchedFile};

pub const UNKNOWN_COMMAND: &str = "unknown command";

const HELP: &str = "\
Commands:
  start                  Start watching the input directory and scheduled exports
  stop                   Stop watching and scheduled exports
  convert-json on|off    Convert CSV input to JSON, spreadsheets to CSV
  archive on|off         Move processed files to the archive directory
  backup on|off          Back up files before processing
  process <path>         Process one file now
  export <format>        Export now (csv, json, xml, xlsx)
  status                 Show current settings
  exit                   Stop everything and quit";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    ConvertJson(bool),
    Archive(bool),
    Backup(bool),
    Process(PathBuf),
    Export(String),
    Status,
    Help,
    Exit,
    /// Unrecognised input, kept verbatim
    Unknown(String),
}

/// Whether the session should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

impl Command {
    /// Parse one line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match (head, rest) {
            ("start", "") => Some(Command::Start),
            ("stop", "") => Some(Command::Stop),
            ("status", "") => Some(Command::Status),
            ("help", "") => Some(Command::Help),
            ("exit", "") => Some(Command::Exit),
            ("convert-json", arg) => parse_switch(arg).map(Command::ConvertJson),
            ("archive", arg) => parse_switch(arg).map(Command::Archive),
            ("backup", arg) => parse_switch(arg).map(Command::Backup),
            ("process", arg) if !arg.is_empty() => Some(Command::Process(PathBuf::from(arg))),
            ("export", arg) if !arg.is_empty() => Some(Command::Export(arg.to_string())),
            _ => None,
        };

        Some(command.unwrap_or_else(|| Command::Unknown(line.to_string())))
    }
}

fn parse_switch(arg: &str) -> Option<bool> {
    match arg {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

/// Run one command against the processor, writing feedback to `out`.
pub async fn execute<W: Write>(
    processor: &mut FileProcessor,
    command: Command,
    out: &mut W,
) -> io::Result<Flow> {
    match command {
        Command::Start => match processor.start() {
            Ok(()) => writeln!(out, "Watching {}", processor.layout().input.display())?,
            Err(e) => writeln!(out, "Failed to start: {e}")?,
        },
        Command::Stop => {
            processor.stop().await;
            writeln!(out, "Stopped")?;
        }
        Command::ConvertJson(on) => {
            processor.set_convert_to_json(on);
            writeln!(out, "Convert to JSON: {}", switch_label(on))?;
        }
        Command::Archive(on) => {
            processor.set_archive_on_success(on);
            writeln!(out, "Archive: {}", switch_label(on))?;
        }
        Command::Backup(on) => {
            processor.set_backup_before_processing(on);
            writeln!(out, "Backups: {}", switch_label(on))?;
        }
        Command::Process(path) => {
            let lifecycle = Arc::clone(processor.lifecycle());
            match tokio::task::spawn_blocking(move || lifecycle.process(&path)).await {
                Ok(file) => writeln!(out, "{}", describe(&file))?,
                Err(e) => {
                    error!(error = %e, "manual processing task failed");
                    writeln!(out, "Processing failed: {e}")?;
                }
            }
        }
        Command::Export(format) => {
            let exporter = Arc::clone(processor.exporter());
            let result = tokio::task::spawn_blocking(move || exporter.manual_export(&format)).await;
            match result {
                Ok(Ok(path)) => writeln!(out, "Exported to {}", path.display())?,
                Ok(Err(e)) => {
                    error!(error = %e, "manual export failed");
                    writeln!(out, "Export failed: {e}")?;
                }
                Err(e) => writeln!(out, "Export failed: {e}")?,
            }
        }
        Command::Status => writeln!(out, "{}", processor.status())?,
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Exit => {
            processor.stop().await;
            writeln!(out, "Shutting down")?;
            return Ok(Flow::Exit);
        }
        Command::Unknown(_) => writeln!(out, "{UNKNOWN_COMMAND}")?,
    }
    Ok(Flow::Continue)
}

fn switch_label(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

/// One-line summary of a processed file.
pub fn describe(file: &WatchedFile) -> String {
    let path = file.path.display();
    match &file.outcome {
        ProcessOutcome::Pending => format!("{path}: pending"),
        ProcessOutcome::Skipped => format!("{path}: unknown format, left in place"),
        ProcessOutcome::Unhandled => format!("{path}: no handler for {}, left in place", file.tag),
        ProcessOutcome::Failed(e) => format!("{path}: failed: {e}"),
        ProcessOutcome::Processed {
            archived_to: Some(target),
        } => format!("{path}: processed, archived to {}", target.display()),
        ProcessOutcome::Processed { archived_to: None } => format!("{path}: processed"),
    }
}

/// Read commands from stdin until `exit` or end of input.
pub async fn run_interactive(processor: &mut FileProcessor) -> io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = io::stdout();

    writeln!(out, "=== Automatic file processor ===")?;
    writeln!(out, "Type 'help' for the list of commands")?;
    prompt(&mut out)?;

    while let Some(line) = lines.next_line().await? {
        if let Some(command) = Command::parse(&line) {
            if execute(processor, command, &mut out).await? == Flow::Exit {
                return Ok(());
            }
        }
        prompt(&mut out)?;
    }

    processor.stop().await;
    Ok(())
}

fn prompt<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\n> ")?;
    out.flush()
}
