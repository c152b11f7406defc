use std::io::{self, Write};

use serde::Serialize;

use crate::app::{FetchAction, ProgressEvent, ProgressSink, RunResult};

/// Prints per-record diagnostics to stdout; phase changes go to the log.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_summary(result: &RunResult) -> io::Result<()> {
        let fetch = &result.fetch;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "Index: {} ({} records)", result.summary_path, result.records)?;
        writeln!(
            stdout,
            "Fetched: {}  Unavailable: {}  Download failed: {}  Corrupt: {}",
            fetch.count(FetchAction::Fetched),
            fetch.count(FetchAction::Unavailable),
            fetch.count(FetchAction::DownloadFailed),
            fetch.count(FetchAction::Corrupt),
        )?;
        Ok(())
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase(message) => tracing::info!("{message}"),
            other => println!("{other}"),
        }
    }
}

/// Prints the run result as JSON on stdout. Per-record diagnostics go to
/// stderr so that stdout stays machine-readable.
pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase(message) => tracing::info!("{message}"),
            other => eprintln!("{other}"),
        }
    }
}
