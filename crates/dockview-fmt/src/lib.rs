//! Log line formatting for `dockview-fmt`
//!
//! Structured (JSON object) log lines become `LEVEL HH:MM:SS message` with an
//! optional request suffix. Anything else passes through untouched.

use chrono::DateTime;
use crossterm::style::Stylize;
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};

/// Turns raw log lines into display lines
#[derive(Debug, Clone, Copy)]
pub struct LogFormatter {
    color: bool,
}

impl LogFormatter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Format one raw line. Blank lines produce nothing.
    pub fn format_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(entry)) => Some(self.format_entry(&entry)),
            _ => Some(line.to_string()),
        }
    }

    fn format_entry(&self, entry: &Map<String, Value>) -> String {
        let level = field(entry, "level").to_lowercase();
        let label = match level.as_str() {
            "error" => "ERROR".to_string(),
            "warn" | "warning" => "WARN ".to_string(),
            "info" => "INFO ".to_string(),
            "debug" => "DEBUG".to_string(),
            other => format!("{:<5}", other.to_uppercase()),
        };
        let time = clock_time(&field(entry, "timestamp"));
        let message = field(entry, "message");

        let mut extra = String::new();
        if is_set(entry.get("path")) {
            extra = format!(
                " ({} {} {} {}ms)",
                field(entry, "method"),
                field(entry, "path"),
                field(entry, "status"),
                field(entry, "db")
            );
        }

        if self.color {
            let label = match level.as_str() {
                "error" => label.dark_red(),
                "warn" | "warning" => label.dark_yellow(),
                "info" => label.dark_green(),
                _ => label.dark_cyan(),
            };
            format!("{} {} {}{}", label, time.dark_grey(), message, extra)
        } else {
            format!("{} {} {}{}", label, time, message, extra)
        }
    }
}

impl Default for LogFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Filter every line of `input` into `output`, flushing after each line
pub fn format_stream<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    formatter: &LogFormatter,
) -> io::Result<()> {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            // Binary garbage in a log stream is skipped, not fatal
            Err(e) if e.kind() == io::ErrorKind::InvalidData => continue,
            Err(e) => return Err(e),
        };
        if let Some(formatted) = formatter.format_line(&line) {
            writeln!(output, "{}", formatted)?;
            output.flush()?;
        }
    }
    Ok(())
}

/// String form of a field; missing and null fields are empty
fn field(entry: &Map<String, Value>, key: &str) -> String {
    match entry.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// `HH:MM:SS` of an RFC 3339 timestamp, or characters 11..19 of anything else
fn clock_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed.format("%H:%M:%S").to_string(),
        Err(_) => timestamp.chars().skip(11).take(8).collect(),
    }
}
