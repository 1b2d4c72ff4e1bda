//! Output formatting - plain ASCII terminal output
//!
//! Colors are only applied when the target stream is a terminal, so piped
//! output stays byte-for-byte stable.

use std::io::{self, IsTerminal};

use errcat_common::{format_record, ErrorRecord, LogSink};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Sink that writes dispatched messages to the console.
///
/// Errors and warnings go to stderr, info to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn error(&self, message: &str) {
        if io::stderr().is_terminal() {
            eprintln!("{}", message.trim_end().red());
        } else {
            eprintln!("{}", message.trim_end());
        }
    }

    fn warning(&self, message: &str) {
        if io::stderr().is_terminal() {
            eprintln!("{}", message.trim_end().yellow());
        } else {
            eprintln!("{}", message.trim_end());
        }
    }

    fn info(&self, message: &str) {
        println!("{}", message.trim_end());
    }
}

/// Print records separated by blank lines
pub fn display_records(records: &[ErrorRecord]) {
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", format_record(record));
    }
}

/// Print a labelled value, label dimmed on terminals
pub fn display_field(label: &str, value: &str) {
    let label = format!("{:<14}", format!("{}:", label));
    if io::stdout().is_terminal() {
        println!("{} {}", label.dimmed(), value);
    } else {
        println!("{} {}", label, value);
    }
}

/// Display an error
pub fn display_error(message: &str) {
    if io::stderr().is_terminal() {
        eprintln!("[ERROR] {}", message.red());
    } else {
        eprintln!("[ERROR] {}", message);
    }
}

/// Display a warning
pub fn display_warning(message: &str) {
    if io::stderr().is_terminal() {
        eprintln!("[WARNING] {}", message.yellow());
    } else {
        eprintln!("[WARNING] {}", message);
    }
}

/// Print any serializable value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
