//! Command output
//!
//! Human mode prints marked lines (`✓`, `✗`, `⚠`) with indented details.
//! JSON mode prints exactly one document per command on stdout, so details
//! are suppressed and notices go to stderr as JSON objects.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Writes command results in the selected format
#[derive(Debug, Clone, Copy)]
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("\u{2713} {message}"),
            OutputFormat::Json => {}
        }
    }

    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("\u{2717} {message}"),
            OutputFormat::Json => eprintln!("{}", notice("error", message)),
        }
    }

    pub fn warn(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("\u{26a0} {message}"),
            OutputFormat::Json => eprintln!("{}", notice("warning", message)),
        }
    }

    /// Indented detail line, human mode only
    pub fn detail(&self, message: &str) {
        if self.format == OutputFormat::Human {
            println!("  {message}");
        }
    }

    /// Prints `value` as the command's JSON document
    pub fn document<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn notice(level: &str, message: &str) -> serde_json::Value {
    serde_json::json!({ "level": level, "message": message })
}
