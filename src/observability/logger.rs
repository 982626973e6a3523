//! Structured diagnostic logging
//!
//! The checker and the validator trace their work through a [`Logger`]
//! handed to them by the caller. Nothing here is global: a run that is given
//! a [`NopLogger`] produces no output at all.
//!
//! [`JsonLogger`] writes one JSON object per line with deterministic key
//! ordering: `event` first, `severity` second, remaining fields sorted by key.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

/// Severity channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine tracing
    Default = 0,
    /// Noteworthy but expected
    Notice = 1,
    /// Progress of a run
    Info = 2,
    /// Rejected alternatives and similar recoverable conditions
    Warning = 3,
    /// Failures reported to the caller
    Error = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Default => "DEFAULT",
            Severity::Notice => "NOTICE",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sink for diagnostic events.
pub trait Logger {
    /// Records one event with its fields.
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]);

    fn default(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Default, event, fields);
    }

    fn notice(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Notice, event, fields);
    }

    fn info(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Info, event, fields);
    }

    fn warning(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Warning, event, fields);
    }

    fn error(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Error, event, fields);
    }
}

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopLogger;

impl Logger for NopLogger {
    fn log(&self, _severity: Severity, _event: &str, _fields: &[(&str, &str)]) {}
}

/// Logger writing JSON lines to a writer.
pub struct JsonLogger<W: Write> {
    writer: Mutex<W>,
    min_severity: Severity,
}

impl JsonLogger<io::Stderr> {
    /// Logs to stderr.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> JsonLogger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            min_severity: Severity::Default,
        }
    }

    /// Drops events below `severity`.
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Returns the writer, consuming the logger.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write> Logger for JsonLogger<W> {
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity < self.min_severity {
            return;
        }
        let line = format_line(severity, event, fields);
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Logging never fails the run.
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

/// One captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,
    pub event: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Returns the value of a field.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Logger keeping every event in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the captured events with the given name.
    pub fn events(&self, event: &str) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.event == event)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let entry = LogEntry {
            severity,
            event: event.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

/// Renders one event as a JSON line.
fn format_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(128);

    output.push('{');

    output.push_str("\"event\":\"");
    escape_json_string(&mut output, event);
    output.push('"');

    output.push_str(",\"severity\":\"");
    output.push_str(severity.as_str());
    output.push('"');

    let mut sorted_fields: Vec<_> = fields.iter().collect();
    sorted_fields.sort_by_key(|(k, _)| *k);

    for (key, value) in sorted_fields {
        output.push_str(",\"");
        escape_json_string(&mut output, key);
        output.push_str("\":\"");
        escape_json_string(&mut output, value);
        output.push('"');
    }

    output.push('}');
    output.push('\n');
    output
}

fn escape_json_string(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => {
                output.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let logger = JsonLogger::new(Vec::new());
        logger.log(severity, event, fields);
        String::from_utf8(logger.into_inner()).unwrap()
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Default < Severity::Notice);
        assert!(Severity::Notice < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_log_json_format() {
        let output = capture(Severity::Info, "CHECK_START", &[]);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "CHECK_START");
        assert_eq!(parsed["severity"], "INFO");
    }

    #[test]
    fn test_log_deterministic_ordering() {
        let output1 = capture(
            Severity::Info,
            "TEST",
            &[("zebra", "1"), ("apple", "2"), ("mango", "3")],
        );
        let output2 = capture(
            Severity::Info,
            "TEST",
            &[("apple", "2"), ("mango", "3"), ("zebra", "1")],
        );

        assert_eq!(output1, output2);

        let apple_pos = output1.find("apple").unwrap();
        let mango_pos = output1.find("mango").unwrap();
        let zebra_pos = output1.find("zebra").unwrap();
        assert!(apple_pos < mango_pos);
        assert!(mango_pos < zebra_pos);
    }

    #[test]
    fn test_log_escapes_special_chars() {
        let output = capture(
            Severity::Warning,
            "TEST",
            &[("message", "hello \"world\"\nline2")],
        );

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["message"], "hello \"world\"\nline2");
        assert_eq!(output.chars().filter(|c| *c == '\n').count(), 1);
    }

    #[test]
    fn test_min_severity_filters() {
        let logger = JsonLogger::new(Vec::new()).with_min_severity(Severity::Warning);
        logger.info("SKIPPED", &[]);
        logger.error("KEPT", &[]);
        let output = String::from_utf8(logger.into_inner()).unwrap();
        assert!(!output.contains("SKIPPED"));
        assert!(output.contains("KEPT"));
    }

    #[test]
    fn test_memory_logger_captures() {
        let logger = MemoryLogger::new();
        logger.notice("LEAF_SPAWN", &[("leaf", "3")]);
        logger.default("LEAF_FEED", &[]);

        let spawned = logger.events("LEAF_SPAWN");
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].severity, Severity::Notice);
        assert_eq!(spawned[0].field("leaf"), Some("3"));
        assert_eq!(logger.entries().len(), 2);
    }
}
