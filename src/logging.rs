//! Structured event log for the wallet database layer.
//!
//! One log line = one JSON event, written synchronously with no buffering.
//! Keys are emitted in deterministic order (event, severity, then fields
//! sorted alphabetically) so log output is stable across runs. WARN and
//! above go to stderr, everything else to stdout.

use std::fmt;
use std::io::{self, Write};

/// Log severity. FATAL is reserved for conditions after which the wallet
/// must not continue serving (unrecoverable corruption of key material).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Emit one structured event line.
pub fn event(severity: Severity, name: &str, fields: &[(&str, &str)]) {
    if severity >= Severity::Warn {
        write_event(severity, name, fields, &mut io::stderr());
    } else {
        write_event(severity, name, fields, &mut io::stdout());
    }
}

pub fn info(name: &str, fields: &[(&str, &str)]) {
    event(Severity::Info, name, fields);
}

pub fn warn(name: &str, fields: &[(&str, &str)]) {
    event(Severity::Warn, name, fields);
}

pub fn error(name: &str, fields: &[(&str, &str)]) {
    event(Severity::Error, name, fields);
}

fn write_event<W: Write>(severity: Severity, name: &str, fields: &[(&str, &str)], out: &mut W) {
    let mut line = String::with_capacity(128);
    line.push_str("{\"event\":\"");
    escape_into(&mut line, name);
    line.push_str("\",\"severity\":\"");
    line.push_str(severity.as_str());
    line.push('"');

    let mut sorted: Vec<_> = fields.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);
    for (key, value) in sorted {
        line.push_str(",\"");
        escape_into(&mut line, key);
        line.push_str("\":\"");
        escape_into(&mut line, value);
        line.push('"');
    }

    line.push_str("}\n");

    // One write_all per event keeps lines intact across threads.
    let _ = out.write_all(line.as_bytes());
    let _ = out.flush();
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
}
