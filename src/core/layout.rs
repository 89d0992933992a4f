//! Text layout for rendered log lines
//!
//! Appenders share one way of turning a [`LogEntry`] into a line of text:
//!
//! ```text
//! [2025-01-08T10:30:45.123Z] [WARN ] [net] [conn] server.rs:42 - peer reset
//! ```
//!
//! Each bracketed section except the level and message can be switched off.
//! Control characters in the message are escaped so one entry always renders
//! as exactly one line.

use super::log_entry::LogEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Timestamp rendering options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,
    /// `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,
    /// `2025-01-08T10:30:45.123456+00:00`
    Rfc3339,
    /// Milliseconds since the Unix epoch
    UnixMillis,
    /// Any strftime-compatible pattern
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        let mut out = String::with_capacity(32);
        // Writing into a String cannot fail
        let _ = self.write(datetime, &mut out);
        out
    }

    pub fn write<W: Write>(&self, datetime: &DateTime<Utc>, out: &mut W) -> fmt::Result {
        match self {
            TimestampFormat::Iso8601 => write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            TimestampFormat::Iso8601Micros => {
                write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ"))
            }
            TimestampFormat::Rfc3339 => out.write_str(&datetime.to_rfc3339()),
            TimestampFormat::UnixMillis => write!(out, "{}", datetime.timestamp_millis()),
            TimestampFormat::Custom(pattern) => write!(out, "{}", datetime.format(pattern)),
        }
    }
}

/// Which sections a rendered line carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineLayout {
    pub timestamp_format: TimestampFormat,
    pub include_logger: bool,
    pub include_tag: bool,
    pub include_location: bool,
    pub include_thread: bool,
}

impl Default for LineLayout {
    fn default() -> Self {
        Self {
            timestamp_format: TimestampFormat::default(),
            include_logger: true,
            include_tag: true,
            include_location: true,
            include_thread: false,
        }
    }
}

impl LineLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_logger(mut self, include: bool) -> Self {
        self.include_logger = include;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, include: bool) -> Self {
        self.include_tag = include;
        self
    }

    #[must_use]
    pub fn with_location(mut self, include: bool) -> Self {
        self.include_location = include;
        self
    }

    #[must_use]
    pub fn with_thread(mut self, include: bool) -> Self {
        self.include_thread = include;
        self
    }

    /// Render `entry` without a trailing newline, with `level` substituted for
    /// the plain level name (appenders use this to colorize it).
    pub fn write_with_level<W: Write>(
        &self,
        entry: &LogEntry,
        level: &dyn fmt::Display,
        out: &mut W,
    ) -> fmt::Result {
        out.write_char('[')?;
        self.timestamp_format.write(entry.timestamp(), out)?;
        write!(out, "] [{}]", level)?;

        if self.include_logger && !entry.logger().is_empty() {
            write!(out, " [{}]", entry.logger())?;
        }
        if self.include_thread {
            write!(out, " [{}]", entry.thread_name().unwrap_or(entry.thread_id()))?;
        }
        if self.include_tag {
            if let Some(tag) = entry.tag() {
                write!(out, " [{}]", tag)?;
            }
        }
        if self.include_location && !entry.file().is_empty() {
            write!(out, " {}:{}", entry.file(), entry.line())?;
        }

        out.write_str(" - ")?;
        write_escaped(entry.message(), out)
    }

    pub fn write<W: Write>(&self, entry: &LogEntry, out: &mut W) -> fmt::Result {
        self.write_with_level(entry, &format_args!("{:5}", entry.level()), out)
    }

    #[must_use]
    pub fn render(&self, entry: &LogEntry) -> String {
        let mut line = String::with_capacity(64 + entry.len());
        let _ = self.write(entry, &mut line);
        line
    }
}

/// Escape line breaks and tabs so injected text cannot forge extra lines.
fn write_escaped<W: Write>(message: &str, out: &mut W) -> fmt::Result {
    let mut rest = message;
    while let Some(pos) = rest.find(['\n', '\r', '\t']) {
        out.write_str(&rest[..pos])?;
        match rest.as_bytes()[pos] {
            b'\n' => out.write_str("\\n")?,
            b'\r' => out.write_str("\\r")?,
            _ => out.write_str("\\t")?,
        }
        rest = &rest[pos + 1..];
    }
    out.write_str(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456)
    }

    #[test]
    fn test_timestamp_formats() {
        let dt = fixed_datetime();
        assert_eq!(TimestampFormat::Iso8601.format(&dt), "2025-01-08T10:30:45.123Z");
        assert_eq!(
            TimestampFormat::Iso8601Micros.format(&dt),
            "2025-01-08T10:30:45.123456Z"
        );
        assert!(TimestampFormat::Rfc3339.format(&dt).starts_with("2025-01-08T10:30:45"));
        assert_eq!(TimestampFormat::UnixMillis.format(&dt), "1736332245123");
        assert_eq!(
            TimestampFormat::Custom("%Y/%m/%d %H:%M".to_string()).format(&dt),
            "2025/01/08 10:30"
        );
    }

    #[test]
    fn test_render_full_line() {
        let entry = LogEntry::new(LogLevel::Warn, "peer reset")
            .with_logger("net")
            .with_tag("conn")
            .with_location("server.rs", 42)
            .with_timestamp(fixed_datetime());

        let line = LineLayout::default().render(&entry);
        assert_eq!(
            line,
            "[2025-01-08T10:30:45.123Z] [WARN ] [net] [conn] server.rs:42 - peer reset"
        );
    }

    #[test]
    fn test_render_minimal_line() {
        let entry = LogEntry::new(LogLevel::Info, "ready").with_timestamp(fixed_datetime());
        let layout = LineLayout::new()
            .with_timestamp_format(TimestampFormat::UnixMillis)
            .with_location(false);
        assert_eq!(layout.render(&entry), "[1736332245123] [INFO ] - ready");
    }

    #[test]
    fn test_render_escapes_line_breaks() {
        let entry = LogEntry::new(LogLevel::Info, "login\nERROR forged\tline\r");
        let line = LineLayout::default().render(&entry);
        assert!(line.ends_with("login\\nERROR forged\\tline\\r"));
        assert_eq!(line.lines().count(), 1);
    }
}
