//! Log entry record

use super::layout::LineLayout;
use super::log_level::LogLevel;
use super::pool::Recycle;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;

// Thread-local caches for thread information to avoid repeated formatting
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn write_thread_id(out: &mut String) {
    THREAD_ID_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let id = cache.get_or_insert_with(|| format!("{:?}", std::thread::current().id()));
        out.push_str(id);
    })
}

fn write_thread_name(out: &mut Option<String>) {
    THREAD_NAME_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let name = cache.get_or_insert_with(|| std::thread::current().name().map(String::from));
        match (name.as_deref(), out.as_mut()) {
            (Some(name), Some(buf)) => buf.push_str(name),
            (Some(name), None) => *out = Some(name.to_string()),
            (None, _) => *out = None,
        }
    })
}

/// One emitted log record.
///
/// Entries are built by the logger from pooled storage and are read-only from
/// the moment they are handed to hooks and appenders. Appenders and hooks only
/// ever see `&LogEntry`.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    logger: String,
    level: LogLevel,
    tag: String,
    file: String,
    line: u32,
    message: String,
    timestamp: DateTime<Utc>,
    sequence: u64,
    thread_id: String,
    thread_name: Option<String>,
}

impl Default for LogEntry {
    fn default() -> Self {
        Self {
            logger: String::new(),
            level: LogLevel::default(),
            tag: String::new(),
            file: String::new(),
            line: 0,
            message: String::new(),
            timestamp: DateTime::<Utc>::default(),
            sequence: 0,
            thread_id: String::new(),
            thread_name: None,
        }
    }
}

impl Recycle for LogEntry {
    fn recycle(&mut self) {
        self.logger.clear();
        self.tag.clear();
        self.file.clear();
        self.message.clear();
        self.thread_id.clear();
        if let Some(name) = self.thread_name.as_mut() {
            name.clear();
        }
        self.line = 0;
        self.sequence = 0;
    }
}

impl LogEntry {
    /// Build a standalone entry stamped with the current time and thread.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        let mut entry = Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            ..Self::default()
        };
        write_thread_id(&mut entry.thread_id);
        write_thread_name(&mut entry.thread_name);
        entry
    }

    #[must_use]
    pub fn with_logger(mut self, logger: &str) -> Self {
        self.logger = logger.to_string();
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    #[must_use]
    pub fn with_location(mut self, file: &str, line: u32) -> Self {
        self.file = file.to_string();
        self.line = line;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Fill a recycled entry in place. `message` is swapped in, so the caller
    /// gets back the entry's previous (empty) buffer.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn populate(
        &mut self,
        logger: &str,
        level: LogLevel,
        tag: Option<&str>,
        file: &str,
        line: u32,
        message: &mut String,
        sequence: u64,
    ) {
        self.logger.push_str(logger);
        self.level = level;
        if let Some(tag) = tag {
            self.tag.push_str(tag);
        }
        self.file.push_str(file);
        self.line = line;
        std::mem::swap(&mut self.message, message);
        self.timestamp = Utc::now();
        self.sequence = sequence;
        write_thread_id(&mut self.thread_id);
        write_thread_name(&mut self.thread_name);
    }

    /// Name of the logger that emitted this entry
    pub fn logger(&self) -> &str {
        &self.logger
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn tag(&self) -> Option<&str> {
        (!self.tag.is_empty()).then_some(self.tag.as_str())
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Message length in bytes
    pub fn len(&self) -> usize {
        self.message.len()
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    /// Per-logger emission counter, starting at 1
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref().filter(|name| !name.is_empty())
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        LineLayout::default().write(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_has_no_tag_or_location() {
        let entry = LogEntry::new(LogLevel::Info, "hello");
        assert_eq!(entry.level(), LogLevel::Info);
        assert_eq!(entry.message(), "hello");
        assert_eq!(entry.len(), 5);
        assert_eq!(entry.tag(), None);
        assert_eq!(entry.file(), "");
        assert!(!entry.thread_id().is_empty());
    }

    #[test]
    fn test_populate_swaps_message_buffer() {
        let mut entry = LogEntry::default();
        let mut message = String::from("rendered text");
        entry.populate("root", LogLevel::Error, Some("db"), "main.rs", 7, &mut message, 3);

        assert!(message.is_empty());
        assert_eq!(entry.message(), "rendered text");
        assert_eq!(entry.logger(), "root");
        assert_eq!(entry.tag(), Some("db"));
        assert_eq!(entry.file(), "main.rs");
        assert_eq!(entry.line(), 7);
        assert_eq!(entry.sequence(), 3);
    }

    #[test]
    fn test_recycle_clears_but_keeps_capacity() {
        let mut entry = LogEntry::new(LogLevel::Warn, "x".repeat(128)).with_tag("tag");
        entry.recycle();
        assert!(entry.is_empty());
        assert_eq!(entry.tag(), None);
        assert!(entry.message.capacity() >= 128);
    }

    #[test]
    fn test_display_uses_default_layout() {
        let entry = LogEntry::new(LogLevel::Fatal, "boom").with_logger("core");
        let text = entry.to_string();
        assert!(text.contains("[FATAL]"));
        assert!(text.contains("[core]"));
        assert!(text.ends_with(" - boom"));
    }
}
