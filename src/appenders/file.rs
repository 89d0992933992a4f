//! File appender implementation

use crate::core::{Appender, LineLayout, LogEntry, LoggerError, Result, TimestampFormat};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends rendered lines to a file through a write buffer.
///
/// A plain flush empties the buffer into the OS; a forced flush also syncs
/// the file to disk.
pub struct FileAppender {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    layout: LineLayout,
    line: String,
}

impl FileAppender {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::appender("file", format!("cannot open {}: {}", path.display(), e))
            })?;

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            layout: LineLayout::default(),
            line: String::with_capacity(256),
        })
    }

    /// Replace the line layout
    #[must_use]
    pub fn with_layout(mut self, layout: LineLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the timestamp format for this appender
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rust_async_logger::appenders::FileAppender;
    /// use rust_async_logger::TimestampFormat;
    ///
    /// let appender = FileAppender::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_timestamp_format(TimestampFormat::Rfc3339);
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.layout.timestamp_format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Appender for FileAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::appender("file", "writer already closed"))?;

        self.line.clear();
        let _ = self.layout.write(entry, &mut self.line);
        self.line.push('\n');

        writer.write_all(self.line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self, force: bool) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
            if force {
                writer.get_ref().sync_all()?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush(true);
        self.writer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lines_reach_disk_on_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut appender = FileAppender::new(&path).unwrap();

        appender
            .append(&LogEntry::new(LogLevel::Info, "first").with_logger("app"))
            .unwrap();
        appender
            .append(&LogEntry::new(LogLevel::Error, "second").with_logger("app"))
            .unwrap();
        appender.flush(true).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[INFO ] [app]") && lines[0].ends_with(" - first"));
        assert!(lines[1].contains("[ERROR]") && lines[1].ends_with(" - second"));
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "existing\n").unwrap();

        {
            let mut appender = FileAppender::new(&path).unwrap();
            appender.append(&LogEntry::new(LogLevel::Warn, "added")).unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("existing\n"));
        assert!(contents.trim_end().ends_with(" - added"));
    }

    #[test]
    fn test_unopenable_path_is_appender_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("app.log");
        assert!(matches!(
            FileAppender::new(path),
            Err(LoggerError::AppenderFailure { .. })
        ));
    }
}
