//! Appender implementations

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "file")]
pub mod file;
pub mod memory;

#[cfg(feature = "console")]
pub use console::ConsoleAppender;
#[cfg(feature = "file")]
pub use file::FileAppender;
pub use memory::MemoryAppender;

pub use crate::core::Appender;
