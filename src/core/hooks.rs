//! Per-level hook table
//!
//! One optional observer per level. Hooks run synchronously on the emitting
//! thread, before the entry is buffered, and receive a borrowed entry that is
//! only valid for the duration of the call.

use super::{log_entry::LogEntry, log_level::LogLevel};
use parking_lot::RwLock;
use std::sync::Arc;

/// Observer invoked with every accepted entry of one level.
pub type Hook = Arc<dyn Fn(&LogEntry) + Send + Sync>;

pub struct HookTable {
    slots: RwLock<[Option<Hook>; LogLevel::COUNT]>,
}

impl HookTable {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Default::default()),
        }
    }

    /// Install `hook` for `level`, replacing any previous hook for that level.
    /// Returns the replaced hook.
    pub fn install(&self, level: LogLevel, hook: Hook) -> Option<Hook> {
        self.slots.write()[level.index()].replace(hook)
    }

    /// Clear the slot for `level`. No-op if empty.
    pub fn uninstall(&self, level: LogLevel) -> Option<Hook> {
        self.slots.write()[level.index()].take()
    }

    pub fn is_installed(&self, level: LogLevel) -> bool {
        self.slots.read()[level.index()].is_some()
    }

    pub fn clear(&self) {
        *self.slots.write() = Default::default();
    }

    /// Run the hook for `entry.level()`, if any. Returns whether one ran.
    ///
    /// The hook is cloned out of the table before it is called, so a hook may
    /// install or uninstall hooks (including itself) without deadlocking, and
    /// a concurrent replacement never interrupts a call in flight.
    pub fn dispatch(&self, entry: &LogEntry) -> bool {
        let hook = self.slots.read()[entry.level().index()].clone();
        match hook {
            Some(hook) => {
                hook(entry);
                true
            }
            None => false,
        }
    }
}

impl Default for HookTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.read();
        let installed: Vec<LogLevel> = LogLevel::ALL
            .iter()
            .copied()
            .filter(|level| slots[level.index()].is_some())
            .collect();
        f.debug_struct("HookTable")
            .field("installed", &installed)
            .finish()
    }
}
