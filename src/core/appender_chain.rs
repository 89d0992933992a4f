//! Ordered fan-out over the logger's appenders
//!
//! Every node receives every entry in insertion order. Each node is isolated:
//! an `Err` or a panic from one appender is recorded against that node and
//! reported on stderr, and the walk continues with the next node.

use super::{appender::Appender, error::LoggerError, log_entry::LogEntry};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

struct AppenderNode {
    appender: Box<dyn Appender>,
    failures: u64,
    last_error: Option<String>,
}

impl AppenderNode {
    fn record_failure(&mut self, message: String) {
        self.failures += 1;
        self.last_error = Some(message);
    }
}

/// Per-node failure state, as reported by [`AppenderChain::health`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppenderHealth {
    pub name: String,
    pub failures: u64,
    pub last_error: Option<String>,
}

#[derive(Default)]
pub struct AppenderChain {
    nodes: Vec<AppenderNode>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

impl AppenderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the end of the chain; insertion order is delivery order.
    pub fn push(&mut self, appender: Box<dyn Appender>) {
        self.nodes.push(AppenderNode {
            appender,
            failures: 0,
            last_error: None,
        });
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|node| node.appender.name().to_string())
            .collect()
    }

    pub fn health(&self) -> Vec<AppenderHealth> {
        self.nodes
            .iter()
            .map(|node| AppenderHealth {
                name: node.appender.name().to_string(),
                failures: node.failures,
                last_error: node.last_error.clone(),
            })
            .collect()
    }

    /// Hand `entry` to every appender. Returns how many of them failed.
    pub fn deliver(&mut self, entry: &LogEntry) -> usize {
        let mut failed = 0;

        for (idx, node) in self.nodes.iter_mut().enumerate() {
            let result = catch_unwind(AssertUnwindSafe(|| node.appender.append(entry)));

            let failure = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => {
                    let err = match e {
                        LoggerError::AppenderFailure { .. } => e,
                        other => LoggerError::appender(node.appender.name(), other.to_string()),
                    };
                    eprintln!("[LOGGER ERROR] Appender #{} failed: {}", idx, err);
                    err.to_string()
                }
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    eprintln!(
                        "[LOGGER CRITICAL] Appender #{} ('{}') panicked: {}. \
                         Other appenders continue to function.",
                        idx,
                        node.appender.name(),
                        msg
                    );
                    msg
                }
            };

            node.record_failure(failure);
            failed += 1;
        }

        failed
    }

    /// Ask every appender to flush its own buffering. Returns the number of
    /// appenders whose flush failed.
    pub fn flush(&mut self, force: bool) -> usize {
        let mut failed = 0;

        for (idx, node) in self.nodes.iter_mut().enumerate() {
            let result = catch_unwind(AssertUnwindSafe(|| node.appender.flush(force)));
            let failure = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Appender #{} flush failed: {}", idx, e);
                    e.to_string()
                }
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    eprintln!(
                        "[LOGGER CRITICAL] Appender #{} panicked during flush: {}. \
                         Other appenders continue to function.",
                        idx, msg
                    );
                    msg
                }
            };

            node.record_failure(failure);
            failed += 1;
        }

        failed
    }

    /// Remove every appender from the chain, handing ownership back.
    pub fn detach(&mut self) -> Vec<Box<dyn Appender>> {
        self.nodes.drain(..).map(|node| node.appender).collect()
    }
}

impl std::fmt::Debug for AppenderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, Result};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Recording {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
        panic_on: Option<&'static str>,
    }

    impl Recording {
        fn new(name: &'static str, seen: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                seen: Arc::clone(seen),
                fail_on: None,
                panic_on: None,
            }
        }
    }

    impl Appender for Recording {
        fn append(&mut self, entry: &LogEntry) -> Result<()> {
            if self.panic_on == Some(entry.message()) {
                panic!("sink exploded");
            }
            if self.fail_on == Some(entry.message()) {
                return Err(LoggerError::other("disk full"));
            }
            self.seen
                .lock()
                .push(format!("{}:{}", self.name, entry.message()));
            Ok(())
        }

        fn flush(&mut self, _force: bool) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[test]
    fn test_delivery_follows_insertion_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut chain = AppenderChain::new();
        chain.push(Box::new(Recording::new("a", &seen)));
        chain.push(Box::new(Recording::new("b", &seen)));

        assert_eq!(chain.deliver(&LogEntry::new(LogLevel::Info, "m1")), 0);
        assert_eq!(*seen.lock(), vec!["a:m1", "b:m1"]);
        assert_eq!(chain.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_failing_node_does_not_stop_chain() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut chain = AppenderChain::new();
        let mut failing = Recording::new("a", &seen);
        failing.fail_on = Some("m2");
        chain.push(Box::new(failing));
        chain.push(Box::new(Recording::new("b", &seen)));

        let failures: usize = ["m1", "m2", "m3"]
            .iter()
            .map(|m| chain.deliver(&LogEntry::new(LogLevel::Info, *m)))
            .sum();

        assert_eq!(failures, 1);
        let b: Vec<_> = seen
            .lock()
            .iter()
            .filter(|s| s.starts_with("b:"))
            .cloned()
            .collect();
        assert_eq!(b, vec!["b:m1", "b:m2", "b:m3"]);

        let health = chain.health();
        assert_eq!(health[0].failures, 1);
        assert!(health[0].last_error.as_deref().unwrap().contains("disk full"));
        assert_eq!(health[1].failures, 0);
    }

    #[test]
    fn test_panicking_node_is_isolated() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut chain = AppenderChain::new();
        let mut panicking = Recording::new("a", &seen);
        panicking.panic_on = Some("boom");
        chain.push(Box::new(panicking));
        chain.push(Box::new(Recording::new("b", &seen)));

        assert_eq!(chain.deliver(&LogEntry::new(LogLevel::Fatal, "boom")), 1);
        assert_eq!(*seen.lock(), vec!["b:boom"]);
        assert_eq!(chain.health()[0].last_error.as_deref(), Some("sink exploded"));
    }

    #[test]
    fn test_detach_empties_chain() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut chain = AppenderChain::new();
        chain.push(Box::new(Recording::new("a", &seen)));
        let detached = chain.detach();
        assert_eq!(detached.len(), 1);
        assert!(chain.is_empty());
        assert_eq!(chain.deliver(&LogEntry::new(LogLevel::Info, "late")), 0);
        assert!(seen.lock().is_empty());
    }
}
