//! Background flush driver
//!
//! A [`FlushRunner`] owns one thread that periodically calls
//! [`Logger::flush`] with `force = false` on every logger it drives. Loggers
//! wake it early when a producer fills a buffer to the high-water mark, so a
//! burst does not have to wait for the next tick.
//!
//! The runner never finalizes loggers; stop it first, then call
//! `Logger::finalize` for the final forced flush.

use super::error::Result;
use super::logger::Logger;
use crossbeam_channel::{bounded, select, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default shutdown timeout for runner cleanup (5 seconds)
///
/// Used when the runner is dropped without an explicit `stop()`.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default wait between two flush passes
pub const DEFAULT_TICK: Duration = Duration::from_millis(10);

pub struct FlushRunner {
    loggers: Vec<Arc<Logger>>,
    stop: Option<Sender<()>>,
    wake: Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FlushRunner {
    /// Start the flush thread for `loggers`, waking every `tick`.
    pub fn spawn(loggers: Vec<Arc<Logger>>, tick: Duration) -> Result<Self> {
        let (wake_tx, wake_rx) = bounded::<()>(1);
        let (stop_tx, stop_rx) = bounded::<()>(0);

        for logger in &loggers {
            logger.set_flush_signal(Some(wake_tx.clone()));
        }

        let wake = wake_tx.clone();
        let worker_loggers = loggers.clone();
        let spawned = thread::Builder::new()
            .name("log-flush".to_string())
            .spawn(move || {
                // Keeps the wake channel connected after loggers drop their
                // senders, so `recv(wake_rx)` never spins on disconnection.
                let _wake_tx = wake_tx;

                loop {
                    let stopping = select! {
                        recv(stop_rx) -> _ => true,
                        recv(wake_rx) -> _ => false,
                        default(tick) => false,
                    };
                    if stopping {
                        break;
                    }

                    for logger in &worker_loggers {
                        // An uninitialized logger simply has nothing to flush
                        let _ = logger.flush(false);
                    }
                }
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                for logger in &loggers {
                    logger.clear_flush_signal_if(&wake);
                }
                return Err(e.into());
            }
        };

        Ok(Self {
            loggers,
            stop: Some(stop_tx),
            wake,
            handle: Some(handle),
        })
    }

    pub fn loggers(&self) -> &[Arc<Logger>] {
        &self.loggers
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the flush thread, waiting up to `timeout` for it to exit.
    ///
    /// Returns `true` if the thread finished within the timeout.
    pub fn stop(&mut self, timeout: Duration) -> bool {
        // Closing the channel signals the worker
        drop(self.stop.take());

        // A later runner may own the logger's signal now
        for logger in &self.loggers {
            logger.clear_flush_signal_if(&self.wake);
        }

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!("[LOGGER ERROR] Flush thread panicked during shutdown: {:?}", e);
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Flush thread did not finish within {:?}; \
                     an appender may be blocked.",
                    timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Drop for FlushRunner {
    fn drop(&mut self) {
        self.stop(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}
