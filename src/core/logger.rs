//! Named logger engine
//!
//! A [`Logger`] is created uninitialized, bound to a name and a
//! [`LoggerConfig`] by [`Logger::initialize`], and torn down by
//! [`Logger::finalize`]. In between, any number of threads may emit entries
//! through it.
//!
//! Emission filters on the level threshold, renders the message into a pooled
//! buffer, builds a pooled [`LogEntry`], runs the hook installed for that
//! level, and then either delivers the entry to the appender chain right away
//! (synchronous loggers) or pushes it into the active half of a double buffer
//! (asynchronous loggers). Buffered entries reach the appenders when
//! [`Logger::flush`] is called, typically by a [`FlushRunner`].
//!
//! Locks are split by what they guard: the runtime slot (name, config, pools,
//! buffers), the double buffer's queue lock, the flush lock that serializes
//! swap-and-drain, the appender chain, and the hook table.
//!
//! [`FlushRunner`]: crate::core::FlushRunner

use super::{
    appender::Appender,
    appender_chain::{AppenderChain, AppenderHealth},
    config::LoggerConfig,
    double_buffer::DoubleBuffer,
    error::{LoggerError, Result},
    hooks::{Hook, HookTable},
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    pool::LogPools,
};
use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// State bound by `initialize` and released by `finalize`.
struct Runtime {
    name: String,
    config: LoggerConfig,
    pools: LogPools,
    buffers: DoubleBuffer,
}

struct FlushState {
    last_flush: Instant,
}

thread_local! {
    // Loggers whose appender chain this thread is currently walking
    static DELIVERING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks the current thread as delivering for one logger until dropped.
struct DeliveryGuard(usize);

impl DeliveryGuard {
    fn key(logger: &Logger) -> usize {
        logger as *const Logger as usize
    }

    /// `None` if this thread is already inside `logger`'s chain.
    fn enter(logger: &Logger) -> Option<Self> {
        let key = Self::key(logger);
        DELIVERING.with(|delivering| {
            let mut delivering = delivering.borrow_mut();
            if delivering.contains(&key) {
                return None;
            }
            delivering.push(key);
            Some(DeliveryGuard(key))
        })
    }

    fn is_delivering(logger: &Logger) -> bool {
        let key = Self::key(logger);
        DELIVERING.with(|delivering| delivering.borrow().contains(&key))
    }
}

impl Drop for DeliveryGuard {
    fn drop(&mut self) {
        DELIVERING.with(|delivering| {
            let mut delivering = delivering.borrow_mut();
            if let Some(pos) = delivering.iter().rposition(|key| *key == self.0) {
                delivering.swap_remove(pos);
            }
        })
    }
}

fn reentry_error(name: &str) -> LoggerError {
    LoggerError::other(format!(
        "re-entrant call on logger '{}' from inside its own appender chain",
        name
    ))
}

pub struct Logger {
    runtime: RwLock<Option<Arc<Runtime>>>,
    /// Survives `finalize` so errors can still name the logger
    name: RwLock<String>,
    level: AtomicU8,
    sequence: AtomicU64,
    flush_state: Mutex<FlushState>,
    appenders: Mutex<AppenderChain>,
    hooks: HookTable,
    flush_signal: Mutex<Option<Sender<()>>>,
    metrics: LoggerMetrics,
}

impl Logger {
    /// Create an uninitialized logger. Emission fails with `NotInitialized`
    /// until [`Logger::initialize`] succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runtime: RwLock::new(None),
            name: RwLock::new(String::new()),
            level: AtomicU8::new(LogLevel::default() as u8),
            sequence: AtomicU64::new(0),
            flush_state: Mutex::new(FlushState {
                last_flush: Instant::now(),
            }),
            appenders: Mutex::new(AppenderChain::new()),
            hooks: HookTable::new(),
            flush_signal: Mutex::new(None),
            metrics: LoggerMetrics::new(),
        }
    }

    /// Create and initialize in one step.
    pub fn with_config(name: impl Into<String>, config: LoggerConfig) -> Result<Self> {
        let logger = Self::new();
        logger.initialize(name, config)?;
        Ok(logger)
    }

    #[must_use]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    /// Bind name and configuration, and allocate the record pools.
    ///
    /// Fails with `AlreadyInitialized` on a live logger and with
    /// `InvalidConfiguration` if the config does not validate.
    pub fn initialize(&self, name: impl Into<String>, config: LoggerConfig) -> Result<()> {
        let mut slot = self.runtime.write();
        if let Some(runtime) = slot.as_ref() {
            return Err(LoggerError::already_initialized(runtime.name.clone()));
        }

        let name = name.into();
        if name.is_empty() {
            return Err(LoggerError::config("Logger", "name must not be empty"));
        }
        config.validate()?;

        self.level.store(config.level as u8, Ordering::Release);
        self.sequence.store(0, Ordering::Relaxed);
        self.flush_state.lock().last_flush = Instant::now();
        *self.name.write() = name.clone();

        *slot = Some(Arc::new(Runtime {
            pools: LogPools::new(config.pool_capacity, config.max_outstanding_entries),
            buffers: DoubleBuffer::new(config.high_water_mark),
            name,
            config,
        }));
        Ok(())
    }

    pub fn is_init(&self) -> bool {
        self.runtime.read_recursive().is_some()
    }

    /// Flush everything still buffered, detach the appenders and return to
    /// the uninitialized state. Calling it again is a no-op.
    ///
    /// Emissions already in progress complete first, and an in-flight flush
    /// finishes before the final forced one. Must not be called from a hook
    /// of this logger; from one of its appenders it is refused with a
    /// diagnostic.
    pub fn finalize(&self) {
        if DeliveryGuard::is_delivering(self) {
            eprintln!(
                "[LOGGER ERROR] Logger '{}' cannot be finalized from its own appender chain",
                self.name.read()
            );
            return;
        }

        // The write lock waits out every emission holding the read guard
        let Some(runtime) = self.runtime.write().take() else {
            return;
        };

        let _ = self.flush_runtime(&runtime, true);

        // Holding the flush lock keeps a runner that cloned the runtime
        // earlier from draining into a detached chain.
        let _state = self.flush_state.lock();
        let detached = self.appenders.lock().detach();
        drop(detached);
        self.hooks.clear();

        // Nothing should remain: producers push only under the read guard
        let stranded = runtime.buffers.clear();
        if stranded > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger '{}' finalized with {} entries emitted during teardown",
                runtime.name, stranded
            );
        }
    }

    fn runtime(&self) -> Result<Arc<Runtime>> {
        self.runtime
            .read_recursive()
            .clone()
            .ok_or_else(|| LoggerError::not_initialized(self.name.read().as_str()))
    }

    /// Run `f` with the runtime slot read-locked, so `finalize` cannot tear
    /// the runtime down underneath it. Recursive so a hook may log.
    fn with_runtime<R>(&self, f: impl FnOnce(&Runtime) -> Result<R>) -> Result<R> {
        let slot = self.runtime.read_recursive();
        let runtime = slot
            .as_deref()
            .ok_or_else(|| LoggerError::not_initialized(self.name.read().as_str()))?;
        f(runtime)
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_index(self.level.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Change the threshold. Takes effect for subsequent emissions.
    pub fn set_log_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Release);
    }

    /// Whether an entry at `level` would pass the threshold
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level as u8 >= self.level.load(Ordering::Relaxed)
    }

    pub fn is_take_over(&self) -> bool {
        self.runtime
            .read_recursive()
            .as_ref()
            .is_some_and(|runtime| runtime.config.take_over)
    }

    pub fn is_async_mode(&self) -> bool {
        self.runtime
            .read_recursive()
            .as_ref()
            .is_some_and(|runtime| runtime.config.async_mode)
    }

    pub fn config(&self) -> Option<LoggerConfig> {
        self.runtime
            .read_recursive()
            .as_ref()
            .map(|runtime| runtime.config.clone())
    }

    /// Handles to the record pools, for inspecting acquire/release counts.
    pub fn pools(&self) -> Option<LogPools> {
        self.runtime
            .read_recursive()
            .as_ref()
            .map(|runtime| runtime.pools.clone())
    }

    /// Entries buffered and not yet drained
    pub fn pending(&self) -> usize {
        self.runtime
            .read_recursive()
            .as_ref()
            .map_or(0, |runtime| runtime.buffers.len())
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    // ------------------------------------------------------------------
    // Hooks
    // ------------------------------------------------------------------

    /// Install `hook` for one level, replacing any hook already there.
    ///
    /// Accepts a [`LogLevel`] or a raw numeric level; a number outside the
    /// defined range fails with `InvalidLevel`.
    pub fn install_hook<L, F>(&self, level: L, hook: F) -> Result<()>
    where
        L: TryInto<LogLevel>,
        LoggerError: From<L::Error>,
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        let level = level.try_into()?;
        self.hooks.install(level, Arc::new(hook));
        Ok(())
    }

    pub fn uninstall_hook<L>(&self, level: L) -> Result<()>
    where
        L: TryInto<LogLevel>,
        LoggerError: From<L::Error>,
    {
        let level = level.try_into()?;
        self.hooks.uninstall(level);
        Ok(())
    }

    pub fn has_hook(&self, level: LogLevel) -> bool {
        self.hooks.is_installed(level)
    }

    // ------------------------------------------------------------------
    // Appenders
    // ------------------------------------------------------------------

    /// Append to the chain; appenders receive entries in the order added.
    pub fn add_appender(&self, appender: Box<dyn Appender>) {
        self.appenders.lock().push(appender);
    }

    pub fn appender_names(&self) -> Vec<String> {
        self.appenders.lock().names()
    }

    pub fn appender_health(&self) -> Vec<AppenderHealth> {
        self.appenders.lock().health()
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    #[inline]
    pub fn trace(&self, tag: Option<&str>, file: &str, line: u32, args: fmt::Arguments<'_>) -> Result<()> {
        self.output(LogLevel::Trace, tag, file, line, args)
    }

    #[inline]
    pub fn debug(&self, tag: Option<&str>, file: &str, line: u32, args: fmt::Arguments<'_>) -> Result<()> {
        self.output(LogLevel::Debug, tag, file, line, args)
    }

    #[inline]
    pub fn info(&self, tag: Option<&str>, file: &str, line: u32, args: fmt::Arguments<'_>) -> Result<()> {
        self.output(LogLevel::Info, tag, file, line, args)
    }

    #[inline]
    pub fn warn(&self, tag: Option<&str>, file: &str, line: u32, args: fmt::Arguments<'_>) -> Result<()> {
        self.output(LogLevel::Warn, tag, file, line, args)
    }

    #[inline]
    pub fn error(&self, tag: Option<&str>, file: &str, line: u32, args: fmt::Arguments<'_>) -> Result<()> {
        self.output(LogLevel::Error, tag, file, line, args)
    }

    #[inline]
    pub fn fatal(&self, tag: Option<&str>, file: &str, line: u32, args: fmt::Arguments<'_>) -> Result<()> {
        self.output(LogLevel::Fatal, tag, file, line, args)
    }

    /// Render `args` and emit at `level`.
    ///
    /// Below the threshold this returns `Ok(())` without rendering or
    /// touching the pools.
    pub fn output(
        &self,
        level: LogLevel,
        tag: Option<&str>,
        file: &str,
        line: u32,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        self.with_runtime(|runtime| {
            if !self.enabled(level) {
                self.metrics.record_filtered();
                return Ok(());
            }

            let mut message = runtime.pools.messages.acquire()?;
            match args.as_str() {
                Some(literal) => {
                    if let Err(e) = reserve(&mut message, literal.len()) {
                        self.metrics.record_dropped();
                        return Err(e);
                    }
                    message.push_str(literal);
                }
                None => {
                    if fmt::write(&mut *message, args).is_err() {
                        self.metrics.record_dropped();
                        return Err(LoggerError::other(
                            "a Display implementation returned an error",
                        ));
                    }
                }
            }

            self.emit(runtime, level, tag, file, line, &mut message)
        })
    }

    /// Emit an already rendered message, skipping format expansion.
    ///
    /// `len` limits how many bytes of `message` are used (rounded down to a
    /// character boundary); `None` takes the whole string.
    pub fn output_non_format(
        &self,
        level: LogLevel,
        tag: Option<&str>,
        file: &str,
        line: u32,
        message: &str,
        len: Option<usize>,
    ) -> Result<()> {
        self.with_runtime(|runtime| {
            if !self.enabled(level) {
                self.metrics.record_filtered();
                return Ok(());
            }

            let mut end = len.map_or(message.len(), |len| len.min(message.len()));
            while !message.is_char_boundary(end) {
                end -= 1;
            }

            let mut buffer = runtime.pools.messages.acquire()?;
            if let Err(e) = reserve(&mut buffer, end) {
                self.metrics.record_dropped();
                return Err(e);
            }
            buffer.push_str(&message[..end]);

            self.emit(runtime, level, tag, file, line, &mut buffer)
        })
    }

    fn emit(
        &self,
        runtime: &Runtime,
        level: LogLevel,
        tag: Option<&str>,
        file: &str,
        line: u32,
        message: &mut String,
    ) -> Result<()> {
        let mut entry = match runtime.pools.entries.acquire() {
            Ok(entry) => entry,
            Err(e) => {
                self.metrics.record_dropped();
                return Err(e);
            }
        };

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        entry.populate(&runtime.name, level, tag, file, line, message, sequence);
        self.metrics.record_accepted();

        if self.hooks.dispatch(&entry) {
            self.metrics.record_hook();
        }

        if runtime.config.async_mode {
            if runtime.buffers.push(entry) {
                self.signal_flush();
            }
        } else {
            // An appender logging through its own synchronous logger would
            // deadlock on the chain lock; the nested entry is dropped instead.
            let Some(_guard) = DeliveryGuard::enter(self) else {
                self.metrics.record_dropped();
                eprintln!(
                    "[LOGGER WARNING] Logger '{}' dropped an entry emitted by its own appender",
                    runtime.name
                );
                return Err(reentry_error(&runtime.name));
            };
            let failed = self.appenders.lock().deliver(&entry);
            self.metrics.record_appender_failures(failed);
            self.metrics.record_delivered();
        }
        Ok(())
    }

    fn signal_flush(&self) {
        if let Some(signal) = self.flush_signal.lock().as_ref() {
            // A pending signal already covers this one
            let _ = signal.try_send(());
        }
    }

    pub(crate) fn set_flush_signal(&self, signal: Option<Sender<()>>) {
        *self.flush_signal.lock() = signal;
    }

    /// Clear the wake signal only if it still belongs to `signal`'s channel.
    pub(crate) fn clear_flush_signal_if(&self, signal: &Sender<()>) {
        let mut current = self.flush_signal.lock();
        if current.as_ref().is_some_and(|s| s.same_channel(signal)) {
            *current = None;
        }
    }

    // ------------------------------------------------------------------
    // Flushing
    // ------------------------------------------------------------------

    /// Drain buffered entries to the appenders, then flush the appenders.
    ///
    /// Without `force`, nothing happens unless the flush interval has elapsed
    /// since the last flush or a buffer has reached the high-water mark.
    /// With `force`, both buffers are drained. Returns the number of entries
    /// delivered.
    ///
    /// Called from one of this logger's own appenders it fails instead of
    /// deadlocking.
    pub fn flush(&self, force: bool) -> Result<usize> {
        let runtime = self.runtime()?;
        self.flush_runtime(&runtime, force)
    }

    fn flush_runtime(&self, runtime: &Runtime, force: bool) -> Result<usize> {
        let Some(_guard) = DeliveryGuard::enter(self) else {
            return Err(reentry_error(&runtime.name));
        };
        let mut state = self.flush_state.lock();

        if !force {
            let due = state.last_flush.elapsed() >= runtime.config.flush_interval;
            if !due {
                if !runtime.buffers.over_high_water() {
                    return Ok(0);
                }
                self.metrics.record_high_water_flush();
            }
        }

        let mut delivered = self.drain_generation(runtime);
        if force {
            // Catch what producers pushed into the other queue meanwhile
            delivered += self.drain_generation(runtime);
        }

        self.flush_chain(force);
        state.last_flush = Instant::now();
        Ok(delivered)
    }

    /// Swap the buffers and deliver the detached generation. Callers hold the
    /// flush lock, so generations never interleave at the appenders.
    fn drain_generation(&self, runtime: &Runtime) -> usize {
        let mut generation = runtime.buffers.swap();
        let count = generation.len();

        if count > 0 {
            let mut chain = self.appenders.lock();
            for entry in generation.iter() {
                let failed = chain.deliver(entry);
                self.metrics.record_appender_failures(failed);
                self.metrics.record_delivered();
            }
            drop(chain);
            self.metrics.record_drain();
            generation.release();
        }

        runtime.buffers.restore(generation);
        count
    }

    /// Ask every appender to flush its own buffering, whether or not any
    /// entries were drained.
    pub fn flush_appenders(&self, force: bool) -> Result<()> {
        let Some(_guard) = DeliveryGuard::enter(self) else {
            return Err(reentry_error(&self.name.read()));
        };
        self.flush_chain(force);
        Ok(())
    }

    fn flush_chain(&self, force: bool) {
        let failed = self.appenders.lock().flush(force);
        self.metrics.record_appender_failures(failed);
    }
}

fn reserve(buffer: &mut String, additional: usize) -> Result<()> {
    buffer
        .try_reserve(additional)
        .map_err(|_| LoggerError::AllocationFailure {
            requested: additional,
        })
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.finalize();

        let dropped = self.metrics.dropped();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger '{}' dropped {} entries (drop rate: {:.2}%)",
                self.name.get_mut(),
                dropped,
                self.metrics.drop_rate()
            );
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &*self.name.read())
            .field("initialized", &self.is_init())
            .field("level", &self.log_level())
            .field("appenders", &*self.appenders.lock())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Builder for constructing an initialized Logger with a fluent API
///
/// # Example
/// ```
/// use rust_async_logger::prelude::*;
///
/// let logger = Logger::builder("net")
///     .level(LogLevel::Info)
///     .async_mode(false)
///     .appender(MemoryAppender::new())
///     .hook(LogLevel::Fatal, |entry: &LogEntry| eprintln!("fatal: {}", entry.message()))
///     .build()
///     .unwrap();
///
/// assert!(logger.is_init());
/// ```
pub struct LoggerBuilder {
    name: String,
    config: LoggerConfig,
    appenders: Vec<Box<dyn Appender>>,
    hooks: Vec<(LogLevel, Hook)>,
}

impl LoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: LoggerConfig::default(),
            appenders: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Replace the whole configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, enabled: bool) -> Self {
        self.config.async_mode = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: std::time::Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn hook<F>(mut self, level: LogLevel, hook: F) -> Self
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        let hook: Hook = Arc::new(hook);
        self.hooks.push((level, hook));
        self
    }

    pub fn build(self) -> Result<Logger> {
        let logger = Logger::with_config(self.name, self.config)?;
        for appender in self.appenders {
            logger.add_appender(appender);
        }
        for (level, hook) in self.hooks {
            logger.hooks.install(level, hook);
        }
        Ok(logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryAppender;
    use std::time::Duration;

    fn sync_logger(level: LogLevel) -> (Logger, MemoryAppender) {
        let memory = MemoryAppender::new();
        let logger = Logger::builder("test")
            .level(level)
            .async_mode(false)
            .appender(memory.clone())
            .build()
            .unwrap();
        (logger, memory)
    }

    #[test]
    fn test_uninitialized_logger_rejects_output() {
        let logger = Logger::new();
        assert!(!logger.is_init());
        let err = logger
            .info(None, file!(), line!(), format_args!("hello"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::NotInitialized { .. }));
        assert!(matches!(logger.flush(true), Err(LoggerError::NotInitialized { .. })));
    }

    #[test]
    fn test_double_initialize_fails() {
        let logger = Logger::new();
        logger.initialize("root", LoggerConfig::default()).unwrap();
        let err = logger.initialize("root", LoggerConfig::default()).unwrap_err();
        assert!(matches!(err, LoggerError::AlreadyInitialized { .. }));
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let logger = Logger::new();
        let config = LoggerConfig {
            high_water_mark: 0,
            ..LoggerConfig::default()
        };
        let err = logger.initialize("root", config).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(!logger.is_init());

        let err = logger.initialize("", LoggerConfig::default()).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_sync_output_reaches_appender_before_return() {
        let (logger, memory) = sync_logger(LogLevel::Debug);
        logger
            .warn(Some("disk"), "io.rs", 12, format_args!("{} free", "10%"))
            .unwrap();

        let entries = memory.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message(), "10% free");
        assert_eq!(entries[0].tag(), Some("disk"));
        assert_eq!(entries[0].file(), "io.rs");
        assert_eq!(entries[0].line(), 12);
        assert_eq!(entries[0].logger(), "test");
    }

    #[test]
    fn test_below_threshold_is_cheap_no_op() {
        let (logger, memory) = sync_logger(LogLevel::Info);
        logger.debug(None, "", 0, format_args!("hidden")).unwrap();

        assert!(memory.is_empty());
        let pools = logger.pools().unwrap();
        assert_eq!(pools.entries.acquired(), 0);
        assert_eq!(pools.messages.acquired(), 0);
        assert_eq!(logger.metrics().filtered(), 1);
    }

    #[test]
    fn test_set_log_level_changes_threshold() {
        let (logger, memory) = sync_logger(LogLevel::Error);
        logger.info(None, "", 0, format_args!("before")).unwrap();
        logger.set_log_level(LogLevel::Info);
        assert_eq!(logger.log_level(), LogLevel::Info);
        logger.info(None, "", 0, format_args!("after")).unwrap();
        assert_eq!(memory.messages(), vec!["after"]);
    }

    #[test]
    fn test_output_non_format_respects_length() {
        let (logger, memory) = sync_logger(LogLevel::Trace);
        logger
            .output_non_format(LogLevel::Info, None, "", 0, "abcdef", Some(3))
            .unwrap();
        logger
            .output_non_format(LogLevel::Info, None, "", 0, "{not a format}", None)
            .unwrap();
        // Length past a multi-byte char is rounded down
        logger
            .output_non_format(LogLevel::Info, None, "", 0, "aé", Some(2))
            .unwrap();
        logger
            .output_non_format(LogLevel::Info, None, "", 0, "short", Some(100))
            .unwrap();

        assert_eq!(memory.messages(), vec!["abc", "{not a format}", "a", "short"]);
    }

    #[test]
    fn test_async_entries_wait_for_flush() {
        let memory = MemoryAppender::new();
        let logger = Logger::builder("async")
            .flush_interval(Duration::from_secs(3600))
            .appender(memory.clone())
            .build()
            .unwrap();

        logger.info(None, "", 0, format_args!("one")).unwrap();
        logger.info(None, "", 0, format_args!("two")).unwrap();
        assert!(memory.is_empty());
        assert_eq!(logger.pending(), 2);

        // Interval not elapsed: gate stays closed
        assert_eq!(logger.flush(false).unwrap(), 0);
        assert!(memory.is_empty());

        assert_eq!(logger.flush(true).unwrap(), 2);
        assert_eq!(memory.messages(), vec!["one", "two"]);
        assert_eq!(logger.pending(), 0);
    }

    #[test]
    fn test_draining_empty_buffer_twice_is_idempotent() {
        let memory = MemoryAppender::new();
        let logger = Logger::builder("idem")
            .appender(memory.clone())
            .build()
            .unwrap();
        logger.error(None, "", 0, format_args!("x")).unwrap();

        assert_eq!(logger.flush(true).unwrap(), 1);
        assert_eq!(logger.flush(true).unwrap(), 0);
        assert_eq!(memory.len(), 1);
        assert_eq!(logger.metrics().drains(), 1);
    }

    #[test]
    fn test_entries_are_released_to_pool_after_drain() {
        let logger = Logger::builder("pool").build().unwrap();
        for i in 0..5 {
            logger.info(None, "", 0, format_args!("{}", i)).unwrap();
        }
        let pools = logger.pools().unwrap();
        assert_eq!(pools.entries.outstanding(), 5);

        logger.flush(true).unwrap();
        assert_eq!(pools.entries.outstanding(), 0);
        assert_eq!(pools.entries.acquired(), 5);
        assert_eq!(pools.entries.released(), 5);
        assert_eq!(pools.messages.outstanding(), 0);
    }

    #[test]
    fn test_high_water_mark_opens_flush_gate() {
        let memory = MemoryAppender::new();
        let config = LoggerConfig::builder()
            .flush_interval(Duration::from_secs(3600))
            .high_water_mark(3)
            .build()
            .unwrap();
        let logger = Logger::builder("hw")
            .config(config)
            .appender(memory.clone())
            .build()
            .unwrap();

        logger.info(None, "", 0, format_args!("1")).unwrap();
        logger.info(None, "", 0, format_args!("2")).unwrap();
        assert_eq!(logger.flush(false).unwrap(), 0);

        logger.info(None, "", 0, format_args!("3")).unwrap();
        assert_eq!(logger.flush(false).unwrap(), 3);
        assert_eq!(logger.metrics().high_water_flushes(), 1);
        assert_eq!(memory.len(), 3);
    }

    #[test]
    fn test_pool_exhaustion_drops_entry() {
        let config = LoggerConfig::builder()
            .max_outstanding_entries(2)
            .flush_interval(Duration::from_secs(3600))
            .build()
            .unwrap();
        let logger = Logger::with_config("tight", config).unwrap();

        logger.info(None, "", 0, format_args!("a")).unwrap();
        logger.info(None, "", 0, format_args!("b")).unwrap();
        let err = logger.info(None, "", 0, format_args!("c")).unwrap_err();
        assert!(matches!(err, LoggerError::PoolExhausted { .. }));
        assert_eq!(logger.metrics().dropped(), 1);

        logger.flush(true).unwrap();
        assert!(logger.info(None, "", 0, format_args!("d")).is_ok());
    }

    #[test]
    fn test_hooks_by_level() {
        use std::sync::atomic::AtomicUsize;

        let (logger, _memory) = sync_logger(LogLevel::Trace);
        let fatal_hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fatal_hits);
        logger
            .install_hook(LogLevel::Fatal, move |entry: &LogEntry| {
                assert_eq!(entry.level(), LogLevel::Fatal);
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        logger.error(None, "", 0, format_args!("not observed")).unwrap();
        logger.fatal(None, "", 0, format_args!("observed")).unwrap();
        assert_eq!(fatal_hits.load(Ordering::SeqCst), 1);

        logger.uninstall_hook(LogLevel::Fatal).unwrap();
        logger.fatal(None, "", 0, format_args!("after uninstall")).unwrap();
        assert_eq!(fatal_hits.load(Ordering::SeqCst), 1);
        assert_eq!(logger.metrics().hook_invocations(), 1);
    }

    #[test]
    fn test_raw_hook_level_validation() {
        let logger = Logger::new();
        assert!(logger.install_hook(4, |_: &LogEntry| {}).is_ok());
        assert!(logger.has_hook(LogLevel::Error));
        assert!(matches!(
            logger.install_hook(17, |_: &LogEntry| {}),
            Err(LoggerError::InvalidLevel(17))
        ));
        assert!(matches!(
            logger.uninstall_hook(-2),
            Err(LoggerError::InvalidLevel(-2))
        ));
    }

    #[test]
    fn test_finalize_flushes_and_is_idempotent() {
        let memory = MemoryAppender::new();
        let logger = Logger::builder("fin")
            .flush_interval(Duration::from_secs(3600))
            .appender(memory.clone())
            .build()
            .unwrap();
        for i in 0..3 {
            logger.info(None, "", 0, format_args!("pending {}", i)).unwrap();
        }

        logger.finalize();
        assert_eq!(memory.len(), 3);
        assert!(!logger.is_init());
        assert!(logger.appender_names().is_empty());

        logger.finalize();
        assert!(matches!(
            logger.info(None, "", 0, format_args!("late")),
            Err(LoggerError::NotInitialized { .. })
        ));
    }

    #[test]
    fn test_finalize_waits_for_in_flight_emission() {
        use crossbeam_channel::bounded;
        use std::thread;

        let memory = MemoryAppender::new();
        let logger = Arc::new(
            Logger::builder("inflight")
                .flush_interval(Duration::from_secs(3600))
                .appender(memory.clone())
                .build()
                .unwrap(),
        );

        // The hook parks the producer inside emission until released
        let (entered_tx, entered_rx) = bounded::<()>(1);
        let (release_tx, release_rx) = bounded::<()>(1);
        logger
            .install_hook(LogLevel::Error, move |_: &LogEntry| {
                entered_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            })
            .unwrap();

        let producer = {
            let logger = Arc::clone(&logger);
            thread::spawn(move || logger.error(None, "", 0, format_args!("racing teardown")))
        };
        entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();

        let finalizer = {
            let logger = Arc::clone(&logger);
            thread::spawn(move || logger.finalize())
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!finalizer.is_finished(), "finalize must wait for the emission");

        release_tx.send(()).unwrap();
        assert!(producer.join().unwrap().is_ok());
        finalizer.join().unwrap();

        assert_eq!(memory.messages(), vec!["racing teardown"]);
        assert!(!logger.is_init());
    }

    #[test]
    fn test_hook_may_log_through_its_logger() {
        let (logger, memory) = sync_logger(LogLevel::Trace);
        let logger = Arc::new(logger);
        let inner = Arc::downgrade(&logger);
        logger
            .install_hook(LogLevel::Fatal, move |_: &LogEntry| {
                if let Some(logger) = inner.upgrade() {
                    logger.info(None, "", 0, format_args!("reported")).unwrap();
                }
            })
            .unwrap();

        logger.fatal(None, "", 0, format_args!("crash")).unwrap();
        assert_eq!(memory.messages(), vec!["reported", "crash"]);
    }

    /// Logs through the logger that owns it
    struct EchoAppender {
        logger: Arc<Mutex<Option<Arc<Logger>>>>,
        nested: Arc<Mutex<Vec<bool>>>,
    }

    impl Appender for EchoAppender {
        fn append(&mut self, entry: &LogEntry) -> Result<()> {
            if entry.message() == "outer" {
                if let Some(logger) = self.logger.lock().as_ref() {
                    let logged = logger.info(None, "", 0, format_args!("inner")).is_ok();
                    let flushed = logger.flush(true).is_ok();
                    let chain_flushed = logger.flush_appenders(false).is_ok();
                    self.nested.lock().extend([logged, flushed, chain_flushed]);
                }
            }
            Ok(())
        }

        fn flush(&mut self, _force: bool) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_appender_reentry_is_refused_not_deadlocked() {
        let (logger, memory) = sync_logger(LogLevel::Trace);
        let logger = Arc::new(logger);
        let slot = Arc::new(Mutex::new(Some(Arc::clone(&logger))));
        let nested = Arc::new(Mutex::new(Vec::new()));
        logger.add_appender(Box::new(EchoAppender {
            logger: Arc::clone(&slot),
            nested: Arc::clone(&nested),
        }));

        logger.info(None, "", 0, format_args!("outer")).unwrap();

        assert_eq!(*nested.lock(), vec![false, false, false]);
        assert_eq!(memory.messages(), vec!["outer"]);
        assert_eq!(logger.metrics().dropped(), 1);

        // Outside the chain the same calls work again
        assert!(logger.flush_appenders(true).is_ok());
        slot.lock().take();
    }

    #[test]
    fn test_reinitialize_after_finalize() {
        let logger = Logger::with_config("again", LoggerConfig::default()).unwrap();
        logger.finalize();
        logger.initialize("again", LoggerConfig::default()).unwrap();
        assert!(logger.is_init());
        assert_eq!(logger.name(), "again");
    }

    #[test]
    fn test_config_accessors() {
        let config = LoggerConfig::builder()
            .take_over(true)
            .async_mode(false)
            .build()
            .unwrap();
        let logger = Logger::with_config("root", config.clone()).unwrap();
        assert!(logger.is_take_over());
        assert!(!logger.is_async_mode());
        assert_eq!(logger.config(), Some(config));
        assert_eq!(logger.name(), "root");
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let (logger, memory) = sync_logger(LogLevel::Trace);
        for _ in 0..3 {
            logger.trace(None, "", 0, format_args!("tick")).unwrap();
        }
        let sequences: Vec<u64> = memory.entries().iter().map(|e| e.sequence()).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }
}
