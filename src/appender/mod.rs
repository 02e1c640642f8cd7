// src/appender/mod.rs
//! Framework bindings
//!
//! Every binding shares an [`AppenderCore`] and implements [`LogAppender`]:
//! `create_writer` opens the sink, `to_entry` turns one framework event into
//! an [`Entry`].
//!
//! - **TracingAppender**: `tracing_subscriber::Layer`
//! - **LogFacadeAppender**: `log::Log`
//!
//! The core serializes writers from concurrent application threads behind a
//! mutex so each entry lands as one record. Only the record write happens
//! under that mutex: formatting and compression run before it is taken, so
//! an event whose arguments log again on the same thread cannot deadlock.

pub mod log_facade;
pub mod tracing_layer;

pub use log_facade::LogFacadeAppender;
pub use tracing_layer::TracingAppender;

use crate::codec::{Codec, CodecRegistry};
use crate::entry::{current_thread_name, Entry, EntryWriter};
use crate::store::{BoxedSink, MmapAppender};
use crate::utils::config::AppenderConfig;
use crate::utils::errors::{LoggerError, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Crate-internal events are never fed back into an appender
pub(crate) const INTERNAL_TARGET: &str = "logbridge";

/// Builds the sink an appender writes to
pub type SinkFactory = Box<dyn Fn() -> Result<BoxedSink> + Send + Sync>;

/// State shared by all bindings
pub struct AppenderCore {
    config: AppenderConfig,
    codec: Arc<dyn Codec>,
    sink_factory: Option<SinkFactory>,
    writer: Mutex<Option<EntryWriter<BoxedSink>>>,
    started: AtomicBool,
}

impl AppenderCore {
    /// Fails when `content_encoding` is not in the registry
    pub fn new(config: AppenderConfig, registry: &CodecRegistry) -> Result<Self> {
        let codec = registry.find(&config.content_encoding)?;
        Ok(Self {
            config,
            codec,
            sink_factory: None,
            writer: Mutex::new(None),
            started: AtomicBool::new(false),
        })
    }

    /// Write to a custom sink instead of the configured file
    pub fn with_sink_factory(mut self, factory: SinkFactory) -> Self {
        self.sink_factory = Some(factory);
        self
    }

    pub fn config(&self) -> &AppenderConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Lock-free; safe to call from inside a logging call
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn open_sink(&self) -> Result<BoxedSink> {
        if let Some(factory) = &self.sink_factory {
            return factory();
        }

        let path = self.config.path.as_ref().ok_or_else(|| {
            LoggerError::config(format!(
                "Appender {} has no path and is not started",
                self.config.name
            ))
        })?;

        let sink = MmapAppender::open(path, self.config.initial_capacity)?;
        self.config.write_beside(path)?;
        Ok(Box::new(sink))
    }

    /// Build an entry from already formatted text, compressing it as configured
    pub fn entry(&self, level: i32, logger_name: &str, text: &str) -> Result<Entry> {
        let content = self.codec.compress(text.as_bytes())?;
        Entry::builder()
            .level(level)
            .thread_name(current_thread_name())
            .logger_name(logger_name)
            .content(content)
            .content_type(Some(self.config.content_type.clone()))
            .content_encoding(self.codec.name())
            .build()
    }

    fn install_writer(&self, writer: EntryWriter<BoxedSink>) {
        *self.writer.lock() = Some(writer);
        self.started.store(true, Ordering::Release);
        info!("Appender {} started", self.config.name);
    }

    fn stop(&self) -> Result<()> {
        let writer = self.writer.lock().take();
        self.started.store(false, Ordering::Release);
        if let Some(mut writer) = writer {
            writer.flush()?;
            info!(
                "Appender {} stopped after {} entries",
                self.config.name,
                writer.written()
            );
        }
        Ok(())
    }

    /// Append one finished entry; the writer lock is held only for the write
    pub fn write(&self, entry: &Entry) -> Result<()> {
        self.with_writer(|writer| writer.write(entry))
    }

    pub fn flush(&self) -> Result<()> {
        self.with_writer(|writer| writer.flush())
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut EntryWriter<BoxedSink>) -> Result<T>) -> Result<T> {
        let mut guard = self.writer.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| LoggerError::NotStarted(self.config.name.clone()))?;
        f(writer)
    }
}

impl fmt::Debug for AppenderCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppenderCore")
            .field("config", &self.config)
            .field("codec", &self.codec.name())
            .field("started", &self.is_started())
            .finish()
    }
}

/// A binding from one logging framework to the entry pipeline
pub trait LogAppender {
    /// The framework's event type
    type Event<'a>;

    fn core(&self) -> &AppenderCore;

    /// Open the sink entries are written to
    fn create_writer(&self) -> Result<EntryWriter<BoxedSink>> {
        Ok(EntryWriter::new(self.core().open_sink()?))
    }

    /// Translate one framework event into an entry
    ///
    /// Runs with no appender lock held; the event's own formatting may log.
    fn to_entry(&self, event: &Self::Event<'_>) -> Result<Entry>;

    fn start(&self) -> Result<()> {
        match self.create_writer() {
            Ok(writer) => {
                self.core().install_writer(writer);
                Ok(())
            }
            Err(e) => {
                error!("Appender {} failed to start: {}", self.core().name(), e);
                Err(e)
            }
        }
    }

    fn stop(&self) -> Result<()> {
        self.core().stop()
    }

    /// Append one event; fails with `NotStarted` before `start()`
    fn append(&self, event: &Self::Event<'_>) -> Result<()> {
        let entry = self.to_entry(event)?;
        self.core().write(&entry)
    }
}

/// Whether an event target belongs to this crate
pub(crate) fn is_internal(target: &str) -> bool {
    target == INTERNAL_TARGET || target.starts_with("logbridge::")
}

/// Report an append failure without going back through the logging stack
///
/// `NotStarted` is expected when an event races with `stop()` and is dropped
/// quietly.
pub(crate) fn report_failure(appender: &str, err: &LoggerError) {
    if matches!(err, LoggerError::NotStarted(_)) {
        return;
    }
    metrics::counter!("logbridge_append_failures_total").increment(1);
    eprintln!("logbridge: appender {} dropped an event: {}", appender, err);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::store::MemoryQueue;

    pub fn memory_core(queue: &MemoryQueue, encoding: &str) -> AppenderCore {
        let config = AppenderConfig {
            name: "test".to_string(),
            content_encoding: encoding.to_string(),
            ..Default::default()
        };
        let queue = queue.clone();
        AppenderCore::new(config, &CodecRegistry::with_defaults())
            .unwrap()
            .with_sink_factory(Box::new(move || Ok(Box::new(queue.appender()) as BoxedSink)))
    }
}
