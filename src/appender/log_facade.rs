// src/appender/log_facade.rs
//! `log` facade binding

use crate::appender::{is_internal, report_failure, AppenderCore, LogAppender};
use crate::codec::CodecRegistry;
use crate::entry::{level, Entry};
use crate::utils::config::AppenderConfig;
use crate::utils::errors::{LoggerError, Result};
use log::{LevelFilter, Log, Metadata, Record};

/// Map a `log` level onto the numeric entry scale
pub fn level_of(value: log::Level) -> i32 {
    match value {
        log::Level::Error => level::ERROR,
        log::Level::Warn => level::WARN,
        log::Level::Info => level::INFO,
        log::Level::Debug => level::DEBUG,
        log::Level::Trace => level::TRACE,
    }
}

/// `log::Log` implementation writing records as entries
#[derive(Debug)]
pub struct LogFacadeAppender {
    core: AppenderCore,
    max_level: LevelFilter,
}

impl LogFacadeAppender {
    pub fn new(config: AppenderConfig, registry: &CodecRegistry) -> Result<Self> {
        Ok(Self::from_core(AppenderCore::new(config, registry)?))
    }

    pub fn from_core(core: AppenderCore) -> Self {
        Self {
            core,
            max_level: LevelFilter::Trace,
        }
    }

    pub fn with_max_level(mut self, max_level: LevelFilter) -> Self {
        self.max_level = max_level;
        self
    }

    /// Start the appender and make it the process logger
    pub fn install(self) -> Result<()> {
        self.start()?;
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self))
            .map_err(|e| LoggerError::config(format!("cannot install logger: {}", e)))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl LogAppender for LogFacadeAppender {
    type Event<'a> = Record<'a>;

    fn core(&self) -> &AppenderCore {
        &self.core
    }

    fn to_entry(&self, record: &Self::Event<'_>) -> Result<Entry> {
        let text = record.args().to_string();
        self.core
            .entry(level_of(record.level()), record.target(), &text)
    }
}

impl Log for LogFacadeAppender {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level && !is_internal(metadata.target())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) || !self.core.is_started() {
            return;
        }
        if let Err(e) = self.append(record) {
            report_failure(self.core.name(), &e);
        }
    }

    fn flush(&self) {
        if let Err(e) = self.core.flush() {
            report_failure(self.core.name(), &e);
        }
    }
}
