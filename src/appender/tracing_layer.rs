// src/appender/tracing_layer.rs
//! `tracing` binding
//!
//! [`TracingAppender`] is a layer: add it to a `tracing_subscriber` registry
//! and every event becomes an entry. The event target is the logger name, the
//! `message` field is the text, remaining fields are appended as `key=value`,
//! and an `error` field is rendered with its source chain.

use crate::appender::{is_internal, report_failure, AppenderCore, LogAppender};
use crate::codec::CodecRegistry;
use crate::entry::{level, Entry};
use crate::utils::config::AppenderConfig;
use crate::utils::errors::Result;
use std::error::Error;
use std::fmt::{self, Write};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Map a tracing level onto the numeric entry scale
pub fn level_of(value: &Level) -> i32 {
    if *value == Level::ERROR {
        level::ERROR
    } else if *value == Level::WARN {
        level::WARN
    } else if *value == Level::INFO {
        level::INFO
    } else if *value == Level::DEBUG {
        level::DEBUG
    } else {
        level::TRACE
    }
}

/// Collects the fields of one event into text
#[derive(Default)]
struct EventText {
    message: String,
    fields: String,
    error: Option<String>,
}

impl EventText {
    fn render(self) -> String {
        let mut text = self.message;
        if !self.fields.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&self.fields);
        }
        if let Some(error) = self.error {
            text.push('\n');
            text.push_str(&error);
        }
        text
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for EventText {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        let mut rendered = format!("{}: {}", field.name(), value);
        let mut source = value.source();
        while let Some(cause) = source {
            let _ = write!(rendered, "\n  caused by: {}", cause);
            source = cause.source();
        }
        self.error = Some(rendered);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}

/// Layer writing every tracing event as an entry
#[derive(Debug)]
pub struct TracingAppender {
    core: AppenderCore,
}

impl TracingAppender {
    pub fn new(config: AppenderConfig, registry: &CodecRegistry) -> Result<Self> {
        Ok(Self::from_core(AppenderCore::new(config, registry)?))
    }

    pub fn from_core(core: AppenderCore) -> Self {
        Self { core }
    }
}

impl LogAppender for TracingAppender {
    type Event<'a> = Event<'a>;

    fn core(&self) -> &AppenderCore {
        &self.core
    }

    fn to_entry(&self, event: &Self::Event<'_>) -> Result<Entry> {
        let metadata = event.metadata();

        let mut text = EventText::default();
        event.record(&mut text);

        self.core
            .entry(level_of(metadata.level()), metadata.target(), &text.render())
    }
}

impl<S: Subscriber> Layer<S> for TracingAppender {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if is_internal(event.metadata().target()) || !self.core.is_started() {
            return;
        }
        if let Err(e) = self.append(event) {
            report_failure(self.core.name(), &e);
        }
    }
}
