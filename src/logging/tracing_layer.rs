//! `tracing` integration
//!
//! Routes events from the host application's `tracing` macros through a
//! [`Logger`], so both APIs share one file, one rotation schedule and one
//! buffer.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::emitter::Logger;
use super::record::Location;
use super::{Level, INTERNAL_TARGET};

/// A `tracing_subscriber` layer writing events through a [`Logger`]
pub struct RotologLayer {
    logger: Arc<Logger>,
}

impl RotologLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl<S: Subscriber> Layer<S> for RotologLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target() == INTERNAL_TARGET {
            return;
        }

        let level = Level::from(*metadata.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let location = Location::new(
            metadata.file().unwrap_or("<unknown>"),
            metadata.module_path().unwrap_or_else(|| metadata.target()),
            metadata.line().unwrap_or(0),
        );
        let _ = self
            .logger
            .log(level, location, format_args!("{}", visitor.finish()));
    }
}

/// Collects the `message` field plus `key=value` pairs for the rest
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(mut self) -> String {
        self.message.push_str(&self.fields);
        self.message
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Install `logger` as the global `tracing` subscriber
///
/// `RUST_LOG` narrows which callsites are enabled; the logger's own threshold
/// still applies on top.
pub fn install_tracing(logger: Arc<Logger>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(RotologLayer::new(logger))
        .try_init()
        .context("Failed to install tracing subscriber")
}
