//! `tracing` integration for the log interceptor
//!
//! Install [`CaptureLayer`] on the subscriber the query engine logs through.
//! Events are offered to the interceptor unfiltered, so any level filter
//! belongs on the output layers (per-layer filter), not on the registry.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::context::{self, CORRELATION_FIELD};
use super::LogInterceptor;

/// Correlation key recorded on a span
#[derive(Debug, Clone)]
struct SpanCorrelation(String);

#[derive(Default)]
struct CorrelationVisitor(Option<String>);

impl Visit for CorrelationVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == CORRELATION_FIELD {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == CORRELATION_FIELD {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

#[derive(Default)]
struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

/// Routes `tracing` events into a [`LogInterceptor`]
///
/// The event target stands in for the logger name and the rendered `message`
/// field for the template. A `correlation_id` on any enclosing span wins over
/// the thread's ambient key.
#[derive(Debug, Clone)]
pub struct CaptureLayer {
    interceptor: Arc<LogInterceptor>,
}

impl CaptureLayer {
    pub fn new(interceptor: Arc<LogInterceptor>) -> Self {
        Self { interceptor }
    }

    pub fn interceptor(&self) -> &Arc<LogInterceptor> {
        &self.interceptor
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = CorrelationVisitor::default();
        attrs.record(&mut visitor);
        if let (Some(key), Some(span)) = (visitor.0, ctx.span(id)) {
            span.extensions_mut().insert(SpanCorrelation(key));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target() != self.interceptor.target_logger() {
            return;
        }

        let span_key = ctx.event_scope(event).and_then(|scope| {
            scope.into_iter().find_map(|span| {
                let extensions = span.extensions();
                let key = extensions.get::<SpanCorrelation>().map(|c| c.0.clone());
                key
            })
        });
        let key = span_key.or_else(context::current);

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.interceptor.decide_for(
            key.as_deref(),
            metadata.target(),
            *metadata.level(),
            visitor.0.as_deref(),
            &[],
            None,
        );
    }
}
