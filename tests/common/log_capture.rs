//! In-memory capture of tracing events for assertions.
#![allow(dead_code)]

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Clone)]
pub struct CapturedLog {
    pub level: tracing::Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

/// Captures events on the current thread until dropped.
pub struct TestLogCapture {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestLogCapture {
    pub fn start() -> Self {
        let logs = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(CaptureLayer {
            logs: Arc::clone(&logs),
        });
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            logs,
            _guard: guard,
        }
    }

    pub fn logs(&self) -> Vec<CapturedLog> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn assert_logged_at_level(&self, level: tracing::Level, needle: &str) {
        let logs = self.logs();
        assert!(
            logs.iter()
                .any(|l| l.level == level && l.message.contains(needle)),
            "Expected {level} log containing '{needle}'. Logged: {:#?}",
            logs.iter().map(|l| &l.message).collect::<Vec<_>>()
        );
    }

    pub fn assert_field_logged(&self, name: &str, value: &str) {
        let logs = self.logs();
        assert!(
            logs.iter()
                .any(|l| l.fields.iter().any(|(k, v)| k == name && v.contains(value))),
            "Expected field {name}={value}. Logged fields: {:#?}",
            logs.iter().map(|l| &l.fields).collect::<Vec<_>>()
        );
    }

    pub fn count_at_level(&self, level: tracing::Level, needle: &str) -> usize {
        self.logs()
            .iter()
            .filter(|l| l.level == level && l.message.contains(needle))
            .count()
    }
}

struct CaptureLayer {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedLog {
                level: *event.metadata().level(),
                target: event.metadata().target().to_string(),
                message: visitor.message,
                fields: visitor.fields,
            });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }
}
