use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

const MAX_LINES: usize = 3000;

// -----------------------------
// Logging
// -----------------------------
#[derive(Default, Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<Vec<String>>>,
}

impl LogBuffer {
    pub fn push(&self, s: impl Into<String>) {
        let mut g = self.inner.lock();
        g.push(s.into());
        let len = g.len();
        if len > MAX_LINES {
            g.drain(0..(len - MAX_LINES));
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mirrors tracing events into a [`LogBuffer`] for the in-app Logs tab.
pub struct LogBufferLayer {
    buf: LogBuffer,
}

impl LogBufferLayer {
    pub fn new(buf: LogBuffer) -> Self {
        Self { buf }
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for LogBufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut v = LineVisitor::default();
        event.record(&mut v);
        let meta = event.metadata();
        self.buf.push(format!(
            "{} {:>5} {}{}",
            Local::now().format("%H:%M:%S%.3f"),
            meta.level(),
            v.message,
            v.fields
        ));
    }
}
