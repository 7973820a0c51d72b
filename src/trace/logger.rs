use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::trace::trace::TraceEvent;

/// Operations that end a grounding cycle. The buffer is flushed after each
/// of them so the file always ends on a complete cycle.
const CYCLE_ENDS: [&str; 4] = ["snapshot", "contentful_snapshot", "annotate", "wait_stable"];

/// JSONL trace of one grounding session. Hands out step numbers and buffers
/// lines until the current cycle ends.
pub struct TraceLogger {
    sink: Option<Mutex<BufWriter<File>>>,
    step: AtomicU64,
}

impl TraceLogger {
    /// Opens `path` for appending. On failure the logger still counts steps
    /// but writes nothing.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let sink = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(Mutex::new(BufWriter::new(file))),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open trace file, tracing disabled");
                None
            }
        };
        Self {
            sink,
            step: AtomicU64::new(0),
        }
    }

    /// New event stamped with the next step number.
    pub fn event(&self, operation: &str) -> TraceEvent {
        TraceEvent::now(self.step.fetch_add(1, Ordering::Relaxed), operation)
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        let Ok(mut out) = sink.lock() else {
            warn!("trace logger lock poisoned");
            return;
        };

        let written = serde_json::to_writer(&mut *out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| out.write_all(b"\n"));
        if let Err(e) = written {
            warn!(operation = %event.operation, error = %e, "failed to write trace event");
            return;
        }

        if CYCLE_ENDS.contains(&event.operation.as_str()) {
            if let Err(e) = out.flush() {
                warn!(error = %e, "failed to flush trace file");
            }
        }
    }
}
