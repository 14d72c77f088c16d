//! Structured progress reporting for imports.
//!
//! Long imports emit incremental events per phase: file discovery, export
//! parsing, conversation classification and report writing.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during an import.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the operation: "discover", "parse", "classify", "write"
    pub phase: String,

    /// Current progress (files read, conversations classified, ...)
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    /// Human-readable message
    pub message: String,

    /// Elapsed time since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let percentage = total.map(|t| {
            if t > 0 {
                (current as f64 / t as f64) * 100.0
            } else {
                0.0
            }
        });

        Self {
            phase: phase.into(),
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };

        let pct = self
            .percentage
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Arc<Instant>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Arc::new(Instant::now()),
        }
    }

    /// Reporter that drops every event.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        let Some(callback) = &self.callback else {
            return;
        };

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let event = event.with_elapsed(elapsed);

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            percentage = ?event.percentage,
            message = %event.message,
            elapsed_secs = elapsed,
            "Progress event"
        );

        callback(event);
    }

    pub fn discover(&self, current: u64, path: &str) {
        self.emit(ProgressEvent::new(
            "discover",
            current,
            None,
            format!("found {}", path),
        ));
    }

    pub fn parse(&self, current: u64, total: Option<u64>, file: &str) {
        self.emit(ProgressEvent::new(
            "parse",
            current,
            total,
            format!("reading {}", file),
        ));
    }

    pub fn classify(&self, current: u64, total: Option<u64>, conversation: &str) {
        self.emit(ProgressEvent::new(
            "classify",
            current,
            total,
            format!("conversation {}", conversation),
        ));
    }

    pub fn write(&self, target: &str) {
        self.emit(ProgressEvent::new("write", 1, Some(1), format!("writing {}", target)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_event_format() {
        let event = ProgressEvent::new("parse", 5, Some(10), "reading export.json");
        let formatted = event.format_simple();
        assert!(formatted.contains("[parse]"));
        assert!(formatted.contains("5/10"));
        assert!(formatted.contains("50%"));

        let open_ended = ProgressEvent::new("discover", 3, None, "found a.json");
        assert_eq!(open_ended.format_simple(), "[discover] 3 - found a.json");
    }

    #[test]
    fn test_progress_reporter_emit() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        let reporter = ProgressReporter::new(Arc::new(move |event: ProgressEvent| {
            events_clone.lock().unwrap().push(event);
        }));

        reporter.classify(3, Some(10), "conv-1");
        reporter.write("stdout");

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].phase, "classify");
        assert_eq!(captured[0].current, 3);
        assert!(captured[0].elapsed_secs.is_some());
        assert_eq!(captured[1].phase, "write");
    }

    #[test]
    fn test_noop_reporter() {
        let reporter = ProgressReporter::noop();
        reporter.discover(1, "test");
    }
}
