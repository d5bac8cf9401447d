use std::time::{Duration, Instant};

/// Scoped timer that logs how long it lived.
///
/// ```ignore
/// let _guard = LogDuration::new("match_document");
/// // ... timed work ...
/// ```
#[derive(Debug)]
pub struct LogDuration {
    label: String,
    start: Instant,
}

impl LogDuration {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), start: Instant::now() }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for LogDuration {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        tracing::info!(
            label = %self.label,
            elapsed_ms = elapsed.as_millis() as u64,
            elapsed_s = elapsed.as_secs_f64(),
            "duration"
        );
    }
}

/// Times the rest of the enclosing scope.
#[macro_export]
macro_rules! log_duration {
    ($label:expr) => {
        let _log_duration_guard = $crate::duration::LogDuration::new($label);
    };
}
