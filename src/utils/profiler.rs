use std::time::{Duration, Instant};

/// Scopes slower than this are logged at debug level instead of trace.
const SLOW_SCOPE: Duration = Duration::from_millis(16);

/// Logs how long a scope took when dropped.
pub struct ScopeTimer {
    name: &'static str,
    start: Instant,
}

impl ScopeTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopeTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        if elapsed >= SLOW_SCOPE {
            log::debug!(target: "profiler", "{} took {:?}", self.name, elapsed);
        } else {
            log::trace!(target: "profiler", "{} took {:?}", self.name, elapsed);
        }
    }
}
