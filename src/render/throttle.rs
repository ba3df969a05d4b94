use std::time::{Duration, Instant};

/// Default minimum time between redraws while a stroke is in progress.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(50);

/// Rate limiter for recompositing during drags. Mutations are never throttled.
#[derive(Debug, Clone)]
pub struct FrameLimiter {
    min_interval: Duration,
    last: Option<Instant>,
}

impl FrameLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// `true` when enough time has passed since the last accepted frame; records `now` if so.
    pub fn should_render(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Let the next frame through regardless of timing, e.g. on button release.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

impl Default for FrameLimiter {
    fn default() -> Self {
        Self::new(REFRESH_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_inside_the_interval_are_skipped() {
        let mut limiter = FrameLimiter::new(Duration::from_millis(50));
        let t0 = Instant::now();
        assert!(limiter.should_render(t0));
        assert!(!limiter.should_render(t0 + Duration::from_millis(20)));
        assert!(limiter.should_render(t0 + Duration::from_millis(60)));
        limiter.reset();
        assert!(limiter.should_render(t0 + Duration::from_millis(61)));
    }
}
