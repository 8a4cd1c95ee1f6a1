//! Deferred halt timer

use std::time::{Duration, Instant};

/// Delay between a terminal completion and halting both decks
pub const GRACE_DELAY: Duration = Duration::from_millis(200);

/// Single-shot deadline; re-arming replaces the pending one
#[derive(Debug, Clone, Copy, Default)]
pub struct GraceTimer {
    deadline: Option<Instant>,
}

impl GraceTimer {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm for `now + GRACE_DELAY`, cancelling any pending deadline
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + GRACE_DELAY);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once, when the deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_delay() {
        let start = Instant::now();
        let mut timer = GraceTimer::new();
        timer.schedule(start);

        assert!(!timer.poll(start + Duration::from_millis(199)));
        assert!(timer.poll(start + GRACE_DELAY));
        assert!(!timer.poll(start + Duration::from_secs(1)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn rescheduling_replaces_deadline() {
        let start = Instant::now();
        let mut timer = GraceTimer::new();
        timer.schedule(start);
        timer.schedule(start + Duration::from_millis(150));

        assert!(!timer.poll(start + Duration::from_millis(250)));
        assert!(timer.poll(start + Duration::from_millis(350)));
    }

    #[test]
    fn cancel_disarms() {
        let start = Instant::now();
        let mut timer = GraceTimer::new();
        timer.schedule(start);
        timer.cancel();
        assert!(!timer.poll(start + Duration::from_secs(1)));
    }
}
