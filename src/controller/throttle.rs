//! Leading-edge throttle with one trailing run

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_run: Option<Instant>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: false,
        }
    }

    /// Whether work may run now. When throttled, a trailing run is queued
    /// for `deadline()`.
    pub fn attempt(&mut self, now: Instant) -> bool {
        match self.last_run {
            Some(last) if now < last + self.interval => {
                self.pending = true;
                false
            }
            _ => {
                self.last_run = Some(now);
                self.pending = false;
                true
            }
        }
    }

    /// When the queued trailing run is due
    pub fn deadline(&self) -> Option<Instant> {
        if self.pending {
            self.last_run.map(|last| last + self.interval)
        } else {
            None
        }
    }

    /// Consume the trailing run if it is due
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(due) if now >= due => {
                self.pending = false;
                self.last_run = Some(now);
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.last_run = None;
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_runs() {
        let mut throttle = Throttle::new(Duration::from_millis(500));
        assert!(throttle.attempt(Instant::now()));
        assert!(throttle.deadline().is_none());
    }

    #[test]
    fn burst_collapses_into_one_trailing_run() {
        let mut throttle = Throttle::new(Duration::from_millis(500));
        let start = Instant::now();

        assert!(throttle.attempt(start));
        assert!(!throttle.attempt(start + Duration::from_millis(100)));
        assert!(!throttle.attempt(start + Duration::from_millis(200)));

        let due = throttle.deadline().unwrap();
        assert_eq!(due, start + Duration::from_millis(500));
        assert!(!throttle.fire(start + Duration::from_millis(499)));
        assert!(throttle.fire(due));
        assert!(throttle.deadline().is_none());
    }

    #[test]
    fn runs_again_after_interval() {
        let mut throttle = Throttle::new(Duration::from_millis(500));
        let start = Instant::now();
        assert!(throttle.attempt(start));
        assert!(throttle.attempt(start + Duration::from_millis(500)));
    }
}
