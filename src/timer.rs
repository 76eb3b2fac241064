//! Cancellable repeating tasks driven by the host loop's clock.

use std::time::{Duration, Instant};

/// A repeating task: armed with a first deadline, fires every `interval`,
/// cancelled by clearing the deadline.
#[derive(Debug, Clone)]
pub struct Repeating {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Repeating {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Schedule the first firing one interval after `now`.
    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Consume one firing if it is due at `now`. Call in a loop to catch up.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                self.next_due = Some(due + self.interval);
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
    fn test_unarmed_never_fires() {
        let mut task = Repeating::new(Duration::from_millis(10));
        assert!(!task.fire_due(Instant::now() + Duration::from_secs(5)));
    }

    #[test]
    fn test_catches_up_missed_firings() {
        let start = Instant::now();
        let mut task = Repeating::new(Duration::from_millis(10));
        task.arm(start);
        let later = start + Duration::from_millis(35);
        let mut fired = 0;
        while task.fire_due(later) {
            fired += 1;
        }
        assert_eq!(fired, 3);
    }

    #[test]
    fn test_cancel_stops_firing() {
        let start = Instant::now();
        let mut task = Repeating::new(Duration::from_millis(10));
        task.arm(start);
        task.cancel();
        assert!(!task.is_armed());
        assert!(!task.fire_due(start + Duration::from_secs(1)));
    }
}
