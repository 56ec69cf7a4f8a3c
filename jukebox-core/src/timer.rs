use std::time::{Duration, Instant};

/// A repeating timer fired from the host's tick loop
#[derive(Debug, Clone)]
pub struct RepeatingTimer<T> {
    period: Duration,
    next_due: Instant,
    payload: T,
}

impl<T: Copy> RepeatingTimer<T> {
    /// First tick is due one period after `now`
    pub fn start(period: Duration, payload: T, now: Instant) -> Self {
        Self {
            period,
            next_due: now + period,
            payload,
        }
    }

    /// Returns the payload if the timer is due, at most once per call.
    ///
    /// A tick that is late by more than one period does not produce a burst of
    /// catch-up ticks; the schedule restarts from `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if now < self.next_due {
            return None;
        }
        self.next_due += self.period;
        if self.next_due <= now {
            self.next_due = now + self.period;
        }
        Some(self.payload)
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn payload(&self) -> T {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_period() {
        let start = Instant::now();
        let period = Duration::from_millis(100);
        let mut timer = RepeatingTimer::start(period, 1, start);

        assert_eq!(timer.poll(start + Duration::from_millis(50)), None);
        assert_eq!(timer.poll(start + period), Some(1));
        assert_eq!(timer.poll(start + period), None);
        assert_eq!(timer.poll(start + period * 2), Some(1));
    }

    #[test]
    fn late_poll_does_not_burst() {
        let start = Instant::now();
        let period = Duration::from_millis(100);
        let mut timer = RepeatingTimer::start(period, (), start);
        let late = start + Duration::from_millis(1000);

        assert_eq!(timer.poll(late), Some(()));
        assert_eq!(timer.poll(late), None);
        assert_eq!(timer.next_due(), late + period);
    }
}
