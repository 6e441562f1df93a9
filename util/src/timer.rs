use std::time::{Duration, Instant};

/// Utility for keeping track of the time it took to run a job.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Create a new `Timer`, started now.
    pub fn now() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Restart the timer.
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }

    /// Time since the timer was last reset.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Print a message with the elapsed time since the timer was last reset.
    pub fn print_elapsed(&self, label: &str) {
        eprintln!("{} took {:?}", label, self.elapsed());
    }
}

#[cfg(test)]
mod test {
    use super::Timer;
    #[test]
    fn test_reset_restarts_clock() {
        let mut timer = Timer::now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let before = timer.elapsed();
        timer.reset();
        assert!(timer.elapsed() < before);
    }
}
